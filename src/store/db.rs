use anyhow::{Error, Result};
use tokio_rusqlite::Connection;

use super::models::EmailRecord;

/// True iff a processed marker exists for the message id.
pub async fn has_processed(db: &Connection, message_id: &str) -> Result<bool, Error> {
    let message_id = message_id.to_string();
    let count: i64 = db
        .call(move |conn| {
            let count = conn
                .prepare("SELECT COUNT(*) FROM processed_emails WHERE message_id = ?1")
                .and_then(|mut stmt| stmt.query_row([&message_id], |row| row.get(0)))?;
            Ok(count)
        })
        .await?;
    Ok(count > 0)
}

/// Record that an auto-response went out for the message id.
pub async fn mark_processed(db: &Connection, message_id: &str) -> Result<(), Error> {
    let message_id = message_id.to_string();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO processed_emails (message_id) VALUES (?1)",
            [&message_id],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn save_record(db: &Connection, record: EmailRecord) -> Result<(), Error> {
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO emails (message_id, subject, sender, body, received_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &record.message_id,
                &record.subject,
                &record.sender,
                &record.body,
                &record.received_time,
            ),
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// Row count for a table, used by tests to assert on store activity.
#[cfg(test)]
pub async fn count_records(db: &Connection, table: &str) -> Result<i64, Error> {
    let query = match table {
        "emails" => "SELECT COUNT(*) FROM emails",
        "processed_emails" => "SELECT COUNT(*) FROM processed_emails",
        _ => anyhow::bail!("Unknown table: {}", table),
    };
    let count = db
        .call(move |conn| {
            let count = conn
                .prepare(query)
                .and_then(|mut stmt| stmt.query_row([], |row| row.get(0)))?;
            Ok(count)
        })
        .await?;
    Ok(count)
}
