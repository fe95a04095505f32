use tokio_rusqlite::Connection;

/// Open the SQLite database used for fetched emails and processed
/// markers.
pub async fn async_db(db_path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    Connection::open(db_path).await
}

/// Create the schema if it doesn't already exist. There is
/// intentionally no unique index on `message_id`, inserts are gated
/// by the processed marker check in the workflow.
pub fn initialize_db(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS emails (
             message_id TEXT NOT NULL,
             subject TEXT NOT NULL,
             sender TEXT NOT NULL,
             body TEXT NOT NULL,
             received_time TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS processed_emails (
             message_id TEXT NOT NULL
         );",
    )
}
