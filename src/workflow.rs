//! The fetch and auto-respond workflow. Lists messages received since
//! process start, persists unseen ones and replies to their senders,
//! skipping anything already marked processed.

use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

use crate::google::gmail::{Mailbox, extract_body, header_value};
use crate::responder::send_auto_reply;
use crate::store::{EmailRecord, has_processed, mark_processed, save_record};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub fetched: u64,
    pub responded: u64,
}

/// Run one pass over the mailbox. Listing, fetching and storage
/// errors abort the run and propagate. A failed auto-response send is
/// logged and leaves the message unmarked so a later poll retries it;
/// the message still counts as fetched since its record was saved.
pub async fn fetch_and_respond(
    mailbox: &impl Mailbox,
    db: &Connection,
    account: &str,
    started_at: DateTime<Utc>,
) -> Result<FetchOutcome, anyhow::Error> {
    let mut outcome = FetchOutcome::default();

    let listed = mailbox.list_since(started_at.date_naive()).await?;
    if listed.is_empty() {
        tracing::info!("No new emails found");
        return Ok(outcome);
    }

    for message_ref in listed {
        let message = mailbox.get_message(&message_ref.id).await?;

        if has_processed(db, &message.id).await? {
            tracing::debug!("Skipping already processed message: {}", message.id);
            continue;
        }

        let subject = header_value(&message.payload, "Subject")
            .unwrap_or_default()
            .to_string();
        let sender = header_value(&message.payload, "From")
            .unwrap_or_default()
            .to_string();
        let received_time = header_value(&message.payload, "Date")
            .unwrap_or_default()
            .to_string();
        let body = extract_body(&message.payload);

        save_record(
            db,
            EmailRecord {
                message_id: message.id.clone(),
                subject: subject.clone(),
                sender: sender.clone(),
                body,
                received_time,
            },
        )
        .await?;
        outcome.fetched += 1;
        tracing::info!("Fetched email: {}", subject);

        match send_auto_reply(mailbox, account, &sender, &subject).await {
            Ok(()) => {
                mark_processed(db, &message.id).await?;
                outcome.responded += 1;
                tracing::info!("Sent auto-response to: {}", sender);
            }
            Err(err) => {
                tracing::error!("An error occurred while sending auto-response: {}", err);
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE};
    use chrono::NaiveDate;

    use super::*;
    use crate::core::db::initialize_db;
    use crate::google::gmail::{
        Message, MessageHeader, MessagePart, MessagePartBody, MessagePayload, MessageRef,
    };
    use crate::store::count_records;

    struct StubMailbox {
        messages: Vec<Message>,
        fail_sends: bool,
        sent: Mutex<Vec<String>>,
    }

    impl StubMailbox {
        fn new(messages: Vec<Message>) -> Self {
            Self {
                messages,
                fail_sends: false,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent_subjects(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|raw| {
                    let decoded = String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap();
                    decoded
                        .lines()
                        .find_map(|line| line.strip_prefix("Subject: "))
                        .unwrap()
                        .to_string()
                })
                .collect()
        }
    }

    #[async_trait]
    impl Mailbox for StubMailbox {
        async fn list_since(&self, _after: NaiveDate) -> Result<Vec<MessageRef>, anyhow::Error> {
            Ok(self
                .messages
                .iter()
                .map(|m| MessageRef {
                    id: m.id.clone(),
                    thread_id: m.thread_id.clone(),
                })
                .collect())
        }

        async fn get_message(&self, id: &str) -> Result<Message, anyhow::Error> {
            self.messages
                .iter()
                .find(|m| m.id == id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("No such message: {}", id))
        }

        async fn send_raw(&self, raw: &str) -> Result<(), anyhow::Error> {
            if self.fail_sends {
                anyhow::bail!("SMTP relay rejected the message");
            }
            self.sent.lock().unwrap().push(raw.to_string());
            Ok(())
        }
    }

    async fn test_db() -> Connection {
        let db = Connection::open_in_memory().await.unwrap();
        db.call(|conn| {
            initialize_db(conn).expect("Failed to create schema");
            Ok(())
        })
        .await
        .unwrap();
        db
    }

    fn test_message(id: &str, sender: &str, subject: &str, body: &str) -> Message {
        Message {
            id: id.to_string(),
            thread_id: Some(format!("thr_{}", id)),
            payload: MessagePayload {
                mimetype: "multipart/mixed".to_string(),
                headers: Some(vec![
                    MessageHeader {
                        name: "Subject".to_string(),
                        value: subject.to_string(),
                    },
                    MessageHeader {
                        name: "From".to_string(),
                        value: sender.to_string(),
                    },
                    MessageHeader {
                        name: "Date".to_string(),
                        value: "Sun, 30 Aug 2026 10:00:00 +0000".to_string(),
                    },
                ]),
                body: None,
                parts: Some(vec![MessagePart {
                    mimetype: "text/plain".to_string(),
                    body: Some(MessagePartBody {
                        data: Some(URL_SAFE.encode(body)),
                    }),
                    parts: None,
                }]),
            },
        }
    }

    #[tokio::test]
    async fn test_empty_mailbox_makes_no_store_calls() {
        let db = test_db().await;
        let mailbox = StubMailbox::new(vec![]);

        let outcome = fetch_and_respond(&mailbox, &db, "me@example.com", Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::default());
        assert_eq!(count_records(&db, "emails").await.unwrap(), 0);
        assert_eq!(count_records(&db, "processed_emails").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_two_unprocessed_messages() {
        let db = test_db().await;
        let mailbox = StubMailbox::new(vec![
            test_message("msg_001", "a@example.com", "Leave Monday", "Dentist"),
            test_message("msg_002", "b@example.com", "Leave Friday", "Travel"),
        ]);

        let outcome = fetch_and_respond(&mailbox, &db, "me@example.com", Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.fetched, 2);
        assert_eq!(outcome.responded, 2);
        assert_eq!(count_records(&db, "emails").await.unwrap(), 2);
        assert_eq!(count_records(&db, "processed_emails").await.unwrap(), 2);
        assert_eq!(
            mailbox.sent_subjects(),
            vec!["Re: Leave Monday", "Re: Leave Friday"]
        );
    }

    #[tokio::test]
    async fn test_processed_message_is_skipped_entirely() {
        let db = test_db().await;
        mark_processed(&db, "msg_001").await.unwrap();
        let mailbox = StubMailbox::new(vec![test_message(
            "msg_001",
            "a@example.com",
            "Leave Monday",
            "Dentist",
        )]);

        let outcome = fetch_and_respond(&mailbox, &db, "me@example.com", Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::default());
        assert_eq!(count_records(&db, "emails").await.unwrap(), 0);
        assert!(mailbox.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_leaves_message_unmarked() {
        let db = test_db().await;
        let mut mailbox = StubMailbox::new(vec![test_message(
            "msg_001",
            "a@example.com",
            "Leave Monday",
            "Dentist",
        )]);
        mailbox.fail_sends = true;

        let outcome = fetch_and_respond(&mailbox, &db, "me@example.com", Utc::now())
            .await
            .unwrap();

        // The record is saved but the message stays eligible for a
        // retry on the next poll
        assert_eq!(outcome.fetched, 1);
        assert_eq!(outcome.responded, 0);
        assert_eq!(count_records(&db, "emails").await.unwrap(), 1);
        assert!(!has_processed(&db, "msg_001").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_headers_default_to_empty() {
        let db = test_db().await;
        let mut message = test_message("msg_001", "a@example.com", "ignored", "Dentist");
        message.payload.headers = None;
        let mailbox = StubMailbox::new(vec![message]);

        let outcome = fetch_and_respond(&mailbox, &db, "me@example.com", Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.fetched, 1);
        assert_eq!(outcome.responded, 1);
        assert_eq!(mailbox.sent_subjects(), vec!["Re: "]);
    }
}
