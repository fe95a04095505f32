//! Canned auto-response sent back to every new leave request.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};

use crate::google::gmail::Mailbox;

pub const AUTO_REPLY_BODY: &str =
    "I will approve your leave with the given reason in the mail. This is an auto-response.";

/// Assemble the reply as a base64url encoded RFC 2822 message ready
/// for the Gmail send endpoint.
pub fn build_reply(from: &str, recipient: &str, original_subject: &str) -> String {
    let message = format!(
        "From: {}\r\nTo: {}\r\nSubject: Re: {}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
        from, recipient, original_subject, AUTO_REPLY_BODY
    );
    URL_SAFE.encode(message.as_bytes())
}

pub async fn send_auto_reply(
    mailbox: &impl Mailbox,
    from: &str,
    recipient: &str,
    original_subject: &str,
) -> Result<(), anyhow::Error> {
    mailbox
        .send_raw(&build_reply(from, recipient, original_subject))
        .await
}
