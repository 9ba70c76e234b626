use futures::future::join_all;
use lib_email_clients::gmail::message::{MessageRef, RawMessage};
use serde::{Deserialize, Serialize};

use crate::auth::Credential;

use super::client::{MailboxGateway, MessageFormat};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: String,
    pub thread_id: String,
    pub message_id: String,
    pub subject: String,
    pub from_address: String,
    pub date: String,
    pub snippet: String,
    pub labels: Vec<String>,
}

impl EmailSummary {
    pub fn from_metadata(msg: RawMessage) -> Self {
        let subject = msg.header("Subject").unwrap_or("No Subject").to_string();
        let from_address = msg.header("From").unwrap_or("Unknown Sender").to_string();
        let date = msg.header("Date").unwrap_or("No Date").to_string();
        let id = msg.id.unwrap_or_default();

        EmailSummary {
            message_id: id.clone(),
            id,
            thread_id: msg.thread_id.unwrap_or_default(),
            subject,
            from_address,
            date,
            snippet: msg.snippet.unwrap_or_default(),
            labels: msg.label_ids.unwrap_or_default(),
        }
    }
}

/// Fetch metadata for each listed message. A message that fails to load is
/// logged and left out rather than failing the page.
pub async fn fetch_summaries(
    gateway: &dyn MailboxGateway,
    credential: &Credential,
    refs: &[MessageRef],
) -> Vec<EmailSummary> {
    let results = join_all(
        refs.iter()
            .map(|r| gateway.get_message(credential, &r.id, MessageFormat::Metadata)),
    )
    .await;

    let summaries: Vec<EmailSummary> = refs
        .iter()
        .zip(results)
        .filter_map(|(r, result)| match result {
            Ok(msg) => Some(EmailSummary::from_metadata(msg)),
            Err(e) => {
                tracing::error!("Error processing message {}: {}", r.id, e);
                None
            }
        })
        .collect();

    tracing::debug!("Successfully processed {} of {} emails", summaries.len(), refs.len());
    summaries
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{email::client::GatewayError, testing::common::StubMailbox};

    fn metadata_fixture() -> RawMessage {
        let root = env!("CARGO_MANIFEST_DIR");
        let path = format!("{root}/src/testing/data/metadata_message.json");
        let json = fs::read_to_string(path).expect("Unable to read file");
        serde_json::from_str(&json).expect("Unable to parse json")
    }

    #[test]
    fn test_from_metadata() {
        let summary = EmailSummary::from_metadata(metadata_fixture());
        assert_eq!(summary.id, "18f3c2a9d1e0b7aa");
        assert_eq!(summary.message_id, summary.id);
        assert_eq!(summary.subject, "Q3 budget review");
        assert_eq!(summary.from_address, "Dana <dana@example.com>");
        assert_eq!(summary.date, "Thu, 13 Jun 2024 10:30:47 -0700");
        assert_eq!(summary.labels, vec!["INBOX", "IMPORTANT"]);
    }

    #[test]
    fn test_from_metadata_defaults() {
        let summary = EmailSummary::from_metadata(RawMessage::default());
        assert_eq!(summary.subject, "No Subject");
        assert_eq!(summary.from_address, "Unknown Sender");
        assert_eq!(summary.date, "No Date");
        assert!(summary.labels.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_summaries_skips_failures() {
        let mailbox = StubMailbox::default()
            .with_message("ok-1", metadata_fixture())
            .with_failure("broken", GatewayError::NotFound("broken".to_string()))
            .with_message("ok-2", RawMessage::default());

        let refs: Vec<MessageRef> = ["ok-1", "broken", "ok-2"]
            .into_iter()
            .map(|id| MessageRef {
                id: id.to_string(),
                thread_id: None,
            })
            .collect();

        let summaries =
            fetch_summaries(&mailbox, &Credential::from_access_token("t"), &refs).await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].subject, "Q3 budget review");
        assert_eq!(summaries[1].subject, "No Subject");
        assert_eq!(mailbox.get_calls(), 3);
    }
}
