use std::sync::Arc;

use async_trait::async_trait;
use derive_more::derive::Display;
use lib_email_clients::gmail::{
    api_error::GmailApiError,
    message::{ListMessagesResponse, MessageRef, RawMessage},
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::{auth::Credential, HttpClient};

const GMAIL_ENDPOINT: &str = "https://www.googleapis.com/gmail/v1/users/me";

macro_rules! gmail_url {
    ($base:expr, $($params:expr),*) => {
        {
            let list_params: Vec<&str> = vec![$($params),*];
            let path = list_params.join("/");
            format!("{}/{}", $base, path)
        }
    };
}

/// Headers requested for metadata-only fetches
const METADATA_HEADERS: [&str; 3] = ["Subject", "From", "Date"];

/// Format parameter for Gmail API message requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageFormat {
    /// Returns the full email message data with body content parsed
    #[default]
    Full,
    /// Returns only email message IDs and labels
    Minimal,
    /// Returns email metadata (headers) without body
    Metadata,
    /// Returns the full email message in RFC 2822 format as a base64url encoded string
    Raw,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Full => "full",
            MessageFormat::Minimal => "minimal",
            MessageFormat::Metadata => "metadata",
            MessageFormat::Raw => "raw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GatewayError {
    #[display("message {_0} not found")]
    NotFound(String),
    #[display("mailbox request failed ({status:?}): {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        tracing::error!("Mailbox transport error: {:?}", error);
        GatewayError::Transport {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Access to a user's mailbox.
#[async_trait]
pub trait MailboxGateway: Send + Sync {
    async fn list_messages(
        &self,
        credential: &Credential,
        max_results: u32,
    ) -> GatewayResult<Vec<MessageRef>>;

    async fn get_message(
        &self,
        credential: &Credential,
        message_id: &str,
        format: MessageFormat,
    ) -> GatewayResult<RawMessage>;

    async fn trash(&self, credential: &Credential, message_id: &str) -> GatewayResult<()>;
}

pub type MailboxGatewayHandle = Arc<dyn MailboxGateway>;

/// Gmail REST implementation. Holds no per-user state, the credential
/// travels with every call.
#[derive(Debug, Clone)]
pub struct GmailGateway {
    http_client: HttpClient,
    base_url: String,
}

impl GmailGateway {
    pub fn new(http_client: HttpClient) -> Self {
        Self::with_base_url(http_client, GMAIL_ENDPOINT)
    }

    pub fn with_base_url(http_client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }
}

async fn check_status(
    resp: reqwest::Response,
    message_id: Option<&str>,
) -> GatewayResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if let (StatusCode::NOT_FOUND, Some(id)) = (status, message_id) {
        return Err(GatewayError::NotFound(id.to_string()));
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::error!("Gmail API error {}: {}", status, body);
    Err(GatewayError::Transport {
        status: Some(status.as_u16()),
        message: GmailApiError::message_from_body(&body),
    })
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> GatewayResult<T> {
    let status = resp.status();
    resp.json::<T>()
        .await
        .map_err(|e| GatewayError::Transport {
            status: Some(status.as_u16()),
            message: format!("Unexpected Gmail response body: {}", e),
        })
}

#[async_trait]
impl MailboxGateway for GmailGateway {
    async fn list_messages(
        &self,
        credential: &Credential,
        max_results: u32,
    ) -> GatewayResult<Vec<MessageRef>> {
        let resp = self
            .http_client
            .get(gmail_url!(self.base_url, "messages"))
            .query(&[
                ("maxResults", max_results.to_string()),
                ("includeSpamTrash", "false".to_string()),
            ])
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        let data: ListMessagesResponse = read_json(check_status(resp, None).await?).await?;
        let messages = data.messages.unwrap_or_default();
        if messages.is_empty() {
            tracing::warn!("No messages found in inbox");
        }

        Ok(messages)
    }

    async fn get_message(
        &self,
        credential: &Credential,
        message_id: &str,
        format: MessageFormat,
    ) -> GatewayResult<RawMessage> {
        let mut query = vec![("format", format.as_str())];
        if format == MessageFormat::Metadata {
            query.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", *h)));
        }

        let resp = self
            .http_client
            .get(gmail_url!(self.base_url, "messages", message_id))
            .query(&query)
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        read_json(check_status(resp, Some(message_id)).await?).await
    }

    async fn trash(&self, credential: &Credential, message_id: &str) -> GatewayResult<()> {
        let resp = self
            .http_client
            .post(gmail_url!(self.base_url, "messages", message_id, "trash"))
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        check_status(resp, Some(message_id)).await?;
        tracing::debug!("Moved message {} to trash", message_id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    use super::*;
    use crate::testing::common::serve_stub;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .is_some_and(|v| v == "Bearer ya29.token")
    }

    async fn stub_gateway() -> GmailGateway {
        let router = Router::new()
            .route(
                "/messages",
                get(
                    |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                        if !authorized(&headers) {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        assert_eq!(q.get("includeSpamTrash").map(String::as_str), Some("false"));
                        Json(json!({
                            "messages": [
                                {"id": "m1", "threadId": "t1"},
                                {"id": "m2", "threadId": "t2"}
                            ],
                            "resultSizeEstimate": 2
                        }))
                        .into_response()
                    },
                ),
            )
            .route(
                "/messages/:id",
                get(|Path(id): Path<String>| async move {
                    if id == "missing" {
                        return (
                            StatusCode::NOT_FOUND,
                            Json(json!({"error": {"code": 404, "message": "Requested entity was not found."}})),
                        )
                            .into_response();
                    }
                    Json(json!({
                        "id": id,
                        "threadId": "t1",
                        "payload": {
                            "mimeType": "text/plain",
                            "headers": [{"name": "Subject", "value": "Hi"}],
                            "body": {"size": 5, "data": "aGVsbG8"}
                        }
                    }))
                    .into_response()
                }),
            )
            .route(
                "/messages/:id/trash",
                post(|Path(id): Path<String>| async move {
                    if id == "broken" {
                        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
                    }
                    Json(json!({"id": id, "labelIds": ["TRASH"]})).into_response()
                }),
            );

        let base_url = serve_stub(router).await;
        GmailGateway::with_base_url(HttpClient::new(), base_url)
    }

    #[tokio::test]
    async fn test_list_messages() {
        let gateway = stub_gateway().await;
        let refs = gateway
            .list_messages(&Credential::from_access_token("ya29.token"), 10)
            .await
            .unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, "m1");
    }

    #[tokio::test]
    async fn test_list_messages_unauthorized() {
        let gateway = stub_gateway().await;
        let err = gateway
            .list_messages(&Credential::from_access_token("stale"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport { status: Some(401), .. }));
    }

    #[tokio::test]
    async fn test_get_message() {
        let gateway = stub_gateway().await;
        let msg = gateway
            .get_message(
                &Credential::from_access_token("ya29.token"),
                "abc",
                MessageFormat::Full,
            )
            .await
            .unwrap();
        assert_eq!(msg.id.as_deref(), Some("abc"));
        assert_eq!(msg.header("Subject"), Some("Hi"));
    }

    #[tokio::test]
    async fn test_get_message_not_found() {
        let gateway = stub_gateway().await;
        let err = gateway
            .get_message(
                &Credential::from_access_token("ya29.token"),
                "missing",
                MessageFormat::Full,
            )
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_trash() {
        let gateway = stub_gateway().await;
        let credential = Credential::from_access_token("ya29.token");
        gateway.trash(&credential, "m1").await.unwrap();

        let err = gateway.trash(&credential, "broken").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Transport {
                status: Some(500),
                message: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let gateway = GmailGateway::with_base_url(HttpClient::new(), "http://127.0.0.1:1");
        let err = gateway
            .trash(&Credential::from_access_token("ya29.token"), "m1")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport { status: None, .. }));
    }

    #[test]
    fn test_message_format_as_str() {
        assert_eq!(MessageFormat::default().as_str(), "full");
        assert_eq!(MessageFormat::Metadata.as_str(), "metadata");
    }
}
