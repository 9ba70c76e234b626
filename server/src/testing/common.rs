use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use lib_email_clients::gmail::message::{
    MessagePart, MessagePartBody, MessagePartHeader, MessageRef, RawMessage,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::net::TcpListener;

use crate::{
    auth::{AuthError, Credential, CredentialProvider},
    email::client::{GatewayError, GatewayResult, MailboxGateway, MessageFormat},
    model::usage::UsageCtrl,
    prompt::{CompletionProvider, ProviderError},
    server_config::GmailConfig,
};

/// Serve `router` on an ephemeral local port and return its base url.
pub async fn serve_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Stub server has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

pub fn test_gmail_config(base_url: &str) -> GmailConfig {
    GmailConfig {
        client_id: "client-id".to_string(),
        project_id: None,
        auth_uri: format!("{base_url}/auth"),
        token_uri: format!("{base_url}/token"),
        userinfo_uri: format!("{base_url}/userinfo"),
        client_secret: "client-secret".to_string(),
        redirect_uris: vec!["http://localhost:8000/auth/callback".to_string()],
        scopes: vec![
            "https://www.googleapis.com/auth/gmail.modify".to_string(),
            "openid".to_string(),
        ],
    }
}

/// Single connection, otherwise every pooled connection gets its own
/// in-memory database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut db_options = ConnectOptions::new("sqlite::memory:");
    db_options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let conn = Database::connect(db_options)
        .await
        .expect("Database connection failed");
    UsageCtrl::init_schema(&conn)
        .await
        .expect("Schema creation failed");

    conn
}

/// Full-format message with a single text/plain payload.
pub fn plain_text_message(subject: &str, body: &str) -> RawMessage {
    RawMessage {
        id: Some("generated".to_string()),
        thread_id: Some("thread".to_string()),
        payload: Some(MessagePart {
            mime_type: Some("text/plain".to_string()),
            headers: Some(vec![
                MessagePartHeader {
                    name: "Subject".to_string(),
                    value: subject.to_string(),
                },
                MessagePartHeader {
                    name: "From".to_string(),
                    value: "sender@example.com".to_string(),
                },
            ]),
            body: Some(MessagePartBody {
                size: Some(body.len() as i64),
                data: Some(URL_SAFE_NO_PAD.encode(body)),
                attachment_id: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// In-memory mailbox. Unknown ids answer `NotFound`.
#[derive(Default)]
pub struct StubMailbox {
    messages: Vec<(String, Result<RawMessage, GatewayError>)>,
    list_failure: Option<GatewayError>,
    get_calls: AtomicUsize,
    trash_calls: AtomicUsize,
}

impl StubMailbox {
    pub fn with_message(mut self, id: &str, message: RawMessage) -> Self {
        self.messages.push((id.to_string(), Ok(message)));
        self
    }

    pub fn with_failure(mut self, id: &str, error: GatewayError) -> Self {
        self.messages.push((id.to_string(), Err(error)));
        self
    }

    pub fn with_list_failure(mut self, error: GatewayError) -> Self {
        self.list_failure = Some(error);
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn trash_calls(&self) -> usize {
        self.trash_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, message_id: &str) -> GatewayResult<RawMessage> {
        self.messages
            .iter()
            .find(|(id, _)| id == message_id)
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| Err(GatewayError::NotFound(message_id.to_string())))
    }
}

#[async_trait]
impl MailboxGateway for StubMailbox {
    async fn list_messages(
        &self,
        _credential: &Credential,
        max_results: u32,
    ) -> GatewayResult<Vec<MessageRef>> {
        if let Some(error) = &self.list_failure {
            return Err(error.clone());
        }

        Ok(self
            .messages
            .iter()
            .take(max_results as usize)
            .map(|(id, _)| MessageRef {
                id: id.clone(),
                thread_id: None,
            })
            .collect())
    }

    async fn get_message(
        &self,
        _credential: &Credential,
        message_id: &str,
        _format: MessageFormat,
    ) -> GatewayResult<RawMessage> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(message_id)
    }

    async fn trash(&self, _credential: &Credential, message_id: &str) -> GatewayResult<()> {
        self.trash_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(message_id).map(|_| ())
    }
}

/// Completion provider answering every prompt the same way.
pub struct StubCompletion {
    reply: Result<String, ProviderError>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubCompletion {
    pub fn replying(reply: &str) -> Self {
        Self::new(Ok(reply.to_string()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(Err(error))
    }

    fn new(reply: Result<String, ProviderError>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for StubCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply.clone()
    }
}

/// Accepts the code `valid-code`; every bearer token resolves to `email`.
pub struct StubCredentials {
    pub email: Option<String>,
}

impl StubCredentials {
    pub fn for_email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self { email: None }
    }
}

#[async_trait]
impl CredentialProvider for StubCredentials {
    fn authorize_url(&self) -> String {
        "https://accounts.example.com/o/oauth2/auth?client_id=client-id".to_string()
    }

    async fn exchange(&self, code: &str) -> Result<Credential, AuthError> {
        if code != "valid-code" {
            return Err(AuthError::Exchange("Malformed auth code.".to_string()));
        }

        Ok(Credential {
            access_token: "ya29.issued-token".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expires_at: Some(Utc::now() + chrono::Duration::seconds(3599)),
            email: self.email.clone(),
        })
    }

    async fn from_token(&self, token: &str) -> Credential {
        Credential {
            email: self.email.clone(),
            ..Credential::from_access_token(token)
        }
    }
}
