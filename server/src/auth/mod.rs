pub mod bearer;
pub mod google;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::derive::Display;

pub use google::GoogleCredentialProvider;

/// Opaque mailbox access granted by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Account address, when the provider could tell us
    pub email: Option<String>,
}

impl Credential {
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            email: None,
        }
    }

    /// Enough of the token to correlate log lines, never the whole thing
    pub fn token_prefix(&self) -> &str {
        self.access_token
            .get(..10)
            .unwrap_or(self.access_token.as_str())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &format!("{}...", self.token_prefix()))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display("token exchange failed: {_0}")]
    Exchange(String),
    #[display("unexpected oauth response")]
    BadOauthResponse,
}

impl std::error::Error for AuthError {}

/// Issues and wraps mailbox credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// URL the user visits to grant mailbox access
    fn authorize_url(&self) -> String;

    /// Trade an authorization code for a credential
    async fn exchange(&self, code: &str) -> Result<Credential, AuthError>;

    /// Wrap an access token the client already holds. Resolving the account
    /// email is best effort.
    async fn from_token(&self, token: &str) -> Credential;
}

pub type CredentialProviderHandle = Arc<dyn CredentialProvider>;
