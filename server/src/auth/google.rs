use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use url::Url;

use crate::{
    model::response::{GoogleIdTokenClaims, GoogleTokenResponse, GoogleUserInfo},
    server_config::GmailConfig,
    HttpClient,
};

use super::{AuthError, Credential, CredentialProvider};

/// Google OAuth2 authorization code flow, done by hand over reqwest.
#[derive(Debug, Clone)]
pub struct GoogleCredentialProvider {
    http_client: HttpClient,
    config: GmailConfig,
    auth_uri: Url,
}

impl GoogleCredentialProvider {
    pub fn new(http_client: HttpClient, config: GmailConfig) -> anyhow::Result<Self> {
        let auth_uri = Url::parse(&config.auth_uri)?;
        anyhow::ensure!(
            !config.redirect_uris.is_empty(),
            "Google client config has no redirect uri"
        );

        Ok(Self {
            http_client,
            config,
            auth_uri,
        })
    }

    fn redirect_uri(&self) -> &str {
        self.config.redirect_uris[0].as_str()
    }

    async fn fetch_user_email(&self, access_token: &str) -> Option<String> {
        let resp = self
            .http_client
            .get(&self.config.userinfo_uri)
            .bearer_auth(access_token)
            .send()
            .await
            .inspect_err(|e| tracing::warn!("Could not get user info: {:?}", e))
            .ok()?;

        if !resp.status().is_success() {
            tracing::error!("Failed to fetch userinfo: {}", resp.status());
            return None;
        }

        resp.json::<GoogleUserInfo>()
            .await
            .inspect_err(|e| tracing::warn!("Unexpected userinfo response: {:?}", e))
            .ok()?
            .email
    }
}

#[async_trait]
impl CredentialProvider for GoogleCredentialProvider {
    fn authorize_url(&self) -> String {
        let GmailConfig {
            client_id, scopes, ..
        } = &self.config;

        let mut url = self.auth_uri.clone();
        url.query_pairs_mut().extend_pairs(&[
            ("client_id", client_id.as_str()),
            ("redirect_uri", self.redirect_uri()),
            ("response_type", "code"),
            ("scope", scopes.join(" ").as_str()),
            ("access_type", "offline"),
            // forces re-consent so a refresh token is always issued
            ("prompt", "consent"),
            ("include_granted_scopes", "false"),
        ]);

        url.to_string()
    }

    async fn exchange(&self, code: &str) -> Result<Credential, AuthError> {
        let GmailConfig {
            token_uri,
            client_id,
            client_secret,
            ..
        } = &self.config;

        tracing::debug!("Exchanging authorization code, redirect uri {}", self.redirect_uri());
        let resp = self
            .http_client
            .post(token_uri)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error getting token: {:?}", e);
                AuthError::Exchange(e.to_string())
            })?;

        let resp: serde_json::Value = resp
            .json()
            .await
            .map_err(|_| AuthError::BadOauthResponse)?;

        if let Some(error) = resp.get("error") {
            let description = resp
                .get("error_description")
                .and_then(|d| d.as_str())
                .or_else(|| error.as_str())
                .unwrap_or("unknown error");
            tracing::error!("Error in oauth2 token exchange: {}", description);
            return Err(AuthError::Exchange(description.to_string()));
        }

        let token: GoogleTokenResponse = serde_json::from_value(resp.clone()).map_err(|_| {
            tracing::error!("Failed to parse response: {:?}", resp);
            AuthError::BadOauthResponse
        })?;

        let email = token.id_token.as_deref().and_then(email_from_id_token);
        let credential = Credential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: expiry_from_now(token.expires_in),
            email,
        };
        tracing::debug!("Obtained credential {:?}", credential);

        Ok(credential)
    }

    async fn from_token(&self, token: &str) -> Credential {
        let mut credential = Credential::from_access_token(token);
        credential.email = self.fetch_user_email(token).await;
        tracing::debug!(
            "Credential from token {}..., email {:?}",
            credential.token_prefix(),
            credential.email
        );
        credential
    }
}

/// `None` when the lifetime does not fit a timestamp.
fn expiry_from_now(expires_in: u64) -> Option<DateTime<Utc>> {
    let lifetime = i64::try_from(expires_in)
        .ok()
        .and_then(TimeDelta::try_seconds)?;
    Utc::now().checked_add_signed(lifetime)
}

/// The id token only labels the session, so its signature is not checked.
fn email_from_id_token(id_token: &str) -> Option<String> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<GoogleIdTokenClaims>(
        id_token,
        &DecodingKey::from_secret(&[]),
        &validation,
    )
    .inspect_err(|e| tracing::warn!("Could not decode ID token: {:?}", e))
    .ok()?
    .claims
    .email
}
