use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;

use crate::{
    auth::CredentialProviderHandle,
    error::{AppError, AppJsonResult, AppResult},
    model::response::{AuthTokenResponse, AuthUrlResponse},
    server_config::Frontend,
};

#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CodeExchangeRequest {
    pub code: String,
}

pub async fn handler_auth_url(
    State(credentials): State<CredentialProviderHandle>,
) -> AppJsonResult<AuthUrlResponse> {
    Ok(Json(AuthUrlResponse {
        auth_url: credentials.authorize_url(),
    }))
}

/// Google redirects here. The access token is handed to the frontend in the
/// query string of its own callback page.
pub async fn handler_auth_callback(
    State(credentials): State<CredentialProviderHandle>,
    State(frontend): State<Frontend>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Redirect> {
    if let Some(error) = query.error {
        tracing::error!("Error in auth callback: {}", error);
        return Err(AppError::BadRequest(format!("Authorization failed: {}", error)));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let credential = credentials.exchange(&code).await?;
    tracing::debug!("Generated token: {}...", credential.token_prefix());

    let mut url = frontend.get_callback_url();
    url.query_pairs_mut()
        .append_pair("token", &credential.access_token);

    Ok(Redirect::to(url.as_str()))
}

pub async fn handler_exchange_code(
    State(credentials): State<CredentialProviderHandle>,
    Json(req): Json<CodeExchangeRequest>,
) -> AppJsonResult<AuthTokenResponse> {
    let credential = credentials.exchange(&req.code).await?;
    let expires_in = credential.expires_at.map(|at| at.to_rfc3339());
    tracing::debug!(
        "Generated token: {}..., expires at {:?}",
        credential.token_prefix(),
        expires_in
    );

    Ok(Json(AuthTokenResponse {
        access_token: credential.access_token,
        email: credential.email,
        expires_in,
    }))
}
