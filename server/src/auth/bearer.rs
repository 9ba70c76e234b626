use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::AppError;

use super::{Credential, CredentialProviderHandle};

#[async_trait]
impl<S> FromRequestParts<S> for Credential
where
    CredentialProviderHandle: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                AppError::Unauthorized("Missing or invalid authorization header".to_string())
            })?;

        let provider = CredentialProviderHandle::from_ref(state);

        Ok(provider.from_token(bearer.token()).await)
    }
}
