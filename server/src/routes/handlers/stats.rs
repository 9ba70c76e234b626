use axum::{extract::State, Json};
use sea_orm::DatabaseConnection;

use crate::{
    auth::Credential,
    error::{AppError, AppJsonResult},
    model::usage::{UsageCtrl, UsageStats},
};

pub async fn get_stats(
    State(conn): State<DatabaseConnection>,
    credential: Credential,
) -> AppJsonResult<UsageStats> {
    let email = credential
        .email
        .ok_or_else(|| AppError::BadRequest("Could not determine user email".to_string()))?;

    let stats = UsageCtrl::get_stats(&conn, &email).await?;
    tracing::debug!("Stats for {}: {:?}", email, stats);

    Ok(Json(stats))
}
