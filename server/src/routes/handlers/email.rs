use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::{
    analysis::{AnalysisPipeline, DraftResponse, EmailAnalysis},
    auth::Credential,
    email::{client::MailboxGatewayHandle, summary::fetch_summaries},
    error::{AppError, AppJsonResult},
    model::{
        response::{EmailListResponse, StatusResponse},
        usage::UsageCtrl,
    },
    server_config::Settings,
};

#[derive(Deserialize, Debug)]
pub struct DraftOptions {
    pub tone: Option<String>,
}

pub async fn list_emails(
    State(mailbox): State<MailboxGatewayHandle>,
    State(conn): State<DatabaseConnection>,
    State(settings): State<Settings>,
    credential: Credential,
) -> AppJsonResult<EmailListResponse> {
    let user_email = credential
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("Could not determine user email".to_string()))?;

    let refs = mailbox
        .list_messages(&credential, settings.max_list_results)
        .await?;
    let emails = fetch_summaries(mailbox.as_ref(), &credential, &refs).await;

    for email in &emails {
        // logging failures do not fail the listing
        if let Err(e) =
            UsageCtrl::log_email_activity(&conn, &user_email, &email.message_id, false).await
        {
            tracing::error!("Error logging email activity: {:?}", e);
        }
    }

    tracing::debug!("Retrieved {} emails for {}", emails.len(), user_email);
    Ok(Json(EmailListResponse { emails }))
}

pub async fn trash_email(
    State(mailbox): State<MailboxGatewayHandle>,
    State(conn): State<DatabaseConnection>,
    Path(message_id): Path<String>,
    credential: Credential,
) -> AppJsonResult<StatusResponse> {
    mailbox.trash(&credential, &message_id).await?;

    if let Some(email) = credential.email.as_deref() {
        if let Err(e) = UsageCtrl::log_email_activity(&conn, email, &message_id, false).await {
            tracing::error!("Error logging trash activity: {:?}", e);
        }
    }

    tracing::debug!("Successfully moved email {} to trash", message_id);
    Ok(Json(StatusResponse::success()))
}

pub async fn analyze_email(
    State(pipeline): State<AnalysisPipeline>,
    Path(message_id): Path<String>,
    credential: Credential,
) -> AppJsonResult<EmailAnalysis> {
    tracing::debug!(
        "Analyzing email {} with token {}...",
        message_id,
        credential.token_prefix()
    );
    let analysis = pipeline.analyze(&credential, &message_id).await?;

    Ok(Json(analysis))
}

pub async fn draft_response(
    State(pipeline): State<AnalysisPipeline>,
    Path(message_id): Path<String>,
    Query(options): Query<DraftOptions>,
    credential: Credential,
) -> AppJsonResult<DraftResponse> {
    let draft = pipeline
        .draft_reply(&credential, &message_id, options.tone.as_deref())
        .await?;

    Ok(Json(draft))
}
