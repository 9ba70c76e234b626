use crate::{
    auth::Credential,
    email::{
        body_extractor::{self, EmailInput},
        client::{MailboxGatewayHandle, MessageFormat},
    },
    prompt::{
        analysis::analysis_prompt,
        draft::{draft_prompt, DEFAULT_TONE},
        CompletionProviderHandle,
    },
};

use super::{parser, AnalysisError, DraftResponse, EmailAnalysis};

/// Fetch, extract, prompt, parse. Holds only handles to its two
/// collaborators, each called at most once per request.
#[derive(Clone)]
pub struct AnalysisPipeline {
    mailbox: MailboxGatewayHandle,
    completion: CompletionProviderHandle,
}

impl AnalysisPipeline {
    pub fn new(mailbox: MailboxGatewayHandle, completion: CompletionProviderHandle) -> Self {
        Self {
            mailbox,
            completion,
        }
    }

    async fn load_input(
        &self,
        credential: &Credential,
        message_id: &str,
    ) -> Result<EmailInput, AnalysisError> {
        let message = self
            .mailbox
            .get_message(credential, message_id, MessageFormat::Full)
            .await?;
        let input = body_extractor::extract(&message)?;

        if !input.has_content() {
            tracing::warn!("Message {} has no text content", message_id);
            return Err(AnalysisError::EmptyContent);
        }

        Ok(input)
    }

    pub async fn analyze(
        &self,
        credential: &Credential,
        message_id: &str,
    ) -> Result<EmailAnalysis, AnalysisError> {
        let EmailInput {
            subject,
            from,
            body,
        } = self.load_input(credential, message_id).await?;

        let prompt = analysis_prompt(&subject, &from, &body);
        let reply = self.completion.complete(&prompt).await?;
        let analysis = parser::parse(&reply);
        tracing::info!(
            "Analyzed {}: category {}, priority {}, trash {}",
            message_id,
            analysis.category,
            analysis.priority,
            analysis.should_trash
        );

        Ok(analysis)
    }

    pub async fn draft_reply(
        &self,
        credential: &Credential,
        message_id: &str,
        tone: Option<&str>,
    ) -> Result<DraftResponse, AnalysisError> {
        let EmailInput {
            subject,
            from,
            body,
        } = self.load_input(credential, message_id).await?;

        let tone = tone.unwrap_or(DEFAULT_TONE);
        let prompt = draft_prompt(&subject, &from, &body, tone);
        let reply = self.completion.complete(&prompt).await?;
        tracing::info!("Drafted {} reply for {}", tone, message_id);

        Ok(DraftResponse {
            content: reply.trim().to_string(),
        })
    }
}
