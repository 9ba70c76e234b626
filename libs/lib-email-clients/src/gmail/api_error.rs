use serde::Deserialize;

/// Gmail API error response structure
#[derive(Debug, Clone, Deserialize)]
pub struct GmailApiError {
    pub error: GmailApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GmailApiErrorDetail {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl GmailApiError {
    /// Best effort extraction of the error message from a response body.
    /// Falls back to the raw body when it is not a Gmail error envelope.
    pub fn message_from_body(body: &str) -> String {
        serde_json::from_str::<GmailApiError>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string())
    }
}
