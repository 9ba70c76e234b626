use std::string::FromUtf8Error;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    DecodeError, Engine,
};
use derive_more::derive::Display;
use lib_email_clients::gmail::message::{MessagePart, RawMessage};

const NO_SUBJECT: &str = "No Subject";
const UNKNOWN_SENDER: &str = "Unknown Sender";
const TEXT_PLAIN: &str = "text/plain";

/// Gmail emits base64url both with and without padding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Plain text view of a message, ready to be prompted with.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmailInput {
    pub subject: String,
    pub from: String,
    pub body: String,
}

impl EmailInput {
    pub fn has_content(&self) -> bool {
        !self.body.is_empty()
    }
}

#[derive(Debug, Display)]
pub enum ExtractionError {
    #[display("message body is not valid base64url: {_0}")]
    Base64(DecodeError),
    #[display("message body is not valid UTF-8: {_0}")]
    Utf8(FromUtf8Error),
}

impl std::error::Error for ExtractionError {}

impl From<DecodeError> for ExtractionError {
    fn from(error: DecodeError) -> Self {
        ExtractionError::Base64(error)
    }
}

impl From<FromUtf8Error> for ExtractionError {
    fn from(error: FromUtf8Error) -> Self {
        ExtractionError::Utf8(error)
    }
}

/// Pull subject, sender and the plain text body out of a full-format message.
///
/// The body is the first non-empty `text/plain` part found depth first in the
/// part tree. The top-level payload is only read when there is no part list.
/// A message with neither yields an empty body; deciding what that means is
/// up to the caller.
pub fn extract(message: &RawMessage) -> Result<EmailInput, ExtractionError> {
    let subject = message.header("Subject").unwrap_or(NO_SUBJECT).to_string();
    let from = message.header("From").unwrap_or(UNKNOWN_SENDER).to_string();

    let body = match message.payload.as_ref() {
        Some(payload) => match resolve_body_data(payload) {
            Some(data) => decode_body(data)?,
            None => String::new(),
        },
        None => String::new(),
    };

    Ok(EmailInput {
        subject,
        from,
        body,
    })
}

fn resolve_body_data(payload: &MessagePart) -> Option<&str> {
    match payload.parts.as_deref() {
        Some(parts) => find_plain_text(parts),
        None => payload.body_data(),
    }
}

/// First match wins, sibling order preserved.
fn find_plain_text(parts: &[MessagePart]) -> Option<&str> {
    parts.iter().find_map(|part| {
        if part.is_mime_type(TEXT_PLAIN) {
            if let Some(data) = part.body_data() {
                return Some(data);
            }
        }
        part.parts.as_deref().and_then(find_plain_text)
    })
}

fn decode_body(data: &str) -> Result<String, ExtractionError> {
    let bytes = URL_SAFE_LENIENT.decode(data.trim())?;
    Ok(String::from_utf8(bytes)?)
}
