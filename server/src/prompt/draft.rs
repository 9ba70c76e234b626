use indoc::formatdoc;

pub const DEFAULT_TONE: &str = "professional";

pub fn draft_prompt(subject: &str, from: &str, body: &str, tone: &str) -> String {
    formatdoc! {r#"
        Draft a {tone} response to this email. Keep it concise.
        Only return the text of the response, without a subject line.

        Original email:
        Subject: {subject}
        From: {from}

        {body}"#}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_prompt() {
        let prompt = draft_prompt("Invoice", "ap@vendor.com", "Please pay.", "friendly");
        assert!(prompt.starts_with("Draft a friendly response to this email."));
        assert!(prompt.contains("Subject: Invoice\nFrom: ap@vendor.com\n\nPlease pay."));
    }
}
