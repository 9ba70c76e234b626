use indoc::formatdoc;

/// Labels the reply parser keys on. Each must survive into the provider's
/// answer, so they are spelled out in the prompt.
pub const FIELD_LABELS: [&str; 5] = ["Topic", "Sentiment", "Priority", "Category", "trash"];

pub fn analysis_prompt(subject: &str, from: &str, body: &str) -> String {
    formatdoc! {r#"
        Analyze the following email:

        Subject: {subject}
        From: {from}

        Body:
        {body}

        Return:
        1. Topic
        2. Sentiment (positive, neutral, or negative)
        3. Priority (high, medium, low)
        4. Category (important, promotional, spam, social, updates)
        5. Should it be moved to trash? (yes/no with reason)"#}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt() {
        let expected = concat!(
            "Analyze the following email:\n",
            "\n",
            "Subject: Lunch?\n",
            "From: sam@example.com\n",
            "\n",
            "Body:\n",
            "Are you free at noon?\n",
            "\n",
            "Return:\n",
            "1. Topic\n",
            "2. Sentiment (positive, neutral, or negative)\n",
            "3. Priority (high, medium, low)\n",
            "4. Category (important, promotional, spam, social, updates)\n",
            "5. Should it be moved to trash? (yes/no with reason)",
        );

        assert_eq!(
            analysis_prompt("Lunch?", "sam@example.com", "Are you free at noon?"),
            expected
        );
    }

    #[test]
    fn test_prompt_names_every_field_label() {
        let prompt = analysis_prompt("s", "f", "b").to_lowercase();
        for label in FIELD_LABELS {
            assert!(prompt.contains(&label.to_lowercase()), "missing {label}");
        }
    }

    #[test]
    fn test_multiline_body_kept_verbatim() {
        let body = "line one\n\n  indented line\nline three";
        assert!(analysis_prompt("s", "f", body).contains(body));
    }
}
