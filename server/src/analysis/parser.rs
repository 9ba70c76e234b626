use strum::{EnumIter, IntoEnumIterator};

use super::EmailAnalysis;

/// Field markers, in the order they are tested against each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
enum Marker {
    Topic,
    Sentiment,
    Priority,
    Category,
    Trash,
    KeyPoints,
    ActionItems,
}

impl Marker {
    fn as_str(&self) -> &'static str {
        match self {
            Marker::Topic => "topic",
            Marker::Sentiment => "sentiment",
            Marker::Priority => "priority",
            Marker::Category => "category",
            Marker::Trash => "trash",
            Marker::KeyPoints => "key points",
            Marker::ActionItems => "action items",
        }
    }

    fn find(line: &str) -> Option<Self> {
        Marker::iter().find(|marker| line.contains(marker.as_str()))
    }
}

fn value_of(line: &str) -> String {
    line.rsplit_once(':')
        .map_or(line, |(_, value)| value)
        .trim()
        .to_string()
}

/// Scrape the provider's free text reply into an [`EmailAnalysis`].
///
/// Never fails: lines that match no marker are ignored and missing fields keep
/// their defaults. Scalar fields take the last matching line, list fields
/// collect every matching line.
pub fn parse(raw: &str) -> EmailAnalysis {
    let mut analysis = EmailAnalysis::default();

    for line in raw.lines() {
        let line = line.trim().to_lowercase();
        let Some(marker) = Marker::find(&line) else {
            continue;
        };

        match marker {
            Marker::Topic => analysis.topic = value_of(&line),
            Marker::Sentiment => analysis.sentiment = value_of(&line),
            Marker::Priority => analysis.priority = value_of(&line),
            Marker::Category => analysis.category = value_of(&line),
            Marker::Trash => analysis.should_trash = line.contains("yes"),
            Marker::KeyPoints => analysis.key_points.push(value_of(&line)),
            Marker::ActionItems => analysis.action_items.push(value_of(&line)),
        }
    }

    analysis
}
