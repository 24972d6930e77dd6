use serde::{Deserialize, Serialize};

/// A canned button under the chat input: the topic it asks about and the
/// label echoed into the transcript as the visitor's message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    pub topic: String,
    pub label: String,
}

impl QuickReply {
    pub fn new(topic: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            label: label.into(),
        }
    }
}

pub const DEFAULT_QUICK_REPLIES: &[(&str, &str)] = &[
    ("programs", "Programs"),
    ("fees", "Fees"),
    ("timings", "Timings"),
    ("trial", "Free Trial"),
    ("contact", "Contact"),
];

pub fn default_quick_replies() -> Vec<QuickReply> {
    DEFAULT_QUICK_REPLIES
        .iter()
        .map(|(topic, label)| QuickReply::new(*topic, *label))
        .collect()
}
