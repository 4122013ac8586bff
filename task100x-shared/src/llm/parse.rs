/// Parsing of model output

use serde::{Deserialize, Serialize};

use crate::models::quiz::NewQuestion;

/// Two-line session reminder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPointers {
    pub pointer1: String,
    pub pointer2: String,
}

impl ReminderPointers {
    pub fn is_empty(&self) -> bool {
        self.pointer1.is_empty() && self.pointer2.is_empty()
    }

    /// Both pointers as a single message body
    pub fn to_message(&self) -> String {
        [self.pointer1.as_str(), self.pointer2.as_str()]
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| format!("• {}", p))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedQuiz {
    questions: Vec<NewQuestion>,
}

/// The JSON object between the first `{` and the last `}`
///
/// Tolerates markdown fences and chatter around the object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    (start < end).then(|| &text[start..=end])
}

/// Reads `Pointer 1:` / `Pointer 2:` lines
///
/// Leading bullets and whitespace are ignored. Returns None when neither
/// pointer is present.
pub fn parse_pointers(text: &str) -> Option<ReminderPointers> {
    let mut pointers = ReminderPointers::default();

    for line in text.lines() {
        let line = line.trim_start_matches(['-', '*', '•', ' ', '\t']).trim();
        if let Some(rest) = line.strip_prefix("Pointer 1:") {
            pointers.pointer1 = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Pointer 2:") {
            pointers.pointer2 = rest.trim().to_string();
        }
    }

    (!pointers.is_empty()).then_some(pointers)
}

/// Parses quiz questions from model output
pub fn parse_generated_quiz(text: &str) -> Result<Vec<NewQuestion>, serde_json::Error> {
    let json = extract_json_object(text).unwrap_or(text);
    let quiz: GeneratedQuiz = serde_json::from_str(json)?;

    Ok(quiz.questions)
}
