//! Structured training documents and quiz questions recovered from model output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

const OPTION_COUNT: usize = 4;
const OPTION_LABELS: [&str; OPTION_COUNT] = ["A", "B", "C", "D"];

/// One section of generated training, kept as the model wrote it.
///
/// Accessors read leniently: a missing or mistyped field reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingSection(Map<String, Value>);

impl TrainingSection {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("title".to_string(), Value::String(title.into()));
        map.insert("content".to_string(), Value::String(content.into()));
        Self(map)
    }

    pub fn with_key_points(mut self, key_points: Vec<String>) -> Self {
        self.0.insert("keyPoints".to_string(), string_list(key_points));
        self
    }

    /// A section from a list entry. Bare strings become untitled sections.
    fn from_entry(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map.clone())),
            Value::String(text) => Some(Self::new("", text.as_str())),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        text_field(&self.0, "title")
    }

    pub fn content(&self) -> &str {
        text_field(&self.0, "content")
    }

    pub fn key_points(&self) -> Vec<String> {
        list_field(&self.0, "keyPoints")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// The `training` body of a [`TrainingDocument`].
///
/// Holds the object exactly as parsed so it serializes back unchanged,
/// including fields outside the schema and fields of unexpected type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingContent(Map<String, Value>);

impl TrainingContent {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn with_introduction(mut self, introduction: impl Into<String>) -> Self {
        self.0
            .insert("introduction".to_string(), Value::String(introduction.into()));
        self
    }

    pub fn with_sections(mut self, sections: Vec<TrainingSection>) -> Self {
        let sections = sections.into_iter().map(|s| Value::Object(s.0)).collect();
        self.0.insert("sections".to_string(), Value::Array(sections));
        self
    }

    pub fn with_safety_notes(mut self, notes: Vec<String>) -> Self {
        self.0.insert("safetyNotes".to_string(), string_list(notes));
        self
    }

    pub fn with_best_practices(mut self, practices: Vec<String>) -> Self {
        self.0.insert("bestPractices".to_string(), string_list(practices));
        self
    }

    pub fn with_common_mistakes(mut self, mistakes: Vec<String>) -> Self {
        self.0.insert("commonMistakes".to_string(), string_list(mistakes));
        self
    }

    pub fn introduction(&self) -> &str {
        text_field(&self.0, "introduction")
    }

    /// Entries of `sections`. Strings become untitled sections; other scalars are skipped.
    pub fn sections(&self) -> Vec<TrainingSection> {
        match self.0.get("sections") {
            Some(Value::Array(items)) => items.iter().filter_map(TrainingSection::from_entry).collect(),
            Some(other) => TrainingSection::from_entry(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn safety_notes(&self) -> Vec<String> {
        list_field(&self.0, "safetyNotes")
    }

    pub fn best_practices(&self) -> Vec<String> {
        list_field(&self.0, "bestPractices")
    }

    pub fn common_mistakes(&self) -> Vec<String> {
        list_field(&self.0, "commonMistakes")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn string_list(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}

fn text_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// A list of strings read leniently: null or missing is empty, a bare
/// scalar is a one-element list.
fn list_field(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(option_text)
            .filter(|item| !item.is_empty())
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(scalar) => Some(option_text(scalar))
            .filter(|item| !item.is_empty())
            .into_iter()
            .collect(),
    }
}

/// Training content plus its quiz. `quiz` is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingDocument {
    pub training: TrainingContent,
    pub quiz: Vec<QuizQuestion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrainingDocument {
    /// Build a document from parsed JSON.
    ///
    /// Requires a `training` object, which is kept unchanged. A missing, null
    /// or non-array `quiz` becomes an empty list; every quiz entry is
    /// normalized through [`QuizQuestion::from_value`].
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(mut map) = value else {
            return Err("expected a JSON object".to_string());
        };

        let training = match map.remove("training") {
            Some(Value::Object(training)) => TrainingContent(training),
            Some(_) => return Err("`training` must be an object".to_string()),
            None => return Err("missing `training` object".to_string()),
        };

        let quiz = match map.remove("quiz") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => QuizQuestion::from_values(&items),
            Some(other) => {
                warn!(found = %other, "Ignoring non-array quiz");
                Vec::new()
            }
        };

        Ok(Self {
            training,
            quiz,
            extra: map,
        })
    }
}

/// A multiple-choice question with exactly four options.
///
/// Fields are private so the shape invariant cannot be broken after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    question: String,
    options: [String; OPTION_COUNT],
    correct_answer: u8,
    explanation: String,
}

impl QuizQuestion {
    /// Create a question, substituting placeholders for anything invalid.
    ///
    /// `position` is the zero-based index used for the placeholder title.
    pub fn new(
        position: usize,
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: i64,
        explanation: impl Into<String>,
    ) -> Self {
        let question = question.into();
        let question = if question.trim().is_empty() {
            placeholder_question(position)
        } else {
            question
        };

        let mut provided = options.into_iter();
        let options = std::array::from_fn(|i| match provided.next() {
            Some(option) if !option.trim().is_empty() => option,
            _ => placeholder_option(i),
        });

        let correct_answer = u8::try_from(correct_answer)
            .ok()
            .filter(|&answer| usize::from(answer) < OPTION_COUNT)
            .unwrap_or(0);

        Self {
            question,
            options,
            correct_answer,
            explanation: explanation.into(),
        }
    }

    /// Normalize one upstream JSON value into a question.
    pub fn from_value(position: usize, value: &Value) -> Self {
        let question = value
            .get("question")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let options = value
            .get("options")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(option_text).collect())
            .unwrap_or_default();

        let correct_answer = value
            .get("correctAnswer")
            .or_else(|| value.get("correct_answer"))
            .and_then(answer_index)
            .unwrap_or(0);

        let explanation = value
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Self::new(position, question, options, correct_answer, explanation)
    }

    /// Normalize a list of upstream values, numbering placeholders by position.
    pub fn from_values(values: &[Value]) -> Vec<Self> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| Self::from_value(i, value))
            .collect()
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// Index of the correct option, always in `0..4`.
    pub fn correct_answer(&self) -> u8 {
        self.correct_answer
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

fn placeholder_question(position: usize) -> String {
    format!("Question {}", position + 1)
}

fn placeholder_option(index: usize) -> String {
    format!("Option {}", OPTION_LABELS[index])
}

fn option_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Accepts `2`, `"2"`, or a letter `"C"`.
fn answer_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| {
                OPTION_LABELS
                    .iter()
                    .position(|label| label.eq_ignore_ascii_case(s))
                    .map(|i| i as i64)
            })
        }
        _ => None,
    }
}
