//! Recovery of structured data from free-text model output.
//!
//! Models do not reliably return bare JSON. Each pipeline tries an ordered
//! list of source strategies (first hit wins), parses the selected source, and
//! on a parse failure makes exactly one salvage attempt that closes whatever
//! brackets the truncated output left open.
//!
//! The pipelines never invent content. Synthesizing a fallback document when
//! recovery fails is a caller decision.

use crate::document::{QuizQuestion, TrainingDocument};
use crate::error::ProviderError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fenced block pattern is valid")
});

/// Picks a JSON source out of raw model text.
type SourceStrategy = fn(&str) -> Option<&str>;

const DOCUMENT_STRATEGIES: &[(&str, SourceStrategy)] =
    &[("fenced block", fenced_block), ("object span", object_span)];

const QUIZ_STRATEGIES: &[(&str, SourceStrategy)] =
    &[("fenced block", fenced_block), ("array span", array_span)];

/// A recovered training document.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub document: TrainingDocument,
    /// Set when the document came out of the salvage pass.
    pub partial: bool,
}

/// Recover a [`TrainingDocument`] from raw model output.
pub fn recover(raw: &str) -> Result<Recovered, ProviderError> {
    if raw.trim().is_empty() {
        return Err(ProviderError::ResponseFormat(
            "Empty response from AI".to_string(),
        ));
    }

    let (value, partial) = parse_with_salvage(select_source(raw, DOCUMENT_STRATEGIES))?;
    let document = TrainingDocument::from_value(value).map_err(|reason| {
        ProviderError::ResponseFormat(format!("Invalid response structure: {reason}"))
    })?;

    if partial {
        warn!(quiz_count = document.quiz.len(), "Recovered partial JSON response");
    } else {
        debug!(quiz_count = document.quiz.len(), "Parsed training response");
    }

    Ok(Recovered { document, partial })
}

/// Recover a list of quiz questions from raw model output.
///
/// Accepts a bare array or an object wrapping it under `questions` or `quiz`.
pub fn recover_quiz(raw: &str) -> Result<Vec<QuizQuestion>, ProviderError> {
    if raw.trim().is_empty() {
        return Err(ProviderError::ResponseFormat(
            "Empty response from AI".to_string(),
        ));
    }

    let (value, partial) = parse_with_salvage(select_source(raw, QUIZ_STRATEGIES))?;
    if partial {
        warn!("Recovered partial quiz JSON");
    }

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("questions").or_else(|| map.get("quiz")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ProviderError::ResponseFormat(
                    "Invalid quiz structure: expected an array of questions".to_string(),
                ))
            }
        },
        _ => {
            return Err(ProviderError::ResponseFormat(
                "Invalid quiz structure: expected an array of questions".to_string(),
            ))
        }
    };

    Ok(QuizQuestion::from_values(items))
}

fn select_source<'a>(raw: &'a str, strategies: &[(&str, SourceStrategy)]) -> &'a str {
    for (name, strategy) in strategies {
        if let Some(source) = strategy(raw) {
            debug!(strategy = *name, "Selected JSON source");
            return source;
        }
    }
    raw
}

fn fenced_block(raw: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn object_span(raw: &str) -> Option<&str> {
    span(raw, '{', '}')
}

fn array_span(raw: &str) -> Option<&str> {
    span(raw, '[', ']')
}

/// Substring from the first `open` to the last `close`, inclusive.
fn span(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse `source`, falling back to a single salvage attempt.
///
/// Returns the value and whether it came from the salvage pass.
fn parse_with_salvage(source: &str) -> Result<(Value, bool), ProviderError> {
    match serde_json::from_str(source) {
        Ok(value) => Ok((value, false)),
        Err(parse_err) => {
            debug!(error = %parse_err, "JSON parse failed, attempting salvage");
            close_open_brackets(source)
                .and_then(|repaired| serde_json::from_str(&repaired).ok())
                .map(|value| (value, true))
                .ok_or_else(|| {
                    ProviderError::ResponseFormat(format!(
                        "Failed to parse AI response as JSON: {parse_err}"
                    ))
                })
        }
    }
}

/// Append the closing sequence for every bracket left open in `source`.
///
/// An unterminated string is closed first and a dangling comma dropped.
/// Returns `None` when nothing is open or the brackets are mismatched.
fn close_open_brackets(source: &str) -> Option<String> {
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in source.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                if open.pop() != Some(c) {
                    return None;
                }
            }
            _ => {}
        }
    }

    if open.is_empty() && !in_string {
        return None;
    }

    let mut repaired = if in_string {
        let mut s = source.to_string();
        if escaped {
            s.pop();
        }
        s.push('"');
        s
    } else {
        source.trim_end().trim_end_matches(',').to_string()
    };
    repaired.extend(open.iter().rev());
    Some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = r#"{"training":{"introduction":"Intro","sections":[{"title":"S1","content":"C1","keyPoints":["k"]}],"safetyNotes":["n"],"bestPractices":["b"],"commonMistakes":["m"]},"quiz":[{"question":"Q","options":["a","b","c","d"],"correctAnswer":1,"explanation":"e"}]}"#;

    #[test]
    fn test_fenced_block_wins_over_surrounding_prose() {
        let raw = format!(
            "Sure! Here is the {{draft}} you asked for:\n```json\n{DOC}\n```\nLet me know {{if}} you need more."
        );
        let recovered = recover(&raw).unwrap();
        assert!(!recovered.partial);
        assert_eq!(recovered.document.training.introduction(), "Intro");
        assert_eq!(recovered.document.quiz.len(), 1);
        assert_eq!(recovered.document.quiz[0].correct_answer(), 1);
    }

    #[test]
    fn test_untagged_fence_is_accepted() {
        let raw = format!("```\n{DOC}\n```");
        assert!(recover(&raw).is_ok());
    }

    #[test]
    fn test_object_span_between_first_and_last_brace() {
        let raw = format!("Here you go: {DOC} -- end");
        let recovered = recover(&raw).unwrap();
        assert_eq!(recovered.document.training.sections()[0].title(), "S1");
    }

    #[test]
    fn test_missing_quiz_is_injected_and_nothing_else_changes() {
        let value = json!({
            "training": {"introduction": "Hi", "sections": [], "safetyNotes": ["x"],
                         "bestPractices": [], "commonMistakes": [], "audience": "new hires"},
            "meta": {"lang": "en"}
        });
        let recovered = recover(&value.to_string()).unwrap();
        let out = serde_json::to_value(&recovered.document).unwrap();

        let mut expected = value.clone();
        expected["quiz"] = json!([]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_sparse_training_gains_only_quiz() {
        let recovered = recover(r#"{"training":{"introduction":"Hi"}}"#).unwrap();
        let out = serde_json::to_value(&recovered.document).unwrap();
        assert_eq!(out, json!({"training": {"introduction": "Hi"}, "quiz": []}));
    }

    #[test]
    fn test_null_key_points_are_kept_and_read_as_empty() {
        let raw = r#"{"training":{"sections":[{"title":"S1","content":"C1","keyPoints":null}]},"quiz":[]}"#;
        let recovered = recover(raw).unwrap();
        let sections = recovered.document.training.sections();
        assert!(sections[0].key_points().is_empty());

        let out = serde_json::to_value(&recovered.document).unwrap();
        assert_eq!(out["training"]["sections"][0]["keyPoints"], Value::Null);
    }

    #[test]
    fn test_string_safety_notes_are_kept_and_read_as_one_note() {
        let raw = r#"{"training":{"introduction":"Hi","safetyNotes":"Wear gloves"},"quiz":[]}"#;
        let recovered = recover(raw).unwrap();
        assert_eq!(recovered.document.training.safety_notes(), vec!["Wear gloves"]);

        let out = serde_json::to_value(&recovered.document).unwrap();
        assert_eq!(out["training"]["safetyNotes"], "Wear gloves");
    }

    #[test]
    fn test_recover_is_idempotent_on_its_own_output() {
        let first = recover(DOC).unwrap().document;
        let pretty = serde_json::to_string_pretty(&first).unwrap();
        let second = recover(&pretty).unwrap().document;
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_document_is_salvaged_as_partial() {
        let raw = r#"{"training":{"introduction":"Intro","sections":[{"title":"S1","content":"C1","keyPoints":["k"]}"#;
        let recovered = recover(raw).unwrap();
        assert!(recovered.partial);
        assert_eq!(recovered.document.training.sections().len(), 1);
        assert!(recovered.document.quiz.is_empty());
    }

    #[test]
    fn test_canonical_truncation_closes_with_bracket_brace_brace() {
        let repaired = close_open_brackets(r#"{"training":{"sections":["#).unwrap();
        assert!(repaired.ends_with("]}}"));
        let repaired = close_open_brackets(r#"{"training":{"sections":[{"title":"S"},"#).unwrap();
        assert_eq!(repaired, r#"{"training":{"sections":[{"title":"S"}]}}"#);
    }

    #[test]
    fn test_unterminated_string_is_closed() {
        let repaired = close_open_brackets(r#"{"training":{"introduction":"Half a sent"#).unwrap();
        assert_eq!(repaired, r#"{"training":{"introduction":"Half a sent"}}"#);
    }

    #[test]
    fn test_unrecoverable_text_names_parse_error() {
        let err = recover("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ProviderError::ResponseFormat(_)));
        assert!(err.to_string().starts_with("Failed to parse AI response as JSON: "));
    }

    #[test]
    fn test_valid_json_without_training_is_an_error() {
        let err = recover(r#"{"title": "not a training"}"#).unwrap_err();
        assert!(err.to_string().contains("missing `training` object"));
    }

    #[test]
    fn test_empty_response_is_an_error() {
        assert!(recover("   ").is_err());
        assert!(recover_quiz("").is_err());
    }

    #[test]
    fn test_quiz_array_inside_prose() {
        let raw = r#"Here are your questions:
[{"question":"Q1","options":["a","b","c","d"],"correctAnswer":2,"explanation":"x"}]
Good luck!"#;
        let quiz = recover_quiz(raw).unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].correct_answer(), 2);
    }

    #[test]
    fn test_quiz_accepts_wrapped_object() {
        let raw = "```json\n{\"questions\": [{\"question\": \"Q1\"}, {\"question\": \"Q2\"}]}\n```";
        let quiz = recover_quiz(raw).unwrap();
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz[1].question(), "Q2");
    }

    #[test]
    fn test_truncated_quiz_object_is_salvaged() {
        let raw = r#"{"questions": [{"question":"Q1""#;
        assert_eq!(
            close_open_brackets(raw).unwrap(),
            r#"{"questions": [{"question":"Q1"}]}"#
        );

        let quiz = recover_quiz(raw).unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].question(), "Q1");
        assert_eq!(quiz[0].options().len(), 4);
        assert_eq!(quiz[0].options()[0], "Option A");
        assert_eq!(quiz[0].correct_answer(), 0);
    }

    #[test]
    fn test_quiz_salvage_failure_names_original_error() {
        let err = recover_quiz(r#"{"questions": [{"question": }"#).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to parse AI response as JSON: "));
    }

    #[test]
    fn test_quiz_rejects_non_array_json() {
        let err = recover_quiz(r#"{"answer": 42}"#).unwrap_err();
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn test_malformed_quiz_entries_never_break_the_shape() {
        let raw = r#"[{"question":"Q1","options":["a"],"correctAnswer":9},
                      {"options":"not a list","correctAnswer":"x"},
                      "just a string"]"#;
        let quiz = recover_quiz(raw).unwrap();
        assert_eq!(quiz.len(), 3);
        for q in &quiz {
            assert_eq!(q.options().len(), 4);
            assert!(q.correct_answer() <= 3);
        }
        assert_eq!(quiz[2].question(), "Question 3");
    }
}
