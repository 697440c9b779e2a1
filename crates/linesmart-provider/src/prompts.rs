//! Prompt text shared by every adapter.

use crate::kind::ProviderKind;
use crate::types::GenerationContext;
use serde_json::Value;

const OPENAI_PREAMBLE: &str = "\
You are the standard operating procedure and industrial training author for LineSmart, \
a training platform for manufacturing and industrial teams.

Every procedure you write must:
- put worker safety first, with hazards and required PPE stated before any step
- use the company documentation provided to make instructions site-specific
- follow a clear structure: purpose and scope, safety, prerequisites, numbered steps, \
quality checks, emergency response, documentation
- use direct action verbs (\"Press\", \"Verify\", \"Lock out\") and exact measurements
- leave exactly one possible interpretation for each step
- stay aligned with OSHA, ISO 45001, HACCP, FDA, GMP and SQF requirements where they apply";

const CLAUDE_PREAMBLE: &str = "\
You are the safety specialist behind LineSmart, a training platform for industrial \
and manufacturing workforces.

Build training that is rigorous about safety and compliance:
- analyse each scenario for hazards and safety gaps before writing
- ground every statement in the company documentation provided
- explain why each safety procedure matters, not only what to do
- cover the applicable regulatory requirements (OSHA, ISO 45001, HACCP, FDA, GMP, SQF)
- structure the material so knowledge builds step by step
- use plain, unambiguous language suitable for safety-critical work";

const GEMINI_PREAMBLE: &str = "\
You are the multilingual training author for LineSmart, an industrial training \
platform used by teams across many countries and languages.

Write training that travels well:
- keep safety standards identical across languages and regions
- preserve technical terms and safety information exactly when language changes
- describe visual cues, labels and diagrams workers will see on site
- reference international and regional compliance standards where relevant
- adapt examples to the employee's department and experience level";

const GROK_PREAMBLE: &str = "\
You are the training engine behind LineSmart, an industrial training platform that \
turns company documents into practical lessons for shop-floor workers.

Make the training stick:
- safety comes first in every answer
- turn the company documentation provided into concrete, memorable lessons
- speak the language of production, maintenance, quality, safety and engineering teams
- calibrate depth to the employee's experience, from first week to veteran
- show why each rule matters so workers understand it instead of memorising it";

const LLAMA_PREAMBLE: &str = "\
You are a training content author for LineSmart, an industrial training platform.

Write clear, practical training for industrial workers:
- state hazards and required protective equipment first
- base the content on the company documentation provided
- use short numbered steps and plain language
- finish with the key points a worker must remember";

/// Persona preamble for a backend's system message.
pub fn preamble(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => OPENAI_PREAMBLE,
        ProviderKind::Claude => CLAUDE_PREAMBLE,
        ProviderKind::Gemini => GEMINI_PREAMBLE,
        ProviderKind::Grok => GROK_PREAMBLE,
        ProviderKind::Llama => LLAMA_PREAMBLE,
    }
}

/// Preamble followed by the numbered documentation block, if any.
pub fn system_message(preamble: &str, context: &GenerationContext) -> String {
    let mut message = preamble.to_string();
    if !context.documents.is_empty() {
        message.push_str("\n\nRelevant Company Documentation:\n");
        for (i, doc) in context.documents.iter().enumerate() {
            message.push_str(&format!("\n[Document {}: {}]\n{}\n", i + 1, doc.name, doc.content));
        }
    }
    message
}

/// Caller prompt followed by the employee and requirements blocks, if any.
pub fn user_message(prompt: &str, context: &GenerationContext) -> String {
    let mut message = prompt.to_string();
    if let Some(employee) = &context.employee {
        message.push_str("\n\nEmployee Context:");
        message.push_str(&format!("\n- Department: {}", employee.department));
        message.push_str(&format!("\n- Position: {}", employee.position));
        message.push_str(&format!("\n- Language: {}", employee.language));
        message.push_str(&format!(
            "\n- Experience Level: {}",
            employee.experience_level.as_deref().unwrap_or("intermediate")
        ));
    }
    if let Some(requirements) = &context.requirements {
        message.push_str(&format!("\n\nSpecific Requirements: {requirements}"));
    }
    message
}

pub const QUIZ_SYSTEM_PROMPT: &str = "You are an expert training content creator. \
Generate clear, relevant quiz questions in JSON format. Respond only with valid JSON.";

pub fn quiz_prompt(content: &str, question_count: usize) -> String {
    format!(
        "Based on the following training content, generate exactly {question_count} \
multiple-choice quiz questions.\n\
Format as a JSON array with this structure: \
[{{\"question\": \"...\", \"options\": [\"A\", \"B\", \"C\", \"D\"], \"correctAnswer\": 0, \"explanation\": \"...\"}}]\n\n\
Training Content:\n{content}\n\n\
Respond with only the JSON array, no additional text or markdown."
    )
}

pub const TRANSLATION_SYSTEM_PROMPT: &str = "You are a professional translator specializing in \
technical and training materials. Translate accurately while preserving technical terms and \
safety information.";

/// Display name for a language code. Unknown codes pass through unchanged.
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "pt" => "Portuguese",
        "de" => "German",
        "zh" => "Chinese",
        "ja" => "Japanese",
        other => other,
    }
}

pub fn translation_prompt(content: &str, target_language: &str) -> String {
    format!(
        "Translate the following content to {}:\n\n{content}",
        language_name(target_language)
    )
}

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert in workforce development and \
training analytics. Provide actionable, personalized insights.";

pub fn analysis_prompt(employee_data: &Value) -> String {
    let data = serde_json::to_string_pretty(employee_data).unwrap_or_else(|_| employee_data.to_string());
    format!(
        "Analyze the following employee training data and provide personalized recommendations:\n\n\
{data}\n\n\
Cover:\n\
1. Strengths and areas of expertise\n\
2. Knowledge gaps or struggling areas\n\
3. Recommended next training topics\n\
4. Suggested learning path\n\
5. Estimated time to proficiency\n\n\
Format the response as structured text with clear sections."
    )
}

pub fn safety_system_prompt(context: &GenerationContext) -> String {
    let mut prompt = String::from(
        "You are a safety expert for industrial and manufacturing environments. \
Generate safety training content that:\n\
- emphasizes hazard awareness and prevention\n\
- includes clear, step-by-step procedures\n\
- references the relevant safety standards (OSHA, ISO and similar)\n\
- uses plain language suitable for every education level\n\
- includes specific examples and scenarios",
    );
    if !context.documents.is_empty() {
        prompt.push_str("\nReference the company safety documentation provided.");
    }
    system_message(&prompt, context)
}

pub fn safety_prompt(scenario: &str) -> String {
    format!("Create detailed safety training content for the following scenario:\n\n{scenario}")
}

/// Safety request routed through plain training generation.
pub fn safety_fallback_prompt(scenario: &str) -> String {
    format!(
        "Generate comprehensive safety training content for the following scenario. \
Emphasize hazard awareness, prevention, and step-by-step safety procedures:\n\n{scenario}"
    )
}

pub fn sop_prompt(prompt: &str) -> String {
    format!(
        "Create a comprehensive Standard Operating Procedure (SOP) for: {prompt}

Use this format:

# SOP: [Title]

## 1. PURPOSE & SCOPE
- **Objective**: what this SOP accomplishes
- **Scope**: where and when it applies
- **Personnel**: who uses it

## 2. SAFETY REQUIREMENTS
- **Hazards**: specific dangers and risks
- **Required PPE**: protective equipment
- **Safety Protocols**: critical safety steps

## 3. PREREQUISITES
- **Training Required**: certifications needed
- **Equipment/Tools**: what the task needs
- **Environmental Conditions**: temperature, cleanliness and similar

## 4. STEP-BY-STEP PROCEDURE
Numbered steps with clear action verbs, 10 to 20 steps.

## 5. QUALITY CHECKPOINTS
- **During Process**: verification points
- **Final Verification**: end-of-procedure checks
- **Acceptance Criteria**: what defines success

## 6. EMERGENCY PROCEDURES
- **If Equipment Fails**: immediate actions
- **If a Safety Issue Occurs**: emergency response
- **Who to Contact**: emergency contacts

## 7. DOCUMENTATION
- **Records Required**: what to record
- **Sign-offs Needed**: who approves completion
- **Retention Period**: how long records are kept"
    )
}

/// SOP request routed through plain training generation.
pub fn sop_fallback_prompt(prompt: &str) -> String {
    format!(
        "Create a detailed Standard Operating Procedure (SOP) for: {prompt}. Include safety \
requirements, step-by-step instructions, quality checkpoints, and emergency procedures."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContextDocument, EmployeeProfile};

    fn context() -> GenerationContext {
        GenerationContext {
            documents: vec![
                ContextDocument {
                    name: "LOTO.pdf".to_string(),
                    content: "Isolate energy sources.".to_string(),
                },
                ContextDocument {
                    name: "PPE.docx".to_string(),
                    content: "Gloves and goggles.".to_string(),
                },
            ],
            employee: Some(EmployeeProfile {
                department: "Maintenance".to_string(),
                position: "Technician".to_string(),
                language: "es".to_string(),
                experience_level: None,
            }),
            requirements: Some("Keep it under ten minutes".to_string()),
        }
    }

    #[test]
    fn test_system_message_lists_documents_in_order() {
        let msg = system_message("Preamble", &context());
        assert!(msg.starts_with("Preamble\n\nRelevant Company Documentation:\n"));
        let first = msg.find("[Document 1: LOTO.pdf]\nIsolate energy sources.").unwrap();
        let second = msg.find("[Document 2: PPE.docx]\nGloves and goggles.").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_system_message_without_documents_is_preamble() {
        assert_eq!(system_message("Preamble", &GenerationContext::default()), "Preamble");
    }

    #[test]
    fn test_user_message_appends_employee_and_requirements() {
        let msg = user_message("Lockout/tagout", &context());
        assert!(msg.starts_with("Lockout/tagout\n\nEmployee Context:"));
        assert!(msg.contains("- Department: Maintenance"));
        assert!(msg.contains("- Experience Level: intermediate"));
        assert!(msg.ends_with("Specific Requirements: Keep it under ten minutes"));
    }

    #[test]
    fn test_language_lookup_passes_unknown_codes_through() {
        assert_eq!(language_name("es"), "Spanish");
        assert_eq!(language_name("ja"), "Japanese");
        assert_eq!(language_name("Klingon"), "Klingon");
        assert!(translation_prompt("Hi", "de").starts_with("Translate the following content to German:"));
    }

    #[test]
    fn test_quiz_prompt_asks_for_exact_count() {
        let prompt = quiz_prompt("Wear gloves.", 7);
        assert!(prompt.contains("exactly 7 multiple-choice"));
        assert!(prompt.contains("\"correctAnswer\": 0"));
        assert!(prompt.contains("Wear gloves."));
    }

    #[test]
    fn test_every_provider_has_a_preamble() {
        for kind in ProviderKind::ALL {
            assert!(preamble(kind).contains("LineSmart"));
        }
    }
}
