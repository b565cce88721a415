//! Language-model port.
//!
//! The provider is the only asynchronous collaborator in the forge. Hosts
//! plug in a real client; tests plug in a canned one.

use async_trait::async_trait;

use crate::effects::vocab::OPERATION_NAMES;

/// A generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stop_sequences: Vec<String>,
}

/// A completed generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
    pub stop_reason: Option<String>,
}

impl LlmResponse {
    /// A response carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Text generation backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}

/// Build the generation prompt for a spell idea.
pub fn build_prompt(description: &str, paradigm: Option<&str>) -> String {
    let paradigm = paradigm.map_or_else(String::new, |p| format!("Magic paradigm: {p}\n"));
    format!(
        "Design a magical effect as a single JSON object.\n\
         Spell idea: {description}\n\
         {paradigm}\
         Required fields: \"target\" (with \"type\"), \"operations\" (non-empty array, each with \"op\"), \
         \"timing\" (with \"type\").\n\
         Allowed operations: {ops}.\n\
         Respond with the JSON object only.",
        ops = OPERATION_NAMES.join(", ")
    )
}

/// Locate the JSON object in a model response.
///
/// Tries a ```json fenced block, then any fenced block, then the span from
/// the first `{` to the last `}`.
pub fn extract_json(response: &str) -> Option<&str> {
    if let Some(start) = response.find("```json") {
        let body = &response[start + 7..];
        if let Some(end) = body.find("```") {
            return Some(body[..end].trim());
        }
    }

    if let Some(start) = response.find("```") {
        let body = &response[start + 3..];
        if let Some(end) = body.find("```") {
            let content = body[..end].trim();
            // skip a language tag on the fence line
            return match content.split_once('\n') {
                Some((first, rest)) if !first.trim_start().starts_with('{') => Some(rest.trim()),
                _ => Some(content),
            };
        }
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

/// Extract and parse the effect object from a model response.
pub fn parse_effect_json(response: &str) -> Result<serde_json::Value, LlmError> {
    let json = extract_json(response)
        .ok_or_else(|| LlmError::InvalidResponse("no JSON object in response".to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(LlmError::InvalidResponse("response JSON is not an object".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_json() {
        let response = "Here you go:\n```json\n{\"a\": 1}\n```\nEnjoy.";
        assert_eq!(extract_json(response), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_plain_fence_with_tag() {
        let response = "```javascript\n{\"a\": 2}\n```";
        assert_eq!(extract_json(response), Some("{\"a\": 2}"));
    }

    #[test]
    fn test_extract_bare_object() {
        let response = "The effect is {\"a\": {\"b\": 3}} as requested";
        assert_eq!(extract_json(response), Some("{\"a\": {\"b\": 3}}"));
    }

    #[test]
    fn test_no_json() {
        assert!(extract_json("I cannot help with that").is_none());
        assert!(matches!(
            parse_effect_json("nothing here"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(parse_effect_json("```json\n[1, 2]\n```").is_err());
    }

    #[test]
    fn test_prompt_mentions_idea_and_ops() {
        let prompt = build_prompt("a frost nova", Some("academic"));
        assert!(prompt.contains("a frost nova"));
        assert!(prompt.contains("Magic paradigm: academic"));
        assert!(prompt.contains("chain_effect"));
    }
}
