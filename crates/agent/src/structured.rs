//! Structured result coercion
//!
//! Asks the model to answer with a JSON value of a given shape, then pulls
//! the first balanced object out of whatever text comes back and validates
//! it. One attempt only; callers wrap their own retry policy if they want one.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use tripsmith_provider::Provider;

use crate::loop_agent::Agent;
use crate::{AgentError, Result};

/// A value the model can be asked to produce
pub trait StructuredOutput: DeserializeOwned {
    /// Example or schema document shown to the model
    fn schema() -> Value;

    /// Checks beyond what deserialization enforces
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Append the answer-format instruction for `schema` to `query`
pub fn structured_query(query: &str, schema: &Value) -> String {
    let schema = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "{query}\n\n\
         Respond ONLY with a single JSON object matching this schema:\n\
         {schema}\n\n\
         Do not add explanations, markdown or code fences."
    )
}

/// First balanced `{...}` substring of `text`.
///
/// Braces inside JSON string literals are ignored, so prose around the
/// object and code-fence markers do not matter. An opening brace that never
/// closes is skipped and the scan resumes at the next one.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(found) = text[from..].find('{') {
        let start = from + found;
        if let Some(len) = balanced_len(&text[start..]) {
            return Some(&text[start..start + len]);
        }
        from = start + 1;
    }
    None
}

/// Byte length of the object opening at the start of `text`, if it closes
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Escape raw control characters that appear inside string literals.
/// Models regularly emit literal newlines inside long descriptions.
fn escape_control_in_strings(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    out.push(ch);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        } else {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
        }
    }

    out
}

fn parse_object(candidate: &str) -> std::result::Result<Value, serde_json::Error> {
    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first) => {
            debug!("strict parse failed ({}), retrying with escaped control characters", first);
            serde_json::from_str(&escape_control_in_strings(candidate)).map_err(|_| first)
        }
    }
}

/// Extract, parse and validate a `T` from free text
pub fn coerce<T: StructuredOutput>(raw: &str) -> Result<T> {
    let failure = |reason: String| AgentError::SchemaCoercion {
        reason,
        raw: raw.to_string(),
    };

    let candidate =
        extract_json_object(raw).ok_or_else(|| failure("no JSON object found".to_string()))?;
    let value = parse_object(candidate).map_err(|e| failure(format!("invalid JSON: {}", e)))?;
    let parsed: T =
        serde_json::from_value(value).map_err(|e| failure(format!("schema mismatch: {}", e)))?;
    parsed.validate().map_err(|e| failure(format!("validation failed: {}", e)))?;

    Ok(parsed)
}

impl<P: Provider> Agent<P> {
    /// One full loop run whose answer is coerced into `T`
    pub async fn run_structured<T: StructuredOutput>(&mut self, query: &str) -> Result<T> {
        let prompt = structured_query(query, &T::schema());
        let answer = self.run(&prompt).await?.into_answer()?;

        coerce::<T>(&answer).map_err(|e| {
            warn!(agent = %self.name(), "{}", e);
            e
        })
    }
}
