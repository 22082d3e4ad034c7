//! Turn a free-text script into the list of people it mentions.
//!
//! The script is sent to a [`TextModel`] with an instruction to answer with
//! a bare JSON array of `{"name", "searchTerm"}` objects. Models like to wrap
//! such answers in a fenced code block, so fences are stripped before
//! parsing. Output is not deterministic across calls.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::llm::TextModel;
use crate::models::Person;

const PROMPT_TEMPLATE: &str = "\
You are helping a video producer build a shotlist. Read the script below and \
list every real person who is mentioned in it.

Respond with a JSON array and nothing else. Each element must be an object \
with exactly two string fields:
  \"name\": the person's full name as it should be searched,
  \"searchTerm\": a short search query for stock footage of this person, \
adding context such as their role or the event when it helps.

Do not include commentary, markdown, or any text outside the JSON array.

SCRIPT:
";

/// Builds the extraction prompt for `script`.
pub fn build_prompt(script: &str) -> String {
    format!("{}{}", PROMPT_TEMPLATE, script.trim())
}

/// Removes a leading ```` ``` ```` / ```` ```json ```` fence and a trailing
/// ```` ``` ```` fence, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // Drop the language tag (if any) on the opening line.
        s = match rest.find('\n') {
            Some(newline) if rest[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[newline + 1..]
            }
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parses model output into people.
///
/// Fails when the content is not JSON, not an array, an empty array, or
/// contains entries without a name.
pub fn parse_people(text: &str) -> Result<Vec<Person>> {
    let body = strip_code_fence(text);

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::Extraction(format!("model output is not valid JSON: {}", e)))?;

    let entries = value
        .as_array()
        .ok_or_else(|| Error::Extraction("model output is not a JSON array".into()))?;

    if entries.is_empty() {
        return Err(Error::Extraction("no people found in script".into()));
    }

    let mut people = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let person: Person = serde_json::from_value(entry.clone()).map_err(|e| {
            Error::Extraction(format!("entry {} is not a {{name, searchTerm}} object: {}", i, e))
        })?;
        if person.name.trim().is_empty() {
            return Err(Error::Extraction(format!("entry {} has an empty name", i)));
        }
        people.push(Person {
            name: person.name.trim().to_string(),
            search_term: person.search_term.trim().to_string(),
        });
    }

    Ok(people)
}

/// Extracts people mentioned in `script` using `model`.
pub async fn extract_people(model: &dyn TextModel, script: &str) -> Result<Vec<Person>> {
    if script.trim().is_empty() {
        return Err(Error::Extraction("script is empty".into()));
    }

    info!(model = model.model_name(), chars = script.len(), "extracting people from script");
    let response = model.generate(&build_prompt(script)).await?;
    debug!(response = %response, "model response");

    let people = parse_people(&response)?;
    info!(count = people.len(), "extracted people");
    Ok(people)
}
