//! AI-generated test values for form fields.
//!
//! Works on field descriptors only; finding fields in a page and writing
//! the values back happen elsewhere.

use pagelens_core::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ai::ChatClient;

/// System prompt for whole-form requests.
pub const FORM_SYSTEM_PROMPT: &str =
    "You are an assistant that generates test data for form fields. Reply strictly in JSON.";

/// System prompt for single-field requests.
pub const FIELD_SYSTEM_PROMPT: &str = "You are an assistant that generates test data for form fields.";

const TYPE_GUIDE: &str = "Field types:\n\
- text: suitable text\n\
- email: a valid email address\n\
- password: a strong password\n\
- number: a number\n\
- tel: a phone number\n\
- url: a valid URL\n\
- date: a date\n\
- select: an option value\n\
- textarea: a longer text\n\
- checkbox: true or false\n\
- radio: an option value";

/// A form field as reported by the page's form detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FormField {
    pub name: String,
    /// Input type (`text`, `email`, `select`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub required: bool,
    pub placeholder: Option<String>,
}

impl FormField {
    fn describe(&self) -> String {
        let mut out = format!(
            "Field name: {}\nField type: {}\nField label: {}\nRequired: {}",
            self.name,
            self.kind,
            self.label,
            if self.required { "yes" } else { "no" }
        );
        if let Some(placeholder) = self.placeholder.as_deref().filter(|p| !p.is_empty()) {
            out.push_str(&format!("\nPlaceholder: {placeholder}"));
        }
        out
    }
}

/// Build the prompt asking for values for all of `fields` as one JSON object.
pub fn form_fill_prompt(fields: &[FormField]) -> String {
    let described: Vec<String> = fields.iter().map(FormField::describe).collect();
    let example_key =
        |i: usize, default: &'static str| fields.get(i).map_or(default, |f| f.name.as_str()).to_string();

    format!(
        "Generate suitable test data for the following form fields:\n\n\
         {fields}\n\n\
         Requirements:\n\
         1. Realistic, plausible values\n\
         2. Respect the field type and placeholder\n\
         3. Required fields must get a valid value\n\
         4. Return valid JSON keyed by field name\n\n\
         Return exactly this JSON shape:\n\
         {{\n  \"{first}\": \"value\",\n  \"{second}\": \"value\"\n}}\n\n\
         {TYPE_GUIDE}\n\n\
         Return the JSON only:",
        fields = described.join("\n\n"),
        first = example_key(0, "field1"),
        second = example_key(1, "field2"),
    )
}

/// Build the prompt asking for a bare value for one field.
pub fn field_value_prompt(field: &FormField) -> String {
    format!(
        "Generate suitable test data for the following form field:\n\n\
         {field}\n\n\
         Requirements:\n\
         1. A realistic, plausible value\n\
         2. Respect the field type and placeholder\n\
         3. A required field must get a valid value\n\
         4. Return the value only, without explanation\n\n\
         {TYPE_GUIDE}\n\n\
         Return the value of this field:",
        field = field.describe(),
    )
}

/// Pull the JSON object out of a whole-form reply.
///
/// Code fences are dropped, then everything from the first `{` to the last
/// `}` must parse as an object.
pub fn parse_form_reply(reply: &str) -> Result<Map<String, Value>, Error> {
    let mut clean = reply.trim().to_string();
    if clean.contains("```") {
        clean = strip_fences(&clean);
    }

    let span = match (clean.find('{'), clean.rfind('}')) {
        (Some(start), Some(end)) if start < end => &clean[start..=end],
        _ => return Err(invalid_json("no JSON object found in reply")),
    };

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid_json("reply is not a JSON object")),
        Err(e) => Err(invalid_json(&e.to_string())),
    }
}

/// Clean a single-field reply down to the bare value.
pub fn parse_field_reply(reply: &str) -> String {
    let trimmed = reply.trim();
    let unquoted = if trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed.get(1..trimmed.len().saturating_sub(1)).unwrap_or_default()
    } else {
        trimmed
    };

    match serde_json::from_str::<Value>(unquoted) {
        Ok(Value::String(decoded)) => decoded,
        _ => unquoted.to_string(),
    }
}

/// Ask the AI backend for values for every field in `fields`.
///
/// # Errors
///
/// `InvalidInput` for an empty field list; `AiInvalidResponse` when the
/// reply holds no JSON object; AI transport errors as mapped by
/// [`crate::ai::AiError`].
pub async fn generate_form_data(client: &dyn ChatClient, fields: &[FormField]) -> Result<Map<String, Value>, Error> {
    if fields.is_empty() {
        return Err(Error::InvalidInput("at least one form field is required".to_string()));
    }

    tracing::debug!(fields = fields.len(), "requesting form data");
    let reply = client
        .complete(&form_fill_prompt(fields), Some(FORM_SYSTEM_PROMPT))
        .await
        .map_err(Error::from)?;

    parse_form_reply(&reply).inspect_err(|e| tracing::warn!(error = %e, reply = %reply, "unusable form data reply"))
}

/// Ask the AI backend for a value for one field.
pub async fn generate_field_value(client: &dyn ChatClient, field: &FormField) -> Result<String, Error> {
    let reply = client
        .complete(&field_value_prompt(field), Some(FIELD_SYSTEM_PROMPT))
        .await
        .map_err(Error::from)?;
    Ok(parse_field_reply(&reply))
}

fn invalid_json(reason: &str) -> Error {
    Error::AiInvalidResponse(format!("Invalid JSON response: {reason}"))
}

/// Remove ```` ``` ```` and ```` ```json ```` markers, each with one
/// trailing newline.
fn strip_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        rest = rest.strip_prefix("json").unwrap_or(rest);
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }
    out.push_str(rest);
    out
}
