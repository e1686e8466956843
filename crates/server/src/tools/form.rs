//! form_generate and form_generate_field tool implementations.
//!
//! The caller sends field descriptors collected from the page; filling
//! the inputs with the returned values stays on the caller's side.

use pagelens_client::{ChatClient, FormField, generate_field_value, generate_form_data};
use pagelens_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::json_result;

/// Parameters for the form_generate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FormGenerateParams {
    /// Fields to generate values for.
    pub fields: Vec<FormField>,
}

/// Output from the form_generate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FormGenerateOutput {
    /// Generated values keyed by field name.
    pub data: Map<String, Value>,
}

/// Parameters for the form_generate_field tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FormGenerateFieldParams {
    pub field: FormField,
}

/// Output from the form_generate_field tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FormGenerateFieldOutput {
    pub value: String,
}

pub async fn generate_impl(
    client: Option<&dyn ChatClient>, params: FormGenerateParams,
) -> Result<CallToolResult, McpError> {
    let client = client.ok_or(Error::AiNotConfigured)?;
    let data = generate_form_data(client, &params.fields).await?;
    json_result(&FormGenerateOutput { data })
}

pub async fn generate_field_impl(
    client: Option<&dyn ChatClient>, params: FormGenerateFieldParams,
) -> Result<CallToolResult, McpError> {
    let client = client.ok_or(Error::AiNotConfigured)?;
    let value = generate_field_value(client, &params.field).await?;
    json_result(&FormGenerateFieldOutput { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{ScriptedClient, parse_output};
    use serde_json::json;

    fn fields() -> Vec<FormField> {
        serde_json::from_value(json!([
            {"name": "email", "type": "email", "label": "Email", "required": true},
            {"name": "bio", "type": "textarea", "label": "About you"}
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_fenced_reply() {
        let client = ScriptedClient::replying(vec![
            "```json\n{\"email\": \"sam@example.com\", \"bio\": \"Hiker and reader.\"}\n```".into(),
        ]);
        let params = FormGenerateParams { fields: fields() };
        let output: FormGenerateOutput = parse_output(&generate_impl(Some(client.as_ref()), params).await.unwrap());

        assert_eq!(output.data["email"], json!("sam@example.com"));
        assert_eq!(output.data["bio"], json!("Hiker and reader."));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_reply_without_json() {
        let client = ScriptedClient::replying(vec!["Sorry, I can't do that.".into()]);
        let params = FormGenerateParams { fields: fields() };
        let err = generate_impl(Some(client.as_ref()), params).await.unwrap_err();
        assert_eq!(err.code.0, -32012);
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_fields() {
        let client = ScriptedClient::replying(vec![]);
        let err = generate_impl(Some(client.as_ref()), FormGenerateParams { fields: vec![] })
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_field_quoted_value() {
        let client = ScriptedClient::replying(vec!["\"sam@example.com\"\n".into()]);
        let params = FormGenerateFieldParams { field: fields().remove(0) };
        let output: FormGenerateFieldOutput =
            parse_output(&generate_field_impl(Some(client.as_ref()), params).await.unwrap());
        assert_eq!(output.value, "sam@example.com");
    }

    #[tokio::test]
    async fn test_form_tools_need_config() {
        let err = generate_impl(None, FormGenerateParams { fields: fields() }).await.unwrap_err();
        assert_eq!(err.code.0, -32010);

        let params = FormGenerateFieldParams { field: FormField::default() };
        assert_eq!(generate_field_impl(None, params).await.unwrap_err().code.0, -32010);
    }
}
