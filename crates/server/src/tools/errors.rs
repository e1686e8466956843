//! error_* and ai_test_connection tool implementations.
//!
//! The error monitor in the page reports JavaScript errors through
//! error_capture; error_analyze asks the AI provider for a diagnosis and
//! stores it on the captured record.

use pagelens_client::{ChatClient, diagnose_error, test_connection};
use pagelens_core::{CapturedError, Error, ErrorLog};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the error_capture tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorCaptureOutput {
    /// The stored record with its id; null when no storage is configured.
    pub error: Option<CapturedError>,
}

/// Output from the error_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorListOutput {
    /// Captured errors, oldest first.
    pub errors: Vec<CapturedError>,
}

/// Output from the error_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorClearOutput {
    pub cleared: bool,
}

/// Parameters for the error_analyze tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorAnalyzeParams {
    /// Id of a captured error, as returned by error_capture or error_list.
    pub id: String,
}

/// Output from the error_analyze tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorAnalyzeOutput {
    pub id: String,
    pub analysis: String,
}

/// Output from the ai_test_connection tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestConnectionOutput {
    pub ok: bool,
    /// The provider's reply.
    pub reply: String,
}

pub async fn capture_impl(log: &ErrorLog, params: CapturedError) -> Result<CallToolResult, McpError> {
    if params.message.is_empty() && params.kind.is_empty() {
        return Err(Error::InvalidInput("error type or message is required".into()).into());
    }
    let error = log.store(params).await?;
    json_result(&ErrorCaptureOutput { error })
}

pub async fn list_impl(log: &ErrorLog) -> Result<CallToolResult, McpError> {
    json_result(&ErrorListOutput { errors: log.list().await? })
}

pub async fn clear_impl(log: &ErrorLog) -> Result<CallToolResult, McpError> {
    log.clear().await?;
    json_result(&ErrorClearOutput { cleared: true })
}

pub async fn analyze_impl(
    client: Option<&dyn ChatClient>, log: &ErrorLog, params: ErrorAnalyzeParams,
) -> Result<CallToolResult, McpError> {
    let client = client.ok_or(Error::AiNotConfigured)?;
    let analysis = diagnose_error(client, log, &params.id).await?;
    json_result(&ErrorAnalyzeOutput { id: params.id, analysis })
}

pub async fn test_connection_impl(client: Option<&dyn ChatClient>) -> Result<CallToolResult, McpError> {
    let client = client.ok_or(Error::AiNotConfigured)?;
    let reply = test_connection(client).await.map_err(Error::from)?;
    json_result(&TestConnectionOutput { ok: true, reply })
}
