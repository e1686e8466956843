//! history_* tool implementations.
//!
//! Read, save, look up and clear the analysis history.

use pagelens_core::{HistoryEntry, HistoryMeta, HistoryStore, SaveRequest};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the history_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryGetOutput {
    /// Entries, most recent first.
    pub entries: Vec<HistoryEntry>,
}

/// Output from the history_meta tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryMetaOutput {
    pub meta: Vec<HistoryMeta>,
}

/// Output from the history_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryClearOutput {
    pub cleared: bool,
}

/// Output from the history_save tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistorySaveOutput {
    /// The stored entry; null when no storage is configured.
    pub entry: Option<HistoryEntry>,
}

/// Parameters for the history_find tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryFindParams {
    /// Page URL; normalized before matching.
    pub url: String,
    /// Page signature as returned by page_signature.
    pub signature: String,
}

/// Output from the history_find tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryFindOutput {
    /// The matching entry, or null on a miss.
    pub entry: Option<HistoryEntry>,
}

pub async fn get_impl(history: &HistoryStore) -> Result<CallToolResult, McpError> {
    json_result(&HistoryGetOutput { entries: history.get_history().await })
}

pub async fn meta_impl(history: &HistoryStore) -> Result<CallToolResult, McpError> {
    json_result(&HistoryMetaOutput { meta: history.get_history_meta().await })
}

pub async fn clear_impl(history: &HistoryStore) -> Result<CallToolResult, McpError> {
    history.clear_history().await?;
    json_result(&HistoryClearOutput { cleared: true })
}

pub async fn save_impl(history: &HistoryStore, params: SaveRequest) -> Result<CallToolResult, McpError> {
    let entry = history.save_analysis_entry(params).await?;
    json_result(&HistorySaveOutput { entry })
}

pub async fn find_impl(history: &HistoryStore, params: HistoryFindParams) -> Result<CallToolResult, McpError> {
    let entry = history.find_by_signature(&params.url, &params.signature).await;
    json_result(&HistoryFindOutput { entry })
}
