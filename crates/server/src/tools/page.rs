//! page_signature and page_analyze tool implementations.

use pagelens_client::{AnalysisOutcome, PageAnalyzer};
use pagelens_core::{Error, HistoryStore, PageSnapshot, normalize_url};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the page_signature tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageSignatureParams {
    /// Page URL; defaults to `pageData.url`.
    #[serde(default)]
    pub url: Option<String>,
    /// The scraped page snapshot.
    #[serde(default)]
    pub page_data: PageSnapshot,
}

/// Output from the page_signature tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageSignatureOutput {
    pub normalized_url: String,
    pub signature: String,
    /// True when the signature came from the non-cryptographic fallback hash.
    pub fallback: bool,
}

/// Parameters for the page_analyze tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalyzeParams {
    /// Page URL; defaults to `pageData.url`.
    #[serde(default)]
    pub url: Option<String>,
    /// The scraped page snapshot.
    pub page_data: PageSnapshot,
    /// Skip the history lookup and re-run the analysis.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Output from the page_analyze tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalyzeOutput {
    pub analysis_text: String,
    pub signature: String,
    /// True when served from history without calling the AI provider.
    pub cached: bool,
    pub entry: Option<pagelens_core::HistoryEntry>,
}

impl From<AnalysisOutcome> for PageAnalyzeOutput {
    fn from(outcome: AnalysisOutcome) -> Self {
        Self {
            analysis_text: outcome.analysis_text,
            signature: outcome.signature,
            cached: outcome.cached,
            entry: outcome.entry,
        }
    }
}

pub fn signature_impl(history: &HistoryStore, params: PageSignatureParams) -> Result<CallToolResult, McpError> {
    let url = params.url.as_deref().filter(|u| !u.is_empty()).unwrap_or(&params.page_data.url);
    let normalized_url = normalize_url(url);
    let signature = history.compute_signature(&params.page_data, &normalized_url)?;

    json_result(&PageSignatureOutput { fallback: signature.is_fallback(), signature: signature.to_string(), normalized_url })
}

pub async fn analyze_impl(
    analyzer: Option<&PageAnalyzer>, params: PageAnalyzeParams,
) -> Result<CallToolResult, McpError> {
    let analyzer = analyzer.ok_or(Error::AiNotConfigured)?;
    let url = params.url.as_deref().unwrap_or_default();

    let outcome = analyzer.analyze(url, &params.page_data, params.force_refresh).await?;
    json_result(&PageAnalyzeOutput::from(outcome))
}
