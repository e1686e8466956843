//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    errors::{self, ErrorAnalyzeParams},
    form::{self, FormGenerateFieldParams, FormGenerateParams},
    history::{self, HistoryFindParams},
    page::{self, PageAnalyzeParams, PageSignatureParams},
};

use pagelens_client::{ChatClient, PageAnalyzer};
use pagelens_core::{CapturedError, ErrorLog, HistoryStore, SaveRequest};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for pagelens.
#[derive(Clone)]
pub struct PagelensServer {
    tool_router: ToolRouter<Self>,
    history: HistoryStore,
    errors: ErrorLog,
    client: Option<Arc<dyn ChatClient>>,
    analyzer: Option<PageAnalyzer>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PagelensServer {
    /// Create a new server handler.
    ///
    /// Without a chat client the AI-backed tools answer `AI_NOT_CONFIGURED`.
    pub fn new(history: HistoryStore, errors: ErrorLog, client: Option<Arc<dyn ChatClient>>) -> Self {
        let analyzer = client.clone().map(|client| PageAnalyzer::new(client, history.clone()));
        Self { tool_router: Self::tool_router(), history, errors, client, analyzer }
    }

    #[tool(description = "List stored page analyses, most recent first.")]
    async fn history_get(&self) -> Result<CallToolResult, McpError> {
        history::get_impl(&self.history).await
    }

    #[tool(description = "List the lightweight synced projection of the analysis history.")]
    async fn history_meta(&self) -> Result<CallToolResult, McpError> {
        history::meta_impl(&self.history).await
    }

    #[tool(description = "Remove all stored page analyses.")]
    async fn history_clear(&self) -> Result<CallToolResult, McpError> {
        history::clear_impl(&self.history).await
    }

    /// Save an analysis result.
    ///
    /// Replaces any entry with the same normalized URL and signature and
    /// moves it to the front of the history.
    #[tool(description = "Save a page analysis to the history. The entry is keyed by normalized URL and page signature.")]
    async fn history_save(&self, params: Parameters<SaveRequest>) -> Result<CallToolResult, McpError> {
        history::save_impl(&self.history, params.0).await
    }

    #[tool(description = "Find a stored analysis by page URL and signature. Returns null on a miss.")]
    async fn history_find(&self, params: Parameters<HistoryFindParams>) -> Result<CallToolResult, McpError> {
        history::find_impl(&self.history, params.0).await
    }

    #[tool(description = "Compute the normalized URL and content signature of a page snapshot.")]
    async fn page_signature(&self, params: Parameters<PageSignatureParams>) -> Result<CallToolResult, McpError> {
        page::signature_impl(&self.history, params.0)
    }

    /// Analyze a page with the configured AI provider.
    ///
    /// A stored analysis for the same content is returned without calling the
    /// provider unless `forceRefresh` is set.
    #[tool(description = "Summarize a page snapshot with the AI provider, reusing a stored analysis of identical content unless forceRefresh is set.")]
    async fn page_analyze(&self, params: Parameters<PageAnalyzeParams>) -> Result<CallToolResult, McpError> {
        page::analyze_impl(self.analyzer.as_ref(), params.0).await
    }

    #[tool(description = "Record a JavaScript error reported by a page.")]
    async fn error_capture(&self, params: Parameters<CapturedError>) -> Result<CallToolResult, McpError> {
        errors::capture_impl(&self.errors, params.0).await
    }

    #[tool(description = "List captured JavaScript errors, oldest first.")]
    async fn error_list(&self) -> Result<CallToolResult, McpError> {
        errors::list_impl(&self.errors).await
    }

    #[tool(description = "Remove all captured JavaScript errors.")]
    async fn error_clear(&self) -> Result<CallToolResult, McpError> {
        errors::clear_impl(&self.errors).await
    }

    #[tool(description = "Ask the AI provider to diagnose a captured error and store the diagnosis on it.")]
    async fn error_analyze(&self, params: Parameters<ErrorAnalyzeParams>) -> Result<CallToolResult, McpError> {
        errors::analyze_impl(self.client.as_deref(), &self.errors, params.0).await
    }

    #[tool(description = "Send a short test prompt to the configured AI provider.")]
    async fn ai_test_connection(&self) -> Result<CallToolResult, McpError> {
        errors::test_connection_impl(self.client.as_deref()).await
    }

    #[tool(description = "Generate realistic test values for a list of form fields. Returns an object keyed by field name.")]
    async fn form_generate(&self, params: Parameters<FormGenerateParams>) -> Result<CallToolResult, McpError> {
        form::generate_impl(self.client.as_deref(), params.0).await
    }

    #[tool(description = "Generate a realistic test value for a single form field.")]
    async fn form_generate_field(&self, params: Parameters<FormGenerateFieldParams>) -> Result<CallToolResult, McpError> {
        form::generate_field_impl(self.client.as_deref(), params.0).await
    }
}

impl ServerHandler for PagelensServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "pagelens".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
