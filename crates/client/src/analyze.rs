//! Cache-aware page analysis and error diagnosis.
//!
//! [`PageAnalyzer::analyze`] fingerprints a snapshot, serves a stored
//! analysis when the same page content was analyzed before, and otherwise
//! asks the AI backend and records the reply in the history.

use std::sync::Arc;

use pagelens_core::error_log::{DIAGNOSIS_SYSTEM_PROMPT, diagnosis_prompt};
use pagelens_core::{EntrySource, Error, ErrorLog, HistoryEntry, HistoryStore, PageSnapshot, SaveRequest, normalize_url};
use serde::Serialize;
use serde_json::Value;

use crate::ai::{ChatClient, response::unwrap_completion};

/// System prompt for page analysis requests.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a page content analysis assistant. Keep answers concise and clear.";

/// Build the user prompt asking for a summary of `page`.
pub fn analysis_prompt(page: &PageSnapshot) -> Result<String, Error> {
    let page_json = serde_json::to_string(page)?;
    Ok(format!("Analyze the content of this page and summarize the key points: {page_json}"))
}

/// Result of [`PageAnalyzer::analyze`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    /// The stored entry; absent when nothing could be written.
    pub entry: Option<HistoryEntry>,
    pub analysis_text: String,
    pub signature: String,
    /// True when the analysis came from history without an AI call.
    pub cached: bool,
}

/// Runs page analyses against a chat backend with the history as a cache.
#[derive(Clone)]
pub struct PageAnalyzer {
    client: Arc<dyn ChatClient>,
    history: HistoryStore,
}

impl PageAnalyzer {
    pub fn new(client: Arc<dyn ChatClient>, history: HistoryStore) -> Self {
        Self { client, history }
    }

    pub fn client(&self) -> &dyn ChatClient {
        self.client.as_ref()
    }

    /// Analyze `page`, reusing a stored analysis unless `force_refresh`.
    ///
    /// `url` falls back to the snapshot's URL. Fresh analyses are saved with
    /// source `ai`, forced ones with `manual-refresh`. A failure to save is
    /// logged and leaves `entry` empty.
    pub async fn analyze(&self, url: &str, page: &PageSnapshot, force_refresh: bool) -> Result<AnalysisOutcome, Error> {
        let url = if url.is_empty() { page.url.as_str() } else { url };
        if url.is_empty() {
            return Err(Error::InvalidInput("a page URL is required".to_string()));
        }

        let normalized_url = normalize_url(url);
        let signature = self.history.compute_signature(page, &normalized_url)?.to_string();

        if !force_refresh {
            if let Some(entry) = self.history.find_by_signature(url, &signature).await {
                tracing::debug!(url = %normalized_url, %signature, "analysis served from history");
                return Ok(AnalysisOutcome {
                    analysis_text: entry.analysis_text.clone(),
                    entry: Some(entry),
                    signature,
                    cached: true,
                });
            }
        }

        tracing::info!(url = %normalized_url, force_refresh, "requesting page analysis");
        let prompt = analysis_prompt(page)?;
        let reply = self
            .client
            .complete(&prompt, Some(ANALYSIS_SYSTEM_PROMPT))
            .await
            .map_err(Error::from)?;
        let analysis_text = unwrap_completion(&reply);

        let source = if force_refresh { EntrySource::ManualRefresh } else { EntrySource::Ai };
        let request = SaveRequest {
            url: Some(url.to_string()),
            page_data: Some(page.clone()),
            analysis_text: Value::String(analysis_text.clone()),
            page_signature: Some(signature.clone()),
            source,
            cache_key: Some(signature.clone()),
        };

        let entry = match self.history.save_analysis_entry(request).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save analysis to history");
                None
            }
        };

        Ok(AnalysisOutcome { entry, analysis_text, signature, cached: false })
    }
}

/// Ask the AI backend to diagnose the stored error `id` and attach the
/// answer to it.
///
/// # Errors
///
/// `ErrorNotFound` when no error with that id is stored; AI errors as mapped by
/// [`crate::ai::AiError`].
pub async fn diagnose_error(client: &dyn ChatClient, log: &ErrorLog, id: &str) -> Result<String, Error> {
    let error = log
        .get(id)
        .await?
        .ok_or_else(|| Error::ErrorNotFound(format!("no captured error with id {id}")))?;

    let analysis = client
        .complete(&diagnosis_prompt(&error), Some(DIAGNOSIS_SYSTEM_PROMPT))
        .await
        .map_err(Error::from)?;

    if !log.update_analysis(id, &analysis).await? {
        tracing::warn!(id, "captured error disappeared before its diagnosis was stored");
    }
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use async_trait::async_trait;
    use pagelens_core::{CapturedError, MemoryStore};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with canned answers in order and records the prompts.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<Vec<Result<String, AiError>>>,
        prompts: Mutex<Vec<(String, Option<String>)>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn replying(replies: Vec<Result<String, AiError>>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies), ..Default::default() })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), system_prompt.map(str::to_string)));
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() { Ok("default reply".to_string()) } else { replies.remove(0) }
        }
    }

    fn memory_history() -> HistoryStore {
        HistoryStore::new(Some(Arc::new(MemoryStore::new())), Some(Arc::new(MemoryStore::new())))
    }

    fn page() -> PageSnapshot {
        PageSnapshot {
            url: "https://example.com/article/".into(),
            title: "Article".into(),
            content: "Body text".into(),
            language: "en".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let client = ScriptedClient::replying(vec![Ok("First summary".into())]);
        let analyzer = PageAnalyzer::new(client.clone(), memory_history());

        let first = analyzer.analyze("https://example.com/article/", &page(), false).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.analysis_text, "First summary");
        let entry = first.entry.unwrap();
        assert_eq!(entry.source, EntrySource::Ai);
        assert_eq!(entry.page_signature, first.signature);
        assert_eq!(entry.normalized_url, "https://example.com/article");

        let second = analyzer.analyze("https://example.com/article", &page(), false).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.analysis_text, "First summary");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_calls_ai() {
        let client = ScriptedClient::replying(vec![Ok("old".into()), Ok("new".into())]);
        let history = memory_history();
        let analyzer = PageAnalyzer::new(client.clone(), history.clone());

        analyzer.analyze("https://example.com/article", &page(), false).await.unwrap();
        let refreshed = analyzer.analyze("https://example.com/article", &page(), true).await.unwrap();

        assert!(!refreshed.cached);
        assert_eq!(refreshed.analysis_text, "new");
        assert_eq!(client.calls(), 2);

        let entries = history.get_history().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, EntrySource::ManualRefresh);
        assert_eq!(entries[0].analysis_text, "new");
    }

    #[tokio::test]
    async fn test_changed_content_misses() {
        let client = ScriptedClient::replying(vec![]);
        let analyzer = PageAnalyzer::new(client.clone(), memory_history());

        analyzer.analyze("", &page(), false).await.unwrap();
        let changed = PageSnapshot { content: "Edited body".into(), ..page() };
        let outcome = analyzer.analyze("", &changed, false).await.unwrap();

        assert!(!outcome.cached);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_prompt_and_unwrapped_reply() {
        let client = ScriptedClient::replying(vec![Ok(r#"{"choices":[{"message":{"content":"inner text"}}]}"#.into())]);
        let analyzer = PageAnalyzer::new(client.clone(), memory_history());

        let outcome = analyzer.analyze("https://example.com/article", &page(), false).await.unwrap();
        assert_eq!(outcome.analysis_text, "inner text");

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].0.contains(r#""title":"Article""#));
        assert_eq!(prompts[0].1.as_deref(), Some(ANALYSIS_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_ai_failure_saves_nothing() {
        let client = ScriptedClient::replying(vec![Err(AiError::HttpError { status: 500, reason: "Internal Server Error".into() })]);
        let history = memory_history();
        let analyzer = PageAnalyzer::new(client, history.clone());

        let err = analyzer.analyze("https://example.com/article", &page(), false).await.unwrap_err();
        assert!(matches!(err, Error::AiHttpError(_)));
        assert!(history.get_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_without_storage() {
        let analyzer = PageAnalyzer::new(ScriptedClient::replying(vec![]), HistoryStore::detached());
        let outcome = analyzer.analyze("https://example.com/article", &page(), false).await.unwrap();
        assert!(outcome.entry.is_none());
        assert_eq!(outcome.analysis_text, "default reply");
    }

    #[tokio::test]
    async fn test_analyze_requires_url() {
        let analyzer = PageAnalyzer::new(ScriptedClient::replying(vec![]), memory_history());
        let err = analyzer.analyze("", &PageSnapshot::default(), false).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_diagnose_error() {
        let log = ErrorLog::new(Some(Arc::new(MemoryStore::new())));
        let stored = log
            .store(CapturedError {
                kind: "error".into(),
                message: "x is not defined".into(),
                url: "https://example.com".into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        let client = ScriptedClient::replying(vec![Ok("Declare x first.".into())]);
        let analysis = diagnose_error(client.as_ref(), &log, &stored.id).await.unwrap();
        assert_eq!(analysis, "Declare x first.");

        let updated = log.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(updated.ai_analysis.as_deref(), Some("Declare x first."));

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].0.contains("x is not defined"));
        assert_eq!(prompts[0].1.as_deref(), Some(DIAGNOSIS_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_diagnose_unknown_error() {
        let log = ErrorLog::new(Some(Arc::new(MemoryStore::new())));
        let client = ScriptedClient::replying(vec![]);
        let err = diagnose_error(client.as_ref(), &log, "missing").await.unwrap_err();
        assert!(matches!(err, Error::ErrorNotFound(ref msg) if msg.contains("missing")));
        assert_eq!(client.calls(), 0);
    }
}
