//! Captured JavaScript errors.
//!
//! The error monitor reports page-level errors (uncaught exceptions,
//! unhandled promise rejections, `console.error` calls). They are kept in
//! the local namespace under `errorHistory`, oldest first, bounded to the
//! newest [`DEFAULT_ERROR_LIMIT`] entries, and can later carry an AI
//! diagnosis.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;
use crate::storage::KvStore;

pub const DEFAULT_ERROR_LIMIT: usize = 1000;
pub const ERROR_KEY: &str = "errorHistory";

/// One captured page error.
///
/// Fields the monitor sends beyond the known ones are kept in `extra` and
/// written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapturedError {
    #[serde(default)]
    pub id: String,
    /// `error`, `promise` or `console`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Page the error happened on.
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Unix millis when the error was stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bounded log of captured errors over the local namespace.
#[derive(Clone)]
pub struct ErrorLog {
    local: Option<Arc<dyn KvStore>>,
    limit: usize,
}

impl std::fmt::Debug for ErrorLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLog")
            .field("local", &self.local.is_some())
            .field("limit", &self.limit)
            .finish()
    }
}

impl ErrorLog {
    pub fn new(local: Option<Arc<dyn KvStore>>) -> Self {
        Self { local, limit: DEFAULT_ERROR_LIMIT }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Append `error`, stamping `storedAt` and an id if it has none.
    ///
    /// Returns the stored record, or `None` when there is no storage.
    pub async fn store(&self, mut error: CapturedError) -> Result<Option<CapturedError>, Error> {
        let Some(local) = &self.local else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp_millis();
        if error.id.is_empty() {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            error.id = format!("{now}{}", &suffix[..9]);
        }
        error.stored_at = Some(now);

        let mut errors = self.list().await?;
        errors.push(error.clone());
        if errors.len() > self.limit {
            let excess = errors.len() - self.limit;
            errors.drain(..excess);
        }

        local.set(ERROR_KEY, serde_json::to_value(&errors)?).await?;
        tracing::debug!(id = %error.id, kind = %error.kind, "captured error stored");
        Ok(Some(error))
    }

    /// All stored errors, oldest first.
    pub async fn list(&self) -> Result<Vec<CapturedError>, Error> {
        let Some(local) = &self.local else {
            return Ok(Vec::new());
        };
        match local.get(ERROR_KEY).await? {
            Some(value @ Value::Array(_)) => Ok(serde_json::from_value(value)?),
            Some(_) => {
                tracing::warn!("stored error history is not a list, ignoring");
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Look up one error by id.
    pub async fn get(&self, id: &str) -> Result<Option<CapturedError>, Error> {
        Ok(self.list().await?.into_iter().find(|e| e.id == id))
    }

    pub async fn clear(&self) -> Result<(), Error> {
        if let Some(local) = &self.local {
            local.remove(ERROR_KEY).await?;
        }
        Ok(())
    }

    /// Attach an AI diagnosis to the error with `id`.
    ///
    /// Returns false (and writes nothing) when no such error exists.
    pub async fn update_analysis(&self, id: &str, analysis: &str) -> Result<bool, Error> {
        let Some(local) = &self.local else {
            return Ok(false);
        };
        let mut errors = self.list().await?;
        let Some(error) = errors.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        error.ai_analysis = Some(analysis.to_string());
        local.set(ERROR_KEY, serde_json::to_value(&errors)?).await?;
        Ok(true)
    }
}

/// System prompt for error diagnosis requests.
pub const DIAGNOSIS_SYSTEM_PROMPT: &str =
    "You are a senior JavaScript developer who helps analyze and fix JavaScript errors.";

/// Build the user prompt asking for a diagnosis of `error`.
pub fn diagnosis_prompt(error: &CapturedError) -> String {
    let unknown = "unknown";
    let line = error.lineno.map_or_else(|| unknown.to_string(), |n| n.to_string());
    let col = error.colno.map_or_else(|| unknown.to_string(), |n| n.to_string());

    format!(
        "Analyze the following JavaScript error and explain its cause and how to fix it:\n\n\
         Error type: {kind}\n\
         Message: {message}\n\
         File: {file}\n\
         Location: {line}:{col}\n\
         Stack: {stack}\n\
         Page URL: {url}\n\
         User agent: {agent}\n\
         Time: {time}\n\n\
         Structure the answer as:\n\
         1. Error type and cause\n\
         2. Possible fixes\n\
         3. Prevention\n\
         4. Related advice\n\n\
         Keep it professional and practical.",
        kind = error.kind,
        message = error.message,
        file = error.filename.as_deref().unwrap_or(unknown),
        stack = error.stack.as_deref().unwrap_or("none"),
        url = error.url,
        agent = error.user_agent.as_deref().unwrap_or(unknown),
        time = error.timestamp.as_deref().unwrap_or(unknown),
    )
}
