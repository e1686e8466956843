//! Client code for pagelens.
//!
//! This crate provides the AI chat-completion client, the cache-aware
//! page analyzer and form value generation shared by the server.

pub mod ai;
pub mod analyze;
pub mod form;

pub use ai::{AiError, ChatClient, HttpChatClient, test_connection};
pub use analyze::{AnalysisOutcome, PageAnalyzer, analysis_prompt, diagnose_error};
pub use form::{FormField, form_fill_prompt, generate_field_value, generate_form_data};
