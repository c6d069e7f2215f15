//! Application controller.
//!
//! [`App`] owns all mutable state. User input and completed requests arrive
//! as [`Action`]s; anything that needs I/O leaves as an [`Effect`], which the
//! runtime performs and feeds back as another action. The controller itself
//! never awaits, so the whole state machine is testable without a network.

use crate::client::{ApiClient, ApiError};
use crate::config::Config;
use crate::document::{Document, DocumentError};
use crate::summary::{HealthStatus, SummaryMode, SummaryResponse};
use std::path::PathBuf;
use std::sync::Arc;

/// Shown when a follow-up question fails.
pub const QUERY_FAILED_ALERT: &str = "Failed to get answer. Please try again.";

/// Coarse UI phase derived from the controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No document selected
    NoFile,
    /// Document selected, nothing to show yet
    Selected,
    /// At least one summarisation is in flight
    Summarizing,
    /// A summary (or an inline error) is displayed
    Ready,
}

/// Last known backend status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Health {
    #[default]
    Unknown,
    Online(String),
    Offline(String),
}

#[derive(Debug)]
pub enum Action {
    /// Read a file from disk, then select it
    OpenFile(PathBuf),
    SelectFile(Document),
    ChangeMode(SummaryMode),
    SubmitQuery(String),
    Reset,
    DismissAlert,
    CheckHealth,
    SaveSummary(PathBuf),
    SummaryFinished {
        generation: u64,
        result: Result<SummaryResponse, ApiError>,
    },
    FileOpened(Result<Document, DocumentError>),
    QueryFinished {
        generation: u64,
        revision: u64,
        question: String,
        result: Result<SummaryResponse, ApiError>,
    },
    HealthChecked(Result<HealthStatus, ApiError>),
    SummarySaved(Result<PathBuf, String>),
}

/// I/O requested by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Open(PathBuf),
    Summarize {
        generation: u64,
        document: Arc<Document>,
        mode: SummaryMode,
        max_length: Option<u32>,
    },
    Ask {
        generation: u64,
        revision: u64,
        question: String,
        text: String,
    },
    CheckHealth,
    Save {
        path: PathBuf,
        contents: String,
    },
}

impl Effect {
    /// Perform the effect and return the action reporting its outcome.
    pub async fn perform(self, client: &ApiClient) -> Action {
        match self {
            Effect::Open(path) => Action::FileOpened(Document::read(&path).await),
            Effect::Summarize {
                generation,
                document,
                mode,
                max_length,
            } => {
                let result = client.summarize_document(&document, mode, max_length).await;
                Action::SummaryFinished { generation, result }
            }
            Effect::Ask {
                generation,
                revision,
                question,
                text,
            } => {
                let result = client
                    .summarize_text(&text, SummaryMode::Concise, None)
                    .await;
                Action::QueryFinished {
                    generation,
                    revision,
                    question,
                    result,
                }
            }
            Effect::CheckHealth => Action::HealthChecked(client.health_check().await),
            Effect::Save { path, contents } => {
                let result = tokio::fs::write(&path, contents)
                    .await
                    .map(|_| path)
                    .map_err(|e| e.to_string());
                Action::SummarySaved(result)
            }
        }
    }
}

/// Text sent to the summarise endpoint to answer a question about `summary`.
pub fn query_prompt(summary: &str, question: &str) -> String {
    format!("Context: {}\n\nQuestion: {}", summary, question)
}

/// Block appended to the summary for an answered question.
pub fn qa_block(question: &str, answer: &str) -> String {
    format!("\n\n**Q&A Response for \"{}\":**\n{}", question, answer)
}

#[derive(Debug)]
pub struct App {
    document: Option<Arc<Document>>,
    mode: SummaryMode,
    summary: Option<String>,
    details: Option<SummaryResponse>,
    /// Summarisations in flight for the current generation
    pending: usize,
    querying: bool,
    alert: Option<String>,
    notice: Option<String>,
    /// A file is being read from disk
    opening: bool,
    open_error: Option<String>,
    health: Health,
    default_mode: SummaryMode,
    max_length: Option<u32>,
    /// Bumped whenever the active document changes
    generation: u64,
    /// Bumped whenever the displayed summary is cleared or replaced
    revision: u64,
}

impl Default for App {
    fn default() -> Self {
        Self::new(SummaryMode::default(), None)
    }
}

impl App {
    pub fn new(default_mode: SummaryMode, max_length: Option<u32>) -> Self {
        Self {
            document: None,
            mode: default_mode,
            summary: None,
            details: None,
            pending: 0,
            querying: false,
            alert: None,
            notice: None,
            opening: false,
            open_error: None,
            health: Health::Unknown,
            default_mode,
            max_length,
            generation: 0,
            revision: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.summary.mode, config.summary.max_length)
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_deref()
    }

    pub fn mode(&self) -> SummaryMode {
        self.mode
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Metrics of the last successful summarisation.
    pub fn details(&self) -> Option<&SummaryResponse> {
        self.details.as_ref()
    }

    pub fn is_summarizing(&self) -> bool {
        self.pending > 0
    }

    pub fn is_querying(&self) -> bool {
        self.querying
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_opening(&self) -> bool {
        self.opening
    }

    /// Why the last file could not be read. Taking it clears it.
    pub fn take_open_error(&mut self) -> Option<String> {
        self.open_error.take()
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn phase(&self) -> Phase {
        if self.document.is_none() {
            Phase::NoFile
        } else if self.is_summarizing() {
            Phase::Summarizing
        } else if self.summary.is_some() {
            Phase::Ready
        } else {
            Phase::Selected
        }
    }

    /// Whether a question may be submitted right now.
    pub fn can_query(&self) -> bool {
        self.summary.is_some() && !self.querying && !self.is_summarizing()
    }

    /// Apply an action, returning the effect it requires, if any.
    pub fn update(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::OpenFile(path) => {
                if self.opening || self.document.is_some() {
                    return None;
                }
                self.opening = true;
                self.open_error = None;
                Some(Effect::Open(path))
            }
            Action::FileOpened(result) => {
                if !std::mem::replace(&mut self.opening, false) {
                    log::debug!("dropping file read that is no longer wanted");
                    return None;
                }
                match result {
                    Ok(document) => self.select(document),
                    Err(e) => {
                        log::warn!("could not open file: {}", e);
                        self.open_error = Some(e.to_string());
                        None
                    }
                }
            }
            Action::SelectFile(document) => self.select(document),
            Action::ChangeMode(mode) => {
                self.mode = mode;
                if self.document.is_some() {
                    self.start_summary()
                } else {
                    None
                }
            }
            Action::SubmitQuery(question) => self.start_query(question),
            Action::Reset => {
                self.reset();
                None
            }
            Action::DismissAlert => {
                self.alert = None;
                None
            }
            Action::CheckHealth => Some(Effect::CheckHealth),
            Action::SaveSummary(path) => match &self.summary {
                Some(summary) => Some(Effect::Save {
                    path,
                    contents: format!("{}\n", summary),
                }),
                None => {
                    self.notice = Some("Nothing to save yet".to_string());
                    None
                }
            },
            Action::SummaryFinished { generation, result } => {
                self.finish_summary(generation, result);
                None
            }
            Action::QueryFinished {
                generation,
                revision,
                question,
                result,
            } => {
                self.finish_query(generation, revision, &question, result);
                None
            }
            Action::HealthChecked(result) => {
                self.health = match result {
                    Ok(status) if status.is_healthy() => Health::Online(status.service),
                    Ok(status) => Health::Offline(status.status),
                    Err(e) => Health::Offline(e.to_string()),
                };
                None
            }
            Action::SummarySaved(result) => {
                self.notice = Some(match result {
                    Ok(path) => format!("Saved summary to {}", path.display()),
                    Err(e) => format!("Failed to save summary: {}", e),
                });
                None
            }
        }
    }

    /// Apply `action` and perform the resulting effects one after another
    /// until the state settles. Used where nothing else competes for the
    /// controller, such as the line-oriented `ask` command.
    pub async fn settle(&mut self, client: &ApiClient, action: Action) {
        let mut next = self.update(action);
        while let Some(effect) = next {
            let outcome = effect.perform(client).await;
            next = self.update(outcome);
        }
    }

    fn select(&mut self, document: Document) -> Option<Effect> {
        log::info!("selected {:?}", document);
        self.generation += 1;
        self.document = Some(Arc::new(document));
        self.pending = 0;
        self.querying = false;
        self.opening = false;
        self.open_error = None;
        self.notice = None;
        self.start_summary()
    }

    fn start_summary(&mut self) -> Option<Effect> {
        let document = self.document.clone()?;
        self.pending += 1;
        self.revision += 1;
        self.summary = None;
        self.details = None;
        Some(Effect::Summarize {
            generation: self.generation,
            document,
            mode: self.mode,
            max_length: self.max_length,
        })
    }

    fn start_query(&mut self, question: String) -> Option<Effect> {
        let question = question.trim();
        if question.is_empty() || !self.can_query() {
            return None;
        }
        let text = query_prompt(self.summary.as_deref()?, question);
        self.querying = true;
        Some(Effect::Ask {
            generation: self.generation,
            revision: self.revision,
            question: question.to_string(),
            text,
        })
    }

    fn finish_summary(&mut self, generation: u64, result: Result<SummaryResponse, ApiError>) {
        if generation != self.generation || self.document.is_none() {
            log::debug!("dropping summary for stale generation {}", generation);
            return;
        }
        self.pending = self.pending.saturating_sub(1);
        self.revision += 1;
        match result {
            Ok(response) => {
                self.summary = Some(response.summary.clone());
                self.details = Some(response);
            }
            Err(e) => {
                log::warn!("summarization failed: {}", e);
                self.summary = Some(format!("Error: {}", e));
                self.details = None;
            }
        }
    }

    fn finish_query(
        &mut self,
        generation: u64,
        revision: u64,
        question: &str,
        result: Result<SummaryResponse, ApiError>,
    ) {
        if generation != self.generation || self.document.is_none() {
            log::debug!("dropping answer for stale generation {}", generation);
            return;
        }
        self.querying = false;
        if revision != self.revision {
            log::debug!("summary replaced before answer to {:?} arrived", question);
            return;
        }
        match result {
            Ok(response) => {
                if let Some(summary) = self.summary.as_mut() {
                    summary.push_str(&qa_block(question, &response.summary));
                }
            }
            Err(e) => {
                log::warn!("query failed: {}", e);
                self.alert = Some(QUERY_FAILED_ALERT.to_string());
            }
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.document = None;
        self.summary = None;
        self.details = None;
        self.pending = 0;
        self.querying = false;
        self.opening = false;
        self.open_error = None;
        self.alert = None;
        self.notice = None;
        self.mode = self.default_mode;
    }
}
