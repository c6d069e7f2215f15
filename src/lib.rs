//! # smartsum
//!
//! A terminal client for an AI document summarisation service.
//!
//! ## Features
//!
//! - **Three verbosity modes**: concise, balanced and comprehensive summaries
//! - **Follow-up questions**: answers are appended to the summary as Q&A blocks
//! - **Thin client**: text extraction and inference happen on the service; this
//!   crate only speaks its REST API

pub mod app;
pub mod client;
pub mod config;
pub mod document;
pub mod logging;
pub mod summary;
pub mod ui;

pub use app::App;
pub use client::{ApiClient, ApiError};
pub use config::Config;
pub use document::Document;
pub use summary::{SummaryMode, SummaryResponse};
