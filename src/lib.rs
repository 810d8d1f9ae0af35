//! Core library for the stock-sync command line application.
//!
//! The library reconciles loosely named market-data exports and merges them
//! into one table keyed by ticker symbol and company name. File discovery
//! lives in [`resolve`], loading under [`io`], the per-table clean-up steps in
//! [`headers`], [`select`] and [`company`], the staged outer joins in
//! [`merge`], and the orchestration in [`pipeline`].

pub mod company;
pub mod config;
pub mod error;
pub mod headers;
pub mod io;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod select;
pub mod tidy;

pub use config::{PipelineConfig, Slot};
pub use error::{Result, ToolError};
pub use pipeline::{Pipeline, PipelineOutcome, run_pipeline};
