//! # goseal-core
//!
//! Core types shared by the goseal engine, its front-ends, and its drivers.
//!
//! This crate provides:
//!
//! - [`ir`]: the typed syntax tree a front-end hands to the engine
//! - [`PatternSet`]: ordered compiled regular expressions
//! - [`config`]: the seal policy (DTO, loader, validated [`SealConfig`])
//! - [`Violation`], [`LintResult`], and [`DiagnosticSink`] for findings
//!
//! ## Example
//!
//! ```ignore
//! use goseal_core::config;
//!
//! let config = config::load_file(".goseal.yml".as_ref())?;
//! assert_eq!(config.init_scope(), config::InitScope::SamePackage);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod ir;
mod pattern;
mod sink;
mod types;

pub use config::{ConfigError, SealConfig};
pub use pattern::{Pattern, PatternSet};
pub use sink::DiagnosticSink;
pub use types::{LintResult, Location, Severity, Suggestion, Violation, ViolationDiagnostic};
