//! # goseal-engine
//!
//! Finds places where a struct is built or mutated outside the code paths
//! its owner allows.
//!
//! The pipeline for one unit is straight-line:
//!
//! ```text
//! Unit ─▶ scanner ─▶ Candidate ─▶ resolver ─▶ Site ─▶ policy ─▶ Decision ─▶ messages ─▶ Violation
//! ```
//!
//! Drivers call [`SealAnalyzer::analyze`]. The other modules are public so
//! that hosts can reuse individual stages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod messages;
pub mod policy;
pub mod resolver;
pub mod rules;
pub mod scanner;

pub use analyzer::{SealAnalyzer, UnitReport};
pub use policy::{decide, Decision};
pub use rules::RuleInfo;
pub use scanner::{Frame, Site, SiteKind};
