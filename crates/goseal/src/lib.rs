//! # goseal
//!
//! Keeps struct construction and mutation inside the code that owns the
//! struct.
//!
//! This is the facade crate: it re-exports the core types and the engine,
//! and adds a multi-unit [`Runner`] plus a host [`plugin`] shim.
//!
//! ## Quick Start: `cargo test` Integration
//!
//! ```rust,ignore
//! // tests/seal.rs
//! #[test]
//! fn structs_stay_sealed() {
//!     let result = goseal::check_crate(env!("CARGO_MANIFEST_DIR"), goseal::SealConfig::default()).unwrap();
//!     assert!(!result.has_errors(), "{:#?}", result.violations);
//! }
//! ```
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use goseal::{config, Runner};
//! use goseal::frontend::CrateLoader;
//!
//! let config = config::load_file(".goseal.yml".as_ref())?;
//! let loaded = CrateLoader::new(".").load()?;
//! let result = Runner::new(config).parallel(true).run(&loaded.units);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use goseal_core::*;
pub use goseal_engine::{decide, Decision, RuleInfo, SealAnalyzer, UnitReport};

/// Engine stages and rule metadata.
pub mod engine {
    pub use goseal_engine::*;
}

/// The Rust source front-end.
pub mod frontend {
    pub use goseal_syn::*;
}

pub mod plugin;
mod runner;

pub use runner::{check_crate, Runner};
