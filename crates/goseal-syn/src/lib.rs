//! # goseal-syn
//!
//! Rust source front-end for goseal.
//!
//! Parses a crate with `syn`, builds a crate-wide symbol table, and lowers
//! every module into a [`goseal_core::ir::Unit`] whose package is the
//! module path (`crate::domain::user`). Struct declarations are sealed
//! aggregates; methods taking `self` have a receiver.
//!
//! ## Example
//!
//! ```ignore
//! use goseal_engine::SealAnalyzer;
//! use goseal_syn::CrateLoader;
//!
//! let loaded = CrateLoader::new("path/to/crate").load()?;
//! let analyzer = SealAnalyzer::default();
//! for unit in &loaded.units {
//!     for violation in analyzer.analyze(unit) {
//!         println!("{violation}");
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod comments;
mod error;
mod loader;
pub mod lower;
pub mod module_path;
pub mod symbols;
pub mod types;

pub use error::FrontendError;
pub use loader::{lower_sources, CrateLoader, LoadedCrate, SourceText};
