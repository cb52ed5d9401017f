//! # lzbuild - Incremental C/C++ Builds
//!
//! lzbuild compiles a C/C++ project described by a small `.lzb` config file,
//! recompiling only the translation units whose sources or transitively
//! included headers changed since their object was written.
//!
//! ## Quick Start
//!
//! ```bash
//! lzb init        # src/, bin/, obj/ and default.lzb
//! lzb             # build
//! lzb -d          # show which units are stale
//! ```
//!
//! ## Module Organization
//!
//! - [`tokenizer`] - Pattern matchers and the rule-driven tokenizer
//! - [`dsl`] - Config language parser and evaluator
//! - [`config`] - Typed project configuration
//! - [`graph`] - Include graph and staleness queries
//! - [`build`] - Scheduler, linking and the build pass
//! - [`commands`] - `init` and `export` handlers

/// Build pass: file registry, scheduler, link step.
pub mod build;

/// Project setup and export commands.
pub mod commands;

/// Typed configuration projected from the DSL.
pub mod config;

/// The `.lzb` configuration language.
pub mod dsl;

/// Error types.
pub mod error;

/// Header include graph.
pub mod graph;

/// Library flag resolution through `pkg-config`.
pub mod pkg_config;

/// Per-user settings.
pub mod settings;

/// Pattern compiler and tokenizer.
pub mod tokenizer;

/// Terminal tables.
pub mod ui;
