//! Core types, errors, and configuration for the instance-routing injector.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`Config`] with its [`RoutingConfig`] and [`ScanConfig`] sections
//! - [`ConfigError`] for configuration loading and validation
//! - Domain types ([`Declaration`], [`ImportSpec`], [`HandlerSignature`],
//!   [`FileOutcome`])
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, RoutingConfig, ScanConfig};
pub use error::ConfigError;
pub use types::{
    Declaration, DeclarationKind, FileOutcome, HandlerShape, HandlerSignature, ImportClause,
    ImportKind, ImportSpec, SkipReason, SourceLocation, Span,
};

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;
