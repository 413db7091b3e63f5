//! Error types for resource graph expansion.
//!
//! Only contract violations and configuration problems are errors here.
//! A failing generator is recovered inside the expander and folded into
//! the [`GenerationReport`](crate::report::GenerationReport); duplicate
//! refs and would-be cycles are not errors at all.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ResourceRef;

/// Errors that can occur while expanding a catalog.
#[derive(Debug, Error)]
pub enum Error {
    /// Apply-time generation was requested for a depth-first resource.
    ///
    /// This is a bug in the calling transaction, not a data problem.
    #[error("depth-first resources are not supported by eval_generate: {resource}")]
    DepthFirstEvalGenerate {
        /// The offending resource
        resource: ResourceRef,
    },

    /// Apply-time generation needs a relationship graph to splice into.
    #[error("no relationship graph attached while eval-generating {resource}")]
    MissingRelationshipGraph {
        /// The resource being expanded
        resource: ResourceRef,
    },

    /// A resource reference string could not be parsed.
    #[error("invalid resource reference: {0}")]
    InvalidRef(String),

    /// Configuration file not found
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration syntax
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        /// File the configuration was read from
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error signals a programming error in the caller.
    ///
    /// The transaction must stop rather than apply a misordered graph.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::DepthFirstEvalGenerate { .. } | Self::MissingRelationshipGraph { .. }
        )
    }
}

/// Result type for expansion operations.
pub type Result<T> = std::result::Result<T, Error>;
