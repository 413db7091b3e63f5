//! # Graft
//!
//! Resource graph expansion for declarative configuration management.
//!
//! While a catalog is being applied, some resources discover additional
//! resources: either up front (static generation) or only once their own
//! effect is visible (apply-time generation). This crate splices those
//! resources into the catalog's containment tree and into the relationship
//! graph that orders execution, preserving declared order, never creating
//! duplicates, and never closing a cycle.
//!
//! ## Core Concepts
//!
//! - **Catalog**: Arena of resources in application order, plus containment
//! - **RelationshipGraph**: "Must run before" edges over resources and sentinels
//! - **Generator**: Per-resource callbacks that produce more resources
//! - **ResourceGraphExpander**: Runs generators and splices their output
//!
//! ## Example
//!
//! ```ignore
//! use graft::{Catalog, ResourceGraphExpander, Resource, SequentialPrioritizer};
//! use std::sync::Arc;
//!
//! let mut catalog = Catalog::new();
//! let dir = catalog.add(Resource::new("file", "/srv/www").with_generator(Arc::new(Listing)));
//!
//! let mut expander = ResourceGraphExpander::new(catalog, Box::new(SequentialPrioritizer::new()));
//!
//! // Static pass, before scheduling
//! expander.expand(dir);
//! expander.build_relationship_graph();
//!
//! // After the transaction applies `dir`
//! expander.eval_expand(dir)?;
//! if expander.has_generation_failures() {
//!     // Decide whether to abort the transaction
//! }
//! ```
//!
//! ## Collaborator Traits
//!
//! - [`Generator`]: Generation callbacks supplied by a resource type
//! - [`Prioritizer`]: Tie-break ordering for graph vertices
//! - [`GenerationReporter`]: Receives generator failures

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod expander;
pub mod graph;
pub mod prioritizer;
pub mod report;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use catalog::{Catalog, ResourceId};
pub use config::ExpanderConfig;
pub use context::{GenerationReporter, LogReporter, NoReporter};
pub use error::{Error, Result};
pub use expander::ResourceGraphExpander;
pub use graph::{Edge, RelationshipGraph, Sentinel, SentinelId, Vertex};
pub use prioritizer::{Prioritizer, SequentialPrioritizer};
pub use report::{GenerationFailure, GenerationPhase, GenerationReport};
pub use resource::{Capabilities, Generated, Generator, Resource};
pub use types::{EdgeLabel, PriorityKey, RelationshipParam, ResourceRef, Tags, ALL_EVENTS};
