//! Generation report - what the expander did and what went wrong

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ResourceRef;

/// Which generation protocol failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    /// Static generation, before scheduling
    Generate,
    /// Apply-time generation, right after the resource applied
    EvalGenerate,
}

impl GenerationPhase {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::EvalGenerate => "eval_generate",
        }
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// A generator failure attached to its resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub resource: ResourceRef,
    pub phase: GenerationPhase,
    pub message: String,
}

/// Summary of expansion work over a transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generator failures, in the order they happened
    pub failures: Vec<GenerationFailure>,
    /// Resources newly added to the catalog
    pub generated: usize,
    /// Sentinels created by apply-time generation
    pub sentinels: usize,
    /// Edges skipped because the reverse edge already existed
    pub skipped_edges: usize,
}

impl GenerationReport {
    /// Whether every generator call succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures attributed to one resource
    pub fn failures_for<'a>(
        &'a self,
        resource: &ResourceRef,
    ) -> impl Iterator<Item = &'a GenerationFailure> + use<'a> {
        let resource = resource.clone();
        self.failures.iter().filter(move |f| f.resource == resource)
    }

    pub fn add_failure(&mut self, resource: ResourceRef, phase: GenerationPhase, message: String) {
        self.failures.push(GenerationFailure {
            resource,
            phase,
            message,
        });
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: &GenerationReport) {
        self.failures.extend(other.failures.iter().cloned());
        self.generated += other.generated;
        self.sentinels += other.sentinels;
        self.skipped_edges += other.skipped_edges;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_for() {
        let a = ResourceRef::new("file", "/a");
        let b = ResourceRef::new("file", "/b");
        let mut report = GenerationReport::default();
        assert!(report.is_success());

        report.add_failure(a.clone(), GenerationPhase::Generate, "boom".into());
        report.add_failure(b.clone(), GenerationPhase::EvalGenerate, "bang".into());
        report.add_failure(a.clone(), GenerationPhase::EvalGenerate, "again".into());

        assert!(!report.is_success());
        assert_eq!(report.failures_for(&a).count(), 2);
        assert_eq!(
            report.failures_for(&b).next().map(|f| f.phase),
            Some(GenerationPhase::EvalGenerate)
        );
    }

    #[test]
    fn test_merge() {
        let mut total = GenerationReport {
            generated: 2,
            ..Default::default()
        };
        let mut other = GenerationReport {
            generated: 3,
            sentinels: 1,
            skipped_edges: 4,
            ..Default::default()
        };
        other.add_failure(
            ResourceRef::new("file", "/a"),
            GenerationPhase::Generate,
            "boom".into(),
        );
        total.merge(&other);
        assert_eq!(total.generated, 5);
        assert_eq!(total.sentinels, 1);
        assert_eq!(total.skipped_edges, 4);
        assert_eq!(total.failures.len(), 1);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut report = GenerationReport::default();
        report.add_failure(
            ResourceRef::new("file", "/a"),
            GenerationPhase::EvalGenerate,
            "boom".into(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failures"][0]["phase"], "eval_generate");
        assert_eq!(json["failures"][0]["resource"]["title"], "/a");
        assert_eq!(json["generated"], 0);
    }
}
