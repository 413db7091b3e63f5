//! Resource model consumed by the expander
//!
//! A Resource is identified by its [`ResourceRef`], carries tags, ordering
//! metaparameters and, optionally, a [`Generator`] that can discover more
//! resources either before scheduling (`generate`) or right after the
//! resource has been applied (`eval_generate`).

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{RelationshipParam, ResourceRef, Tags};

/// Output of a static generation callback
#[derive(Debug, Default)]
pub enum Generated {
    /// Nothing was generated
    #[default]
    None,
    /// A single resource
    One(Resource),
    /// An ordered sequence of resources
    Many(Vec<Resource>),
}

impl Generated {
    /// Normalize into an ordered sequence
    pub fn into_vec(self) -> Vec<Resource> {
        match self {
            Self::None => Vec::new(),
            Self::One(resource) => vec![resource],
            Self::Many(resources) => resources,
        }
    }
}

impl From<Vec<Resource>> for Generated {
    fn from(resources: Vec<Resource>) -> Self {
        Self::Many(resources)
    }
}

impl From<Resource> for Generated {
    fn from(resource: Resource) -> Self {
        Self::One(resource)
    }
}

/// Generation callbacks supplied by a resource type
///
/// Implementations declare which protocols they support; the answer is
/// captured once, when the generator is attached to a resource.
///
/// # Example
///
/// ```ignore
/// use graft::{Generated, Generator, Resource};
///
/// #[derive(Debug)]
/// struct DirectoryListing { entries: Vec<String> }
///
/// impl Generator for DirectoryListing {
///     fn supports_eval_generate(&self) -> bool { true }
///
///     fn eval_generate(&self, parent: &Resource) -> anyhow::Result<Vec<Resource>> {
///         Ok(self
///             .entries
///             .iter()
///             .map(|e| {
///                 Resource::new("file", format!("{}/{e}", parent.reference().title()))
///                     .with_ancestors([parent.reference().clone()])
///             })
///             .collect())
///     }
/// }
/// ```
pub trait Generator: Send + Sync + fmt::Debug {
    /// Whether `generate` should be called during the static pass
    fn supports_generate(&self) -> bool {
        false
    }

    /// Whether `eval_generate` should be called after the resource applies
    fn supports_eval_generate(&self) -> bool {
        false
    }

    /// Produce additional resources before execution ordering is final
    fn generate(&self, _parent: &Resource) -> Result<Generated> {
        Ok(Generated::None)
    }

    /// Produce additional resources once the parent's effect is visible
    fn eval_generate(&self, _parent: &Resource) -> Result<Vec<Resource>> {
        Ok(Vec::new())
    }
}

/// Generation protocols a resource supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub generate: bool,
    pub eval_generate: bool,
}

/// A resource as seen by the catalog and the expander
#[derive(Debug, Clone)]
pub struct Resource {
    reference: ResourceRef,
    tags: Tags,
    ancestors: Vec<ResourceRef>,
    depth_first: bool,
    relationships: BTreeMap<RelationshipParam, Vec<ResourceRef>>,
    generator: Option<Arc<dyn Generator>>,
    capabilities: Capabilities,
}

impl Resource {
    /// Create a resource tagged with its type name and, when usable, its title
    pub fn new(type_name: impl Into<String>, title: impl Into<String>) -> Self {
        let reference = ResourceRef::new(type_name, title);
        let mut tags = Tags::new();
        for segment in reference.type_name().split("::") {
            tags.insert(segment);
        }
        tags.insert(reference.type_name());
        tags.insert(reference.title());

        Self {
            reference,
            tags,
            ancestors: Vec::new(),
            depth_first: false,
            relationships: BTreeMap::new(),
            generator: None,
            capabilities: Capabilities::default(),
        }
    }

    /// Mark this resource as depth-first: generated children run before it
    pub fn depth_first(mut self) -> Self {
        self.depth_first = true;
        self
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        for tag in tags {
            self.tags.insert(tag.as_ref());
        }
        self
    }

    /// Logical nesting, nearest ancestor first
    pub fn with_ancestors(mut self, ancestors: impl IntoIterator<Item = ResourceRef>) -> Self {
        self.ancestors = ancestors.into_iter().collect();
        self
    }

    pub fn with_relationship(mut self, param: RelationshipParam, target: ResourceRef) -> Self {
        self.add_relationship(param, target);
        self
    }

    /// Attach generation callbacks and resolve their capabilities
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.capabilities = Capabilities {
            generate: generator.supports_generate(),
            eval_generate: generator.supports_eval_generate(),
        };
        self.generator = Some(generator);
        self
    }

    pub fn reference(&self) -> &ResourceRef {
        &self.reference
    }

    pub fn title(&self) -> &str {
        self.reference.title()
    }

    /// The tag naming this resource's type
    pub fn type_tag(&self) -> &str {
        self.reference.type_name()
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn ancestors(&self) -> &[ResourceRef] {
        &self.ancestors
    }

    pub fn is_depth_first(&self) -> bool {
        self.depth_first
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn supports_generate(&self) -> bool {
        self.capabilities.generate
    }

    pub fn supports_eval_generate(&self) -> bool {
        self.capabilities.eval_generate
    }

    pub fn generator(&self) -> Option<&Arc<dyn Generator>> {
        self.generator.as_ref()
    }

    /// Refs declared under one metaparameter
    pub fn relationships(&self, param: RelationshipParam) -> &[ResourceRef] {
        self.relationships
            .get(&param)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `param` on this resource names `other`
    pub fn references(&self, param: RelationshipParam, other: &ResourceRef) -> bool {
        self.relationships(param).contains(other)
    }

    /// Whether any metaparameter on this resource names `other`
    pub fn references_any(&self, other: &ResourceRef) -> bool {
        RelationshipParam::ALL
            .iter()
            .any(|param| self.references(*param, other))
    }

    /// Record a relationship; returns false if it was already declared
    pub fn add_relationship(&mut self, param: RelationshipParam, target: ResourceRef) -> bool {
        let targets = self.relationships.entry(param).or_default();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        true
    }

    /// Copy all of `other`'s tags into this resource
    pub fn merge_tags_from(&mut self, other: &Resource) {
        self.tags.merge(other.tags());
    }
}
