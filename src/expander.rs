//! Resource graph expander - splices generated resources into the catalog
//! and the relationship graph
//!
//! Resources can discover additional resources in two ways:
//!
//! - **Static generation** (`generate`), before execution ordering is final.
//!   Children are inserted next to their parent in the catalog and
//!   expanded in turn.
//! - **Apply-time generation** (`eval_generate`), right after the parent has
//!   been applied. Children are added to the graph behind a sentinel that
//!   stands for "the parent and everything it generated have completed",
//!   and whatever used to wait on the parent now waits on the sentinel.
//!
//! Generator failures never abort expansion. They are reported against the
//! offending resource and latch [`ResourceGraphExpander::has_generation_failures`],
//! which the transaction consults to decide whether to keep going.

use std::vec;

use crate::catalog::{Catalog, ResourceId};
use crate::config::ExpanderConfig;
use crate::context::{GenerationReporter, LogReporter};
use crate::error::{Error, Result};
use crate::graph::{RelationshipGraph, Sentinel, Vertex};
use crate::prioritizer::Prioritizer;
use crate::report::{GenerationPhase, GenerationReport};
use crate::resource::Resource;
use crate::types::{EdgeLabel, PriorityKey, RelationshipParam, Tags};

/// A generated resource after deduplication against the catalog
#[derive(Debug)]
enum Candidate {
    /// The catalog already holds a resource with this ref
    Existing(ResourceId),
    /// Not in the catalog yet, with a priority reserved for it if any
    Fresh {
        resource: Resource,
        priority: Option<PriorityKey>,
    },
}

/// Pending children of one static generation call
struct Frame {
    parent: ResourceId,
    pending: vec::IntoIter<Candidate>,
}

/// Expands a catalog with generated resources
///
/// The expander owns the catalog, the relationship graph (once attached)
/// and the prioritizer for the duration of a transaction. The transaction
/// calls [`expand`](Self::expand) for each resource before scheduling and
/// [`eval_expand`](Self::eval_expand) after each resource applies.
pub struct ResourceGraphExpander {
    catalog: Catalog,
    relationship_graph: Option<RelationshipGraph>,
    prioritizer: Box<dyn Prioritizer>,
    reporter: Box<dyn GenerationReporter>,
    config: ExpanderConfig,
    report: GenerationReport,
}

impl ResourceGraphExpander {
    /// Create an expander for a catalog, logging failures through `log`
    pub fn new(catalog: Catalog, prioritizer: Box<dyn Prioritizer>) -> Self {
        Self {
            catalog,
            relationship_graph: None,
            prioritizer,
            reporter: Box::new(LogReporter),
            config: ExpanderConfig::default(),
            report: GenerationReport::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn GenerationReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_config(mut self, config: ExpanderConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach the relationship graph once it has been built
    ///
    /// Without a graph, static generation records ordering as `before`
    /// metaparameters and apply-time generation is unavailable.
    pub fn attach_relationship_graph(&mut self, graph: RelationshipGraph) {
        self.relationship_graph = Some(graph);
    }

    /// Build the relationship graph from the current catalog and attach it
    pub fn build_relationship_graph(&mut self) -> &RelationshipGraph {
        let graph = RelationshipGraph::from_catalog(&self.catalog, self.prioritizer.as_mut());
        self.relationship_graph.insert(graph)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn relationship_graph(&self) -> Option<&RelationshipGraph> {
        self.relationship_graph.as_ref()
    }

    pub fn relationship_graph_mut(&mut self) -> Option<&mut RelationshipGraph> {
        self.relationship_graph.as_mut()
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    /// Whether any generator has failed so far; never resets
    pub fn has_generation_failures(&self) -> bool {
        !self.report.is_success()
    }

    /// Hand back the catalog, the graph and the report
    pub fn into_parts(self) -> (Catalog, Option<RelationshipGraph>, GenerationReport) {
        (self.catalog, self.relationship_graph, self.report)
    }

    // ------------------------------------------------------------------
    // Static generation
    // ------------------------------------------------------------------

    /// Run static generation for `resource` and everything it generates
    ///
    /// Children are visited depth-first in declared order, the same order
    /// a recursive walk would use, but with an explicit stack. A resource
    /// that is already being expanded further up is not expanded again.
    pub fn expand(&mut self, resource: ResourceId) {
        let mut stack: Vec<Frame> = Vec::new();
        if let Some(frame) = self.generate_frame(resource) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let Some(candidate) = frame.pending.next() else {
                stack.pop();
                continue;
            };
            let parent = frame.parent;

            let child = self.add_resource(candidate, parent);
            if child == parent {
                log::debug!("{}: generated itself, ignoring", self.describe(parent.into()));
                continue;
            }
            self.add_generated_edge(parent, child);

            if stack.iter().any(|f| f.parent == child) {
                log::debug!(
                    "{}: already being expanded, not generating again",
                    self.describe(child.into())
                );
                continue;
            }
            if let Some(frame) = self.generate_frame(child) {
                stack.push(frame);
            }
        }
    }

    /// Call `generate` on a resource and queue its children
    fn generate_frame(&mut self, id: ResourceId) -> Option<Frame> {
        let resource = self.catalog.get(id);
        if !resource.supports_generate() {
            return None;
        }
        let depth_first = resource.is_depth_first();

        let outcome = match resource.generator() {
            Some(generator) => generator.generate(resource),
            None => return None,
        };
        let generated = match outcome {
            Ok(generated) => generated.into_vec(),
            Err(e) => {
                self.record_failure(id, GenerationPhase::Generate, &e);
                return None;
            }
        };
        if generated.is_empty() {
            return None;
        }

        log::debug!(
            "{}: generate produced {} resources",
            self.describe(id.into()),
            generated.len()
        );

        let mut candidates = self.deduplicate(generated);
        if self.relationship_graph.is_some() {
            // Keys follow declared order even when insertion runs backwards
            for candidate in &mut candidates {
                if let Candidate::Fresh { priority, .. } = candidate {
                    *priority = Some(self.prioritizer.next_priority_in(id.into()));
                }
            }
        }
        // Each child lands right after the parent, so splice last-to-first
        if !depth_first {
            candidates.reverse();
        }

        Some(Frame {
            parent: id,
            pending: candidates.into_iter(),
        })
    }

    /// Order a statically generated child relative to its parent
    ///
    /// Children of a depth-first parent run before it; all others run
    /// after. Nothing is added if either resource already names the other
    /// in any relationship metaparameter.
    fn add_generated_edge(&mut self, parent: ResourceId, child: ResourceId) {
        let parent_resource = self.catalog.get(parent);
        let child_resource = self.catalog.get(child);

        if parent_resource.references_any(child_resource.reference())
            || child_resource.references_any(parent_resource.reference())
        {
            log::debug!(
                "{}: already related to {}, not adding an automatic relationship",
                parent_resource.reference(),
                child_resource.reference()
            );
            return;
        }

        if self.relationship_graph.is_some() {
            self.add_conditional_edge(parent.into(), child.into(), None);
            return;
        }

        let (source, target) = if parent_resource.is_depth_first() {
            (child, parent)
        } else {
            (parent, child)
        };
        let target_ref = self.catalog.get(target).reference().clone();
        self.catalog
            .get_mut(source)
            .add_relationship(RelationshipParam::Before, target_ref);
    }

    // ------------------------------------------------------------------
    // Apply-time generation
    // ------------------------------------------------------------------

    /// Run apply-time generation for a resource that has just been applied
    ///
    /// Returns `Ok(true)` if resources were added. A failing generator is
    /// reported and yields `Ok(false)`.
    ///
    /// # Errors
    /// Depth-first resources and a missing relationship graph are
    /// contract violations; both are returned before anything is touched.
    pub fn eval_expand(&mut self, id: ResourceId) -> Result<bool> {
        let resource = self.catalog.get(id);
        if !resource.supports_eval_generate() {
            return Ok(false);
        }
        if resource.is_depth_first() {
            return Err(Error::DepthFirstEvalGenerate {
                resource: resource.reference().clone(),
            });
        }
        if self.relationship_graph.is_none() {
            return Err(Error::MissingRelationshipGraph {
                resource: resource.reference().clone(),
            });
        }

        let outcome = match resource.generator() {
            Some(generator) => generator.eval_generate(resource),
            None => Ok(Vec::new()),
        };
        let generated = match outcome {
            Ok(generated) => generated,
            Err(e) => {
                self.record_failure(id, GenerationPhase::EvalGenerate, &e);
                return Ok(false);
            }
        };
        if generated.is_empty() {
            return Ok(false);
        }

        let mut made: Vec<ResourceId> = Vec::with_capacity(generated.len());
        for candidate in self.deduplicate(generated) {
            let child = self.add_resource(candidate, id);
            if child != id && !made.contains(&child) {
                made.push(child);
            }
        }
        if made.is_empty() {
            return Ok(false);
        }

        log::debug!(
            "{}: eval_generate produced {} resources",
            self.describe(id.into()),
            made.len()
        );

        self.contain_generated_resources(id, &made);
        self.connect_to_ancestors(id, &made);
        Ok(true)
    }

    /// Put a sentinel behind the generated resources and move the parent's
    /// outgoing edges onto it
    fn contain_generated_resources(&mut self, parent: ResourceId, made: &[ResourceId]) {
        let resource = self.catalog.get(parent);
        let mut tags = Tags::new();
        tags.merge_except(resource.tags(), resource.type_tag());
        let sentinel = Sentinel {
            name: self.config.sentinel_name(resource.title()),
            tags,
        };

        let Some(graph) = self.relationship_graph.as_mut() else {
            return;
        };
        let sentinel = graph.add_sentinel(sentinel, None);
        let priority = self
            .prioritizer
            .priority_contained_in(parent.into(), sentinel);
        graph.add_vertex(sentinel, Some(priority));
        self.report.sentinels += 1;

        self.redirect_edges_to_sentinel(parent, sentinel, made);

        // Not complete until every generated resource has run
        for &child in made {
            self.add_conditional_edge(child.into(), sentinel, None);
        }

        // Lets the parent's events propagate past the sentinel
        self.add_conditional_edge(parent.into(), sentinel, None);
    }

    fn redirect_edges_to_sentinel(
        &mut self,
        parent: ResourceId,
        sentinel: Vertex,
        made: &[ResourceId],
    ) {
        let Some(graph) = self.relationship_graph.as_ref() else {
            return;
        };
        let edges = graph.adjacent_out(parent.into());

        for edge in edges {
            if edge
                .target
                .as_resource()
                .is_some_and(|target| made.contains(&target))
            {
                continue;
            }
            self.add_conditional_edge(sentinel, edge.target, edge.label.clone());
            if let Some(graph) = self.relationship_graph.as_mut() {
                graph.remove_edge(&edge);
            }
        }
    }

    /// Order each generated resource after its nearest generated ancestor,
    /// falling back to the parent
    fn connect_to_ancestors(&mut self, parent: ResourceId, made: &[ResourceId]) {
        for &child in made {
            let ancestor = self
                .catalog
                .get(child)
                .ancestors()
                .iter()
                .filter_map(|a| self.catalog.resource(a))
                .find(|a| *a != child && made.contains(a))
                .unwrap_or(parent);

            self.add_conditional_edge(ancestor.into(), child.into(), None);
        }
    }

    // ------------------------------------------------------------------
    // Shared splicing
    // ------------------------------------------------------------------

    fn deduplicate(&self, generated: Vec<Resource>) -> Vec<Candidate> {
        generated
            .into_iter()
            .map(|resource| match self.catalog.resource(resource.reference()) {
                Some(existing) => Candidate::Existing(existing),
                None => Candidate::Fresh {
                    resource,
                    priority: None,
                },
            })
            .collect()
    }

    /// Insert a generated resource next to its parent
    ///
    /// Resources already in the catalog keep their position and tags; the
    /// existing id is returned.
    fn add_resource(&mut self, candidate: Candidate, parent: ResourceId) -> ResourceId {
        let (mut resource, reserved) = match candidate {
            Candidate::Existing(id) => return id,
            Candidate::Fresh { resource, priority } => (resource, priority),
        };
        // An earlier sibling or its descendants may have added it since
        if let Some(existing) = self.catalog.resource(resource.reference()) {
            return existing;
        }

        let parent_resource = self.catalog.get(parent);
        resource.merge_tags_from(parent_resource);
        let id = if parent_resource.is_depth_first() {
            self.catalog.insert_before(parent, resource)
        } else {
            self.catalog.insert_after(parent, resource)
        };
        if let Some(container) = self.catalog.container_of(parent) {
            self.catalog.add_containment_edge(container, id);
        }

        if let Some(graph) = self.relationship_graph.as_mut() {
            let priority = match reserved {
                Some(key) => {
                    self.prioritizer.assign_priority(id.into(), key.clone());
                    key
                }
                None => self.prioritizer.priority_contained_in(parent.into(), id.into()),
            };
            graph.add_vertex(id.into(), Some(priority));
        }

        self.report.generated += 1;
        log::trace!(
            "{}: added generated {}",
            self.catalog.get(parent).reference(),
            self.catalog.get(id).reference()
        );
        id
    }

    /// Add `parent → child` (`child → parent` for depth-first parents)
    /// unless the reverse edge exists
    ///
    /// Every edge this expander creates goes through here.
    fn add_conditional_edge(&mut self, parent: Vertex, child: Vertex, label: Option<EdgeLabel>) {
        let depth_first = self.is_depth_first(parent);
        let (source, target) = if depth_first {
            (child, parent)
        } else {
            (parent, child)
        };

        let skipped = {
            let Some(graph) = self.relationship_graph.as_mut() else {
                return;
            };
            graph.add_vertex(child, None);
            if graph.edge_exists(target, source) {
                true
            } else {
                graph.add_edge(source, target, label);
                false
            }
        };

        if skipped {
            log::debug!(
                "{}: Skipping automatic relationship to {}",
                self.describe(parent),
                self.describe(child)
            );
            self.report.skipped_edges += 1;
        }
    }

    fn is_depth_first(&self, vertex: Vertex) -> bool {
        vertex
            .as_resource()
            .is_some_and(|id| self.catalog.get(id).is_depth_first())
    }

    fn describe(&self, vertex: Vertex) -> String {
        match vertex {
            Vertex::Resource(id) => self.catalog.get(id).reference().to_string(),
            Vertex::Sentinel(id) => match &self.relationship_graph {
                Some(graph) => format!("Sentinel[{}]", graph.sentinel(id).name),
                None => "Sentinel[?]".to_string(),
            },
        }
    }

    fn record_failure(&mut self, id: ResourceId, phase: GenerationPhase, error: &anyhow::Error) {
        let reference = self.catalog.get(id).reference().clone();
        let message = format!("Failed to generate additional resources using '{phase}': {error}");
        self.reporter.log_exception(&reference, error, &message);
        self.report.add_failure(reference, phase, message);
    }
}
