//! Catalog - the containment tree of resources
//!
//! Resources live in an arena and are addressed by [`ResourceId`]. The
//! catalog keeps three views over that arena:
//! - a `ref → id` index, so a ref resolves to at most one resource
//! - the application order, which insertion can splice into
//! - containment edges from a container to the resources it directly holds

use std::collections::HashMap;
use std::fmt;

use crate::resource::Resource;
use crate::types::ResourceRef;

/// Stable handle to a resource held by a [`Catalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(usize);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a newly inserted resource lands in the order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Append,
    Before(ResourceId),
    After(ResourceId),
}

/// Append-ordered collection of resources plus containment
#[derive(Debug, Default)]
pub struct Catalog {
    arena: Vec<Resource>,
    index: HashMap<ResourceRef, ResourceId>,
    order: Vec<ResourceId>,
    container: HashMap<ResourceId, ResourceId>,
    contents: HashMap<ResourceId, Vec<ResourceId>>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource
    ///
    /// If a resource with the same ref is already present, nothing changes
    /// and the existing id is returned.
    pub fn add(&mut self, resource: Resource) -> ResourceId {
        self.insert(resource, Placement::Append)
    }

    /// Insert a resource immediately before `anchor`
    pub fn insert_before(&mut self, anchor: ResourceId, resource: Resource) -> ResourceId {
        self.insert(resource, Placement::Before(anchor))
    }

    /// Insert a resource immediately after `anchor`
    pub fn insert_after(&mut self, anchor: ResourceId, resource: Resource) -> ResourceId {
        self.insert(resource, Placement::After(anchor))
    }

    fn insert(&mut self, resource: Resource, placement: Placement) -> ResourceId {
        if let Some(existing) = self.resource(resource.reference()) {
            return existing;
        }

        let id = ResourceId(self.arena.len());
        self.index.insert(resource.reference().clone(), id);
        self.arena.push(resource);

        let position = match placement {
            Placement::Append => None,
            Placement::Before(anchor) => self.position(anchor),
            Placement::After(anchor) => self.position(anchor).map(|p| p + 1),
        };
        match position {
            Some(p) => self.order.insert(p, id),
            None => self.order.push(id),
        }
        id
    }

    fn position(&self, id: ResourceId) -> Option<usize> {
        self.order.iter().position(|&o| o == id)
    }

    /// Look up a resource by ref
    pub fn resource(&self, reference: &ResourceRef) -> Option<ResourceId> {
        self.index.get(reference).copied()
    }

    /// Borrow a resource
    ///
    /// Ids are only handed out by this catalog, so an unknown id is a bug.
    pub fn get(&self, id: ResourceId) -> &Resource {
        &self.arena[id.0]
    }

    pub fn get_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.arena[id.0]
    }

    /// Record that `container` directly contains `resource`
    ///
    /// A resource has at most one container; a later edge replaces the
    /// earlier one.
    pub fn add_containment_edge(&mut self, container: ResourceId, resource: ResourceId) {
        if self.container.get(&resource) == Some(&container) {
            return;
        }
        if let Some(previous) = self.container.insert(resource, container)
            && let Some(siblings) = self.contents.get_mut(&previous)
        {
            siblings.retain(|&s| s != resource);
        }
        let contents = self.contents.entry(container).or_default();
        if !contents.contains(&resource) {
            contents.push(resource);
        }
    }

    /// The resource directly containing `resource`, if any
    pub fn container_of(&self, resource: ResourceId) -> Option<ResourceId> {
        self.container.get(&resource).copied()
    }

    /// Resources directly contained in `container`, in edge order
    pub fn contained_in(&self, container: ResourceId) -> &[ResourceId] {
        self.contents
            .get(&container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids in application order
    pub fn ordered(&self) -> &[ResourceId] {
        &self.order
    }

    /// Refs in application order
    pub fn refs_in_order(&self) -> Vec<ResourceRef> {
        self.order
            .iter()
            .map(|&id| self.get(id).reference().clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.order.iter().map(|&id| (id, self.get(id)))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(catalog: &Catalog) -> Vec<String> {
        catalog
            .iter()
            .map(|(_, r)| r.title().to_string())
            .collect()
    }

    #[test]
    fn test_add_and_lookup() {
        let mut catalog = Catalog::new();
        let a = catalog.add(Resource::new("file", "/a"));
        assert_eq!(catalog.resource(&ResourceRef::new("file", "/a")), Some(a));
        assert_eq!(catalog.resource(&ResourceRef::new("file", "/b")), None);
        assert_eq!(catalog.get(a).title(), "/a");
    }

    #[test]
    fn test_duplicate_ref_is_noop() {
        let mut catalog = Catalog::new();
        let a = catalog.add(Resource::new("file", "/a").with_tags(["first"]));
        let b = catalog.add(Resource::new("file", "/b"));
        let again = catalog.insert_after(b, Resource::new("file", "/a").with_tags(["second"]));

        assert_eq!(again, a);
        assert_eq!(catalog.len(), 2);
        assert_eq!(titles(&catalog), vec!["/a", "/b"]);
        assert!(catalog.get(a).tags().contains("first"));
        assert!(!catalog.get(a).tags().contains("second"));
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut catalog = Catalog::new();
        let a = catalog.add(Resource::new("file", "/a"));
        let c = catalog.add(Resource::new("file", "/c"));
        catalog.insert_after(a, Resource::new("file", "/b"));
        catalog.insert_before(a, Resource::new("file", "/0"));
        catalog.insert_after(c, Resource::new("file", "/d"));

        assert_eq!(titles(&catalog), vec!["/0", "/a", "/b", "/c", "/d"]);
    }

    #[test]
    fn test_containment() {
        let mut catalog = Catalog::new();
        let class = catalog.add(Resource::new("class", "web"));
        let other = catalog.add(Resource::new("class", "db"));
        let file = catalog.add(Resource::new("file", "/a"));

        assert_eq!(catalog.container_of(file), None);
        catalog.add_containment_edge(class, file);
        catalog.add_containment_edge(class, file);
        assert_eq!(catalog.container_of(file), Some(class));
        assert_eq!(catalog.contained_in(class), &[file]);

        catalog.add_containment_edge(other, file);
        assert_eq!(catalog.container_of(file), Some(other));
        assert!(catalog.contained_in(class).is_empty());
    }

    #[test]
    fn test_readding_containment_keeps_order() {
        let mut catalog = Catalog::new();
        let class = catalog.add(Resource::new("class", "web"));
        let a = catalog.add(Resource::new("file", "/a"));
        let b = catalog.add(Resource::new("file", "/b"));

        catalog.add_containment_edge(class, a);
        catalog.add_containment_edge(class, b);
        catalog.add_containment_edge(class, a);

        assert_eq!(catalog.contained_in(class), &[a, b]);
        assert_eq!(catalog.container_of(a), Some(class));
    }
}
