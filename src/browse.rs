//! Cycle-safe discovery of the reachable address space.
//!
//! The browser walks hierarchical references from a root node and records,
//! for every discovered node, its complete outgoing reference set. Discovery
//! is idempotent: a node is inserted before its children are scheduled, so a
//! reference cycle back to a discovered node terminates immediately.
//!
//! The walk is an explicit work-list over node identities — no call-stack
//! recursion, so arbitrarily deep or cyclic spaces cannot overflow.

use hashbrown::HashMap;
use tracing::warn;

use crate::model::{Node, NodeClass, NodeId, ReferenceDescriptor};
use crate::namespace::NamespaceTable;
use crate::transport::{BrowseOptions, Session};
use crate::Result;

// ============================================================================
// DiscoveredGraph
// ============================================================================

/// One discovered node with its full outgoing reference set.
#[derive(Debug, Clone)]
pub struct DiscoveredNode {
    pub node: Node,
    pub references: Vec<ReferenceDescriptor>,
}

/// Accumulator of one browse run: node identity → discovered node.
///
/// Every node reachable from the root appears exactly once; insertion is
/// check-and-insert, so revisiting an identity is a no-op.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredGraph {
    nodes: HashMap<NodeId, DiscoveredNode>,
}

impl DiscoveredGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the identity is already present. Returns whether the
    /// entry was inserted.
    pub fn insert_if_absent(&mut self, entry: DiscoveredNode) -> bool {
        match self.nodes.entry(entry.node.node_id.clone()) {
            hashbrown::hash_map::Entry::Occupied(_) => false,
            hashbrown::hash_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&DiscoveredNode> {
        self.nodes.get(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredNode> {
        self.nodes.values()
    }

    /// All discovered nodes of one class.
    pub fn by_class(&self, class: NodeClass) -> impl Iterator<Item = &DiscoveredNode> {
        self.nodes.values().filter(move |entry| entry.node.node_class() == class)
    }
}

// ============================================================================
// AddressSpaceBrowser
// ============================================================================

/// Discovers the full reachable node set over one session.
pub struct AddressSpaceBrowser<'a, S: Session + ?Sized> {
    session: &'a S,
    namespaces: &'a NamespaceTable,
}

impl<'a, S: Session + ?Sized> AddressSpaceBrowser<'a, S> {
    pub fn new(session: &'a S, namespaces: &'a NamespaceTable) -> Self {
        Self { session, namespaces }
    }

    /// Walk the space from `root`.
    ///
    /// The root must be readable — a failure there is fatal. Children that
    /// cannot be read or whose identity does not resolve are skipped with a
    /// diagnostic. Browse failures abort the run: a transport that cannot
    /// answer mid-walk leaves no way to produce a complete graph.
    pub async fn browse_from(&self, root: &NodeId) -> Result<DiscoveredGraph> {
        let mut graph = DiscoveredGraph::new();
        let root_node = self.session.read_node(root).await?;
        let mut pending: Vec<NodeId> = Vec::new();
        self.visit(root_node, &mut graph, &mut pending).await?;

        while let Some(node_id) = pending.pop() {
            if graph.contains(&node_id) {
                continue;
            }
            let node = match self.session.read_node(&node_id).await {
                Ok(node) => node,
                Err(error) => {
                    warn!(node = %node_id, %error, "unable to fetch node, skipping");
                    continue;
                }
            };
            self.visit(node, &mut graph, &mut pending).await?;
        }
        Ok(graph)
    }

    /// Record one node and schedule its hierarchical children.
    async fn visit(
        &self,
        node: Node,
        graph: &mut DiscoveredGraph,
        pending: &mut Vec<NodeId>,
    ) -> Result<()> {
        let node_id = node.node_id.clone();
        let references =
            self.session.browse(&node_id, &BrowseOptions::all_references()).await?;
        if !graph.insert_if_absent(DiscoveredNode { node, references }) {
            return Ok(());
        }

        let children = self.session.browse(&node_id, &BrowseOptions::hierarchical()).await?;
        for reference in &children {
            match self.namespaces.resolve(&reference.target) {
                Ok(target) => {
                    if !graph.contains(&target) {
                        pending.push(target);
                    }
                }
                Err(error) => {
                    warn!(source = %node_id, target = %reference.target, %error,
                        "unresolvable browse target, skipping");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassAttributes, QualifiedName};

    fn entry(id: u32) -> DiscoveredNode {
        DiscoveredNode {
            node: Node::new(
                NodeId::numeric(0, id),
                QualifiedName::new(0, format!("n{id}")),
                ClassAttributes::Object { event_notifier: 0 },
            ),
            references: Vec::new(),
        }
    }

    #[test]
    fn insert_if_absent_is_idempotent() {
        let mut graph = DiscoveredGraph::new();
        assert!(graph.insert_if_absent(entry(84)));
        assert!(!graph.insert_if_absent(entry(84)));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn by_class_filters() {
        let mut graph = DiscoveredGraph::new();
        graph.insert_if_absent(entry(1));
        graph.insert_if_absent(DiscoveredNode {
            node: Node::new(
                NodeId::numeric(0, 2),
                QualifiedName::new(0, "t"),
                ClassAttributes::ObjectType { is_abstract: false },
            ),
            references: Vec::new(),
        });

        assert_eq!(graph.by_class(NodeClass::Object).count(), 1);
        assert_eq!(graph.by_class(NodeClass::ObjectType).count(), 1);
        assert_eq!(graph.by_class(NodeClass::Variable).count(), 0);
    }
}
