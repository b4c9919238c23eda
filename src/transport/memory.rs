//! In-memory address space.
//!
//! This is the reference implementation of the transport seam.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Limitations
//!
//! - **No wire protocol**: `discover_endpoints()` ignores the URL and
//!   returns whatever was registered; `connect()` performs no handshake.
//! - **Flat subtype knowledge**: reference types are hierarchical when
//!   registered as such — there is no full subtype lattice.
//!
//! Use this implementation for:
//! - Testing the browser, mappers, and assembler end to end
//! - Embedding a hand-built address space in applications

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ids, BrowseDirection, BrowseOptions, ConnectOptions, Session, Transport, TypeTree};
use crate::model::{
    ApplicationDescriptor, ApplicationType, EndpointDescriptor, LocalizedText,
    MessageSecurityMode, Node, NodeId, ReferenceDescriptor, UserTokenPolicy, WireType,
};
use crate::namespace::NamespaceTable;
use crate::transport::SecurityPolicy;
use crate::{Error, Result};

// ============================================================================
// MemoryTypeTree
// ============================================================================

/// Type-tree lookup backed by a registration map plus the builtin table.
///
/// Namespace-0 identities resolve through the builtin numeric ids; the
/// abstract numeric families normalize to a concrete representable kind.
#[derive(Debug, Default)]
pub struct MemoryTypeTree {
    overrides: RwLock<HashMap<NodeId, WireType>>,
}

impl MemoryTypeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the backing wire type of a (usually non-builtin) data type.
    pub fn register(&self, declared: NodeId, backing: WireType) {
        self.overrides.write().insert(declared, backing);
    }
}

impl TypeTree for MemoryTypeTree {
    fn backing_primitive_type(&self, declared: &NodeId) -> Result<WireType> {
        if let Some(backing) = self.overrides.read().get(declared) {
            return Ok(*backing);
        }
        if declared.namespace == 0 {
            if let crate::model::Identifier::Numeric(id) = declared.identifier {
                if let Some(tag) = WireType::from_builtin_id(id) {
                    return Ok(tag);
                }
                // Abstract numeric families back onto concrete kinds.
                match id {
                    26 => return Ok(WireType::Double),  // Number
                    27 => return Ok(WireType::Int64),   // Integer
                    28 => return Ok(WireType::UInt64),  // UInteger
                    29 => return Ok(WireType::Int32),   // Enumeration
                    _ => {}
                }
            }
        }
        Err(Error::UnsupportedType { type_id: declared.clone() })
    }
}

// ============================================================================
// MemoryAddressSpace
// ============================================================================

/// In-memory address space implementing [`Transport`] and handing out
/// sessions over shared state.
#[derive(Clone, Default)]
pub struct MemoryAddressSpace {
    inner: Arc<Inner>,
}

struct Inner {
    namespaces: RwLock<NamespaceTable>,
    nodes: RwLock<HashMap<NodeId, Node>>,
    references: RwLock<HashMap<NodeId, Vec<ReferenceDescriptor>>>,
    /// Reference types treated as hierarchical by the browse filter.
    hierarchical_kinds: RwLock<HashSet<NodeId>>,
    endpoints: RwLock<Vec<EndpointDescriptor>>,
    type_tree: Arc<MemoryTypeTree>,
}

impl Default for Inner {
    fn default() -> Self {
        let hierarchical = [
            ids::HIERARCHICAL_REFERENCES,
            ids::HAS_SUBTYPE,
            ids::ORGANIZES,
            ids::HAS_PROPERTY,
            ids::HAS_COMPONENT,
            ids::HAS_NOTIFIER,
        ];
        Self {
            namespaces: RwLock::new(NamespaceTable::new()),
            nodes: RwLock::new(HashMap::new()),
            references: RwLock::new(HashMap::new()),
            hierarchical_kinds: RwLock::new(hierarchical.into_iter().collect()),
            endpoints: RwLock::new(Vec::new()),
            type_tree: Arc::new(MemoryTypeTree::new()),
        }
    }
}

impl MemoryAddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a namespace URI, returning its index.
    pub fn push_namespace(&self, uri: impl Into<String>) -> u16 {
        self.inner.namespaces.write().push_uri(uri)
    }

    pub fn insert_node(&self, node: Node) {
        self.inner.nodes.write().insert(node.node_id.clone(), node);
    }

    /// Record one outgoing reference on `source`.
    pub fn add_reference(&self, source: &NodeId, reference: ReferenceDescriptor) {
        self.inner.references.write().entry(source.clone()).or_default().push(reference);
    }

    /// Record a forward reference from `source` to `target`.
    pub fn link(&self, source: &NodeId, reference_type: NodeId, target: &NodeId) {
        self.add_reference(source, ReferenceDescriptor::forward(reference_type, target.clone()));
    }

    /// Treat `reference_type` as hierarchical when filtering browse calls.
    pub fn register_hierarchical(&self, reference_type: NodeId) {
        self.inner.hierarchical_kinds.write().insert(reference_type);
    }

    pub fn register_endpoint(&self, endpoint: EndpointDescriptor) {
        self.inner.endpoints.write().push(endpoint);
    }

    /// Declare the backing wire type of a data type.
    pub fn register_backing(&self, declared: NodeId, backing: WireType) {
        self.inner.type_tree.register(declared, backing);
    }

    /// A plain unsecured endpoint descriptor for `url`, convenient for
    /// tests and embedding.
    pub fn sample_endpoint(url: impl Into<String>) -> EndpointDescriptor {
        let url = url.into();
        EndpointDescriptor {
            endpoint_url: url.clone(),
            server: ApplicationDescriptor {
                application_uri: format!("{url}/app"),
                product_uri: format!("{url}/product"),
                application_name: LocalizedText::new("en", "Memory Address Space"),
                application_type: ApplicationType::Server,
                gateway_server_uri: None,
                discovery_profile_uri: None,
                discovery_urls: vec![format!("{url}/discovery")],
            },
            server_certificate: Vec::new(),
            security_mode: MessageSecurityMode::None,
            security_policy_uri: SecurityPolicy::None.uri().to_owned(),
            user_identity_tokens: vec![UserTokenPolicy::anonymous("anonymous")],
            transport_profile_uri:
                "http://opcfoundation.org/UA-Profile/Transport/uatcp-uasc-uabinary".to_owned(),
            security_level: 0,
        }
    }
}

#[async_trait]
impl Transport for MemoryAddressSpace {
    type Session = MemorySession;

    async fn discover_endpoints(&self, _url: &str) -> Result<Vec<EndpointDescriptor>> {
        Ok(self.inner.endpoints.read().clone())
    }

    async fn connect(
        &self,
        endpoint: &EndpointDescriptor,
        options: &ConnectOptions,
    ) -> Result<Self::Session> {
        if endpoint.security_policy_uri != options.security_policy.uri() {
            return Err(Error::Transport(format!(
                "endpoint {} does not offer policy {}",
                endpoint.endpoint_url,
                options.security_policy.uri()
            )));
        }
        Ok(MemorySession { inner: Arc::clone(&self.inner) })
    }
}

// ============================================================================
// MemorySession
// ============================================================================

/// Session view over a [`MemoryAddressSpace`].
pub struct MemorySession {
    inner: Arc<Inner>,
}

impl MemorySession {
    fn reference_matches(&self, reference: &ReferenceDescriptor, options: &BrowseOptions) -> bool {
        let direction_ok = match options.direction {
            BrowseDirection::Forward => reference.is_forward,
            BrowseDirection::Inverse => !reference.is_forward,
            BrowseDirection::Both => true,
        };
        if !direction_ok {
            return false;
        }
        match &options.reference_type {
            None => true,
            Some(filter) if *filter == ids::REFERENCES && options.include_subtypes => true,
            Some(filter) if *filter == ids::HIERARCHICAL_REFERENCES && options.include_subtypes => {
                self.inner.hierarchical_kinds.read().contains(&reference.reference_type)
            }
            Some(filter) => reference.reference_type == *filter,
        }
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn namespace_table(&self) -> Result<NamespaceTable> {
        Ok(self.inner.namespaces.read().clone())
    }

    async fn browse(
        &self,
        node: &NodeId,
        options: &BrowseOptions,
    ) -> Result<Vec<ReferenceDescriptor>> {
        let references = self.inner.references.read();
        let all = references.get(node).map(Vec::as_slice).unwrap_or_default();
        Ok(all.iter().filter(|r| self.reference_matches(r, options)).cloned().collect())
    }

    async fn read_node(&self, node: &NodeId) -> Result<Node> {
        self.inner
            .nodes
            .read()
            .get(node)
            .cloned()
            .ok_or_else(|| Error::Transport(format!("node {node} is not in the address space")))
    }

    async fn type_tree(&self) -> Result<Arc<dyn TypeTree>> {
        Ok(self.inner.type_tree.clone())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassAttributes, QualifiedName};

    fn object(node_id: NodeId, name: &str) -> Node {
        Node::new(
            node_id,
            QualifiedName::new(0, name),
            ClassAttributes::Object { event_notifier: 0 },
        )
    }

    #[tokio::test]
    async fn browse_filters_by_direction_and_kind() {
        let space = MemoryAddressSpace::new();
        let a = NodeId::numeric(0, 100);
        let b = NodeId::numeric(0, 101);
        let c = NodeId::numeric(0, 102);
        space.insert_node(object(a.clone(), "A"));
        space.insert_node(object(b.clone(), "B"));
        space.insert_node(object(c.clone(), "C"));

        space.link(&a, ids::ORGANIZES, &b);
        space.add_reference(&a, ReferenceDescriptor::forward(ids::HAS_TYPE_DEFINITION, c.clone()));
        space.add_reference(&a, ReferenceDescriptor::inverse(ids::ORGANIZES, c.clone()));

        space.register_endpoint(MemoryAddressSpace::sample_endpoint("opc.tcp://mem"));
        let endpoints = space.discover_endpoints("opc.tcp://mem").await.unwrap();
        let session = space.connect(&endpoints[0], &ConnectOptions::default()).await.unwrap();

        let all = session.browse(&a, &BrowseOptions::all_references()).await.unwrap();
        assert_eq!(all.len(), 3);

        let hierarchical = session.browse(&a, &BrowseOptions::hierarchical()).await.unwrap();
        assert_eq!(hierarchical.len(), 1);
        assert_eq!(hierarchical[0].target, crate::model::ExpandedNodeId::local(b.clone()));
    }

    #[tokio::test]
    async fn connect_rejects_policy_mismatch() {
        let space = MemoryAddressSpace::new();
        let mut endpoint = MemoryAddressSpace::sample_endpoint("opc.tcp://mem");
        endpoint.security_policy_uri = SecurityPolicy::Basic256Sha256.uri().to_owned();
        space.register_endpoint(endpoint.clone());

        let err = space.connect(&endpoint, &ConnectOptions::default()).await;
        assert!(matches!(err, Err(Error::Transport(_))));
    }

    #[test]
    fn type_tree_normalizes_abstract_numerics() {
        let tree = MemoryTypeTree::new();
        assert_eq!(tree.backing_primitive_type(&NodeId::numeric(0, 6)).unwrap(), WireType::Int32);
        assert_eq!(tree.backing_primitive_type(&NodeId::numeric(0, 27)).unwrap(), WireType::Int64);
        assert_eq!(tree.backing_primitive_type(&NodeId::numeric(0, 28)).unwrap(), WireType::UInt64);

        let custom = NodeId::numeric(2, 3003);
        assert!(tree.backing_primitive_type(&custom).is_err());
        tree.register(custom.clone(), WireType::Float);
        assert_eq!(tree.backing_primitive_type(&custom).unwrap(), WireType::Float);
    }
}
