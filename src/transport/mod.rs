//! # Transport Seam
//!
//! These traits are THE contract between the transformation engine and the
//! protocol stack that talks to a live server. The engine only ever browses,
//! reads, and resolves types through them; everything on the wire — session
//! negotiation, encodings, timeouts — stays behind the implementation.
//!
//! | Implementation | Module | Description |
//! |----------------|--------|-------------|
//! | `MemoryAddressSpace` | `memory` | In-memory address space for tests/embedding |

pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::{EndpointDescriptor, Node, NodeId, ReferenceDescriptor, WireType};
use crate::namespace::NamespaceTable;
use crate::Result;

pub use memory::{MemoryAddressSpace, MemoryTypeTree};

// ============================================================================
// Well-known identities
// ============================================================================

/// Namespace-0 identities the engine relies on.
pub mod ids {
    use crate::model::{Identifier, NodeId};

    const fn numeric(value: u32) -> NodeId {
        NodeId { namespace: 0, identifier: Identifier::Numeric(value) }
    }

    /// Browse entry point of every address space.
    pub const ROOT_FOLDER: NodeId = numeric(84);
    /// Abstract root of all reference types.
    pub const REFERENCES: NodeId = numeric(31);
    /// Abstract root of the hierarchical reference types.
    pub const HIERARCHICAL_REFERENCES: NodeId = numeric(33);
    pub const HAS_SUBTYPE: NodeId = numeric(45);
    pub const ORGANIZES: NodeId = numeric(35);
    pub const HAS_TYPE_DEFINITION: NodeId = numeric(40);
    pub const HAS_PROPERTY: NodeId = numeric(46);
    pub const HAS_COMPONENT: NodeId = numeric(47);
    pub const HAS_NOTIFIER: NodeId = numeric(48);
}

// ============================================================================
// Browse options
// ============================================================================

/// Direction filter for a browse call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseDirection {
    Forward,
    Inverse,
    Both,
}

/// Parameters of one browse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseOptions {
    pub direction: BrowseDirection,
    /// Restrict to references of this type (`None` = no filter).
    pub reference_type: Option<NodeId>,
    pub include_subtypes: bool,
}

impl BrowseOptions {
    /// Every outgoing reference, hierarchical or not, both directions.
    pub fn all_references() -> Self {
        Self {
            direction: BrowseDirection::Both,
            reference_type: Some(ids::REFERENCES),
            include_subtypes: true,
        }
    }

    /// Forward hierarchical references with subtypes — the recursion set.
    pub fn hierarchical() -> Self {
        Self {
            direction: BrowseDirection::Forward,
            reference_type: Some(ids::HIERARCHICAL_REFERENCES),
            include_subtypes: true,
        }
    }
}

// ============================================================================
// Connection parameters
// ============================================================================

/// Transport security policy requested for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityPolicy {
    #[default]
    None,
    Basic128Rsa15,
    Basic256,
    Basic256Sha256,
    Aes128Sha256RsaOaep,
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    pub fn uri(&self) -> &'static str {
        match self {
            SecurityPolicy::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            SecurityPolicy::Basic128Rsa15 => {
                "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15"
            }
            SecurityPolicy::Basic256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256",
            SecurityPolicy::Basic256Sha256 => {
                "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256"
            }
            SecurityPolicy::Aes128Sha256RsaOaep => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep"
            }
            SecurityPolicy::Aes256Sha256RsaPss => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss"
            }
        }
    }
}

/// Identity presented when activating the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    UserName {
        user: String,
        password: String,
    },
}

/// Connection parameters. The timeout is forwarded to the transport; the
/// engine itself enforces none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub security_policy: SecurityPolicy,
    pub identity: Identity,
    pub request_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            security_policy: SecurityPolicy::None,
            identity: Identity::Anonymous,
            request_timeout: Duration::from_secs(5),
        }
    }
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Establishes connections to a server.
#[async_trait]
pub trait Transport: Send + Sync {
    type Session: Session;

    /// Enumerate the endpoints reachable under a discovery URL.
    async fn discover_endpoints(&self, url: &str) -> Result<Vec<EndpointDescriptor>>;

    /// Open a session on one endpoint.
    async fn connect(
        &self,
        endpoint: &EndpointDescriptor,
        options: &ConnectOptions,
    ) -> Result<Self::Session>;
}

/// An open session against one server.
#[async_trait]
pub trait Session: Send + Sync {
    /// The server's namespace array.
    async fn namespace_table(&self) -> Result<NamespaceTable>;

    /// Outgoing references of one node, filtered by `options`.
    async fn browse(
        &self,
        node: &NodeId,
        options: &BrowseOptions,
    ) -> Result<Vec<ReferenceDescriptor>>;

    /// Read all attributes of one node.
    async fn read_node(&self, node: &NodeId) -> Result<Node>;

    /// The server's data-type tree.
    async fn type_tree(&self) -> Result<Arc<dyn TypeTree>>;

    /// Release the session.
    async fn disconnect(&self) -> Result<()>;
}

/// Resolves a declared data type to the builtin wire type backing it.
///
/// Abstract numeric families (Number, Integer, UInteger, ...) normalize to a
/// concrete representable kind here, before value dispatch.
pub trait TypeTree: Send + Sync {
    fn backing_primitive_type(&self, declared: &NodeId) -> Result<WireType>;
}
