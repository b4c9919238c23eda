//! # opcua-rdf — Address Spaces as Knowledge Graphs
//!
//! Transforms the node graph exposed by an OPC UA server into a set of
//! subject–predicate–object statements, ready for a triple store.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Transport`/`Session` is the contract between the
//!    engine and any protocol stack
//! 2. **Clean DTOs**: `Node`, `Variant`, `Statement` cross all boundaries
//! 3. **Cycle-safe discovery**: a node is recorded before its children are
//!    scheduled, so reference cycles terminate
//! 4. **Table-driven values**: one handler per wire type, resolved through
//!    an explicit dispatch table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opcua_rdf::{GraphFormat, FileSink, Transformer};
//! use opcua_rdf::transport::MemoryAddressSpace;
//!
//! # async fn example() -> opcua_rdf::Result<()> {
//! // Any Transport implementation works; the in-memory space is built in.
//! let space = MemoryAddressSpace::new();
//! space.register_endpoint(MemoryAddressSpace::sample_endpoint("opc.tcp://plc:4840"));
//!
//! let transformer = Transformer::new(space);
//! let statements = transformer.transform("opc.tcp://plc:4840", None).await?;
//!
//! let sink = FileSink::new("address-space.ttl");
//! use opcua_rdf::GraphSink;
//! sink.write(&statements, GraphFormat::Turtle)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Transports
//!
//! | Transport | Module | Description |
//! |-----------|--------|-------------|
//! | Memory | `transport::memory` | In-memory address space for testing/embedding |

// ============================================================================
// Modules
// ============================================================================

pub mod assemble;
pub mod browse;
pub mod export;
pub mod mapper;
pub mod model;
pub mod namespace;
pub mod transport;
pub mod vocab;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    ClassAttributes, EndpointDescriptor, Iri, Literal, LocalizedText, Node, NodeClass, NodeId,
    QualifiedName, ReferenceDescriptor, Scalar, Statement, StatementSet, Term, Variant, WireType,
};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use assemble::GraphAssembler;
pub use browse::{AddressSpaceBrowser, DiscoveredGraph, DiscoveredNode};
pub use export::{export_ntriples, export_turtle, FileSink, GraphFormat, GraphSink};
pub use mapper::{NodeMapper, ValueMapper, WireTypeTable};
pub use namespace::{segment_of, NamespaceTable, NodeIdEncoder};
pub use transport::{ConnectOptions, Identity, SecurityPolicy, Session, Transport, TypeTree};

use tracing::info;
use transport::ids;

// ============================================================================
// Top-level Transformer handle
// ============================================================================

/// The primary entry point. A `Transformer` wraps a transport and runs the
/// full discover → connect → browse → map pipeline.
pub struct Transformer<T: Transport> {
    transport: T,
    options: ConnectOptions,
}

impl<T: Transport> Transformer<T> {
    /// Create a Transformer with default connection options (no transport
    /// security, anonymous identity).
    pub fn new(transport: T) -> Self {
        Self { transport, options: ConnectOptions::default() }
    }

    pub fn with_options(mut self, options: ConnectOptions) -> Self {
        self.options = options;
        self
    }

    /// Transform the address space behind `endpoint_url`.
    ///
    /// Discovers the reachable endpoints, connects to the one offering the
    /// configured security policy, and assembles the statement set from the
    /// root folder. With an `entry_subject`, the endpoint fragment is
    /// attached under it.
    pub async fn transform(
        &self,
        endpoint_url: &str,
        entry_subject: Option<Iri>,
    ) -> Result<StatementSet> {
        let discovery_url = format!("{}/discovery", endpoint_url.trim_end_matches('/'));
        let endpoints = self.transport.discover_endpoints(&discovery_url).await?;
        let wanted = self.options.security_policy.uri();
        let endpoint = endpoints
            .iter()
            .find(|e| e.security_policy_uri == wanted)
            .ok_or_else(|| {
                Error::Transport(format!("no endpoint at {endpoint_url} offers {wanted}"))
            })?;
        info!(endpoint = %endpoint.endpoint_url, "connecting");
        let session = self.transport.connect(endpoint, &self.options).await?;

        let result = self.assemble(&session, entry_subject, &endpoints).await;
        let disconnected = session.disconnect().await;
        let set = result?;
        disconnected?;
        Ok(set)
    }

    /// Transform and hand the finished set to a sink in one call.
    pub async fn transform_to(
        &self,
        endpoint_url: &str,
        entry_subject: Option<Iri>,
        sink: &dyn GraphSink,
        format: GraphFormat,
    ) -> Result<StatementSet> {
        let set = self.transform(endpoint_url, entry_subject).await?;
        sink.write(&set, format)?;
        Ok(set)
    }

    async fn assemble(
        &self,
        session: &T::Session,
        entry_subject: Option<Iri>,
        endpoints: &[EndpointDescriptor],
    ) -> Result<StatementSet> {
        let namespaces = session.namespace_table().await?;
        let types = session.type_tree().await?;
        let mut assembler = GraphAssembler::new(&namespaces, types.as_ref());
        if let Some(subject) = entry_subject {
            assembler = assembler.with_entry_subject(subject);
        }
        assembler.run(session, &ids::ROOT_FOLDER, endpoints).await
    }

    /// Access the underlying transport (for advanced use).
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is neither a URI nor a `urn:`-style identifier.
    #[error("{0} is no proper uri or urn")]
    MalformedIdentifier(String),

    /// An identity could not be resolved against the namespace table.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// A wire-type tag outside the dispatch table.
    #[error("unsupported wire type: {type_id}")]
    UnsupportedType { type_id: NodeId },

    /// A payload whose shape does not fit its tag, or nesting past the
    /// depth cap.
    #[error("malformed value: {0}")]
    MalformedValue(String),

    /// Connection, browse, or read failure in the transport collaborator.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
