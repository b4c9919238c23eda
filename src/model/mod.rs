//! # Address Space & Graph Model
//!
//! Clean DTOs that cross every boundary: transport ↔ browser ↔ mapper ↔ export.
//!
//! Design rule: this module is pure data — no I/O, no state, no async.

pub mod endpoint;
pub mod node;
pub mod statement;
pub mod value;

pub use endpoint::{
    ApplicationDescriptor, ApplicationType, EndpointDescriptor, MessageSecurityMode,
    UserTokenPolicy, UserTokenType,
};
pub use node::{
    ClassAttributes, ExpandedNodeId, Identifier, LocalizedText, Node, NodeClass, NodeId,
    QualifiedName, ReferenceDescriptor, VariableAttributes, VariableTypeAttributes,
};
pub use statement::{Iri, Literal, Statement, StatementSet, Term};
pub use value::{
    DiagnosticInfo, ExtensionObject, Scalar, StatusCode, Variant, VariantBody, WireType,
};
