//! Nodes of the address space: identities, names, classes, attributes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::Variant;

// ============================================================================
// Identity
// ============================================================================

/// Identifier part of a [`NodeId`]. OPC UA permits four kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(String),
    Guid(Uuid),
    Opaque(Vec<u8>),
}

impl Identifier {
    /// The bare identifier value, without the `i=`/`s=` kind marker.
    /// This is the segment that ends up in a node's IRI.
    pub fn value_string(&self) -> String {
        match self {
            Identifier::Numeric(n) => n.to_string(),
            Identifier::String(s) => s.clone(),
            Identifier::Guid(g) => g.to_string(),
            Identifier::Opaque(bytes) => hex_string(bytes),
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "i={n}"),
            Identifier::String(s) => write!(f, "s={s}"),
            Identifier::Guid(g) => write!(f, "g={g}"),
            Identifier::Opaque(bytes) => write!(f, "b={}", hex_string(bytes)),
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Identity of a node: namespace index into the server's namespace table
/// plus an identifier unique within that namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeId {
    pub fn numeric(namespace: u16, value: u32) -> Self {
        Self { namespace, identifier: Identifier::Numeric(value) }
    }

    pub fn string(namespace: u16, value: impl Into<String>) -> Self {
        Self { namespace, identifier: Identifier::String(value.into()) }
    }

    pub fn guid(namespace: u16, value: Uuid) -> Self {
        Self { namespace, identifier: Identifier::Guid(value) }
    }

    pub fn opaque(namespace: u16, value: Vec<u8>) -> Self {
        Self { namespace, identifier: Identifier::Opaque(value) }
    }
}

/// The parseable form: `i=84`, `ns=2;s=Machine/Axis1`, ...
impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

/// A node identity as it appears in browse results: may point into another
/// server and may carry its namespace by URI instead of by index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpandedNodeId {
    pub node_id: NodeId,
    pub namespace_uri: Option<String>,
    pub server_index: u32,
}

impl ExpandedNodeId {
    /// A local identity with the namespace carried by index.
    pub fn local(node_id: NodeId) -> Self {
        Self { node_id, namespace_uri: None, server_index: 0 }
    }
}

impl std::fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.server_index != 0 {
            write!(f, "svr={};", self.server_index)?;
        }
        if let Some(uri) = &self.namespace_uri {
            write!(f, "nsu={uri};{}", self.node_id.identifier)
        } else {
            write!(f, "{}", self.node_id)
        }
    }
}

// ============================================================================
// Names
// ============================================================================

/// Namespace-qualified browse name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespace: u16,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: u16, name: impl Into<String>) -> Self {
        Self { namespace, name: name.into() }
    }
}

/// The parseable form: `2:MyDevice`.
impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Language-tagged text. Both parts may be absent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub locale: Option<String>,
    pub text: Option<String>,
}

impl LocalizedText {
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self { locale: Some(locale.into()), text: Some(text.into()) }
    }

    /// Text without a language tag.
    pub fn plain(text: impl Into<String>) -> Self {
        Self { locale: None, text: Some(text.into()) }
    }

    /// The null value: no locale, no text.
    pub fn null() -> Self {
        Self::default()
    }
}

// ============================================================================
// Node classes and attributes
// ============================================================================

/// The eight node classes of an address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    Object,
    ObjectType,
    Variable,
    VariableType,
    Method,
    ReferenceType,
    View,
    DataType,
}

impl NodeClass {
    /// All classes, in the order groups are mapped.
    pub const ALL: [NodeClass; 8] = [
        NodeClass::Object,
        NodeClass::ObjectType,
        NodeClass::Variable,
        NodeClass::VariableType,
        NodeClass::Method,
        NodeClass::ReferenceType,
        NodeClass::View,
        NodeClass::DataType,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NodeClass::Object => "Object",
            NodeClass::ObjectType => "ObjectType",
            NodeClass::Variable => "Variable",
            NodeClass::VariableType => "VariableType",
            NodeClass::Method => "Method",
            NodeClass::ReferenceType => "ReferenceType",
            NodeClass::View => "View",
            NodeClass::DataType => "DataType",
        }
    }
}

/// Attributes specific to a Variable node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableAttributes {
    pub data_type: NodeId,
    pub value_rank: i32,
    pub access_level: u8,
    pub user_access_level: u8,
    pub historizing: bool,
    pub array_dimensions: Option<Vec<u32>>,
    pub value: Option<Variant>,
}

/// Attributes specific to a VariableType node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableTypeAttributes {
    pub data_type: NodeId,
    pub value_rank: i32,
    pub array_dimensions: Option<Vec<u32>>,
    pub value: Option<Variant>,
}

/// Class-specific attribute sets. One variant per node class — the set is
/// closed, so the mapper can match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassAttributes {
    Object {
        event_notifier: u8,
    },
    ObjectType {
        is_abstract: bool,
    },
    Variable(VariableAttributes),
    VariableType(VariableTypeAttributes),
    Method {
        executable: bool,
        user_executable: bool,
    },
    ReferenceType {
        inverse_name: Option<LocalizedText>,
        is_abstract: bool,
        symmetric: bool,
    },
    View {
        contains_no_loops: bool,
        event_notifier: u8,
    },
    DataType {
        is_abstract: bool,
    },
}

impl ClassAttributes {
    pub fn node_class(&self) -> NodeClass {
        match self {
            ClassAttributes::Object { .. } => NodeClass::Object,
            ClassAttributes::ObjectType { .. } => NodeClass::ObjectType,
            ClassAttributes::Variable(_) => NodeClass::Variable,
            ClassAttributes::VariableType(_) => NodeClass::VariableType,
            ClassAttributes::Method { .. } => NodeClass::Method,
            ClassAttributes::ReferenceType { .. } => NodeClass::ReferenceType,
            ClassAttributes::View { .. } => NodeClass::View,
            ClassAttributes::DataType { .. } => NodeClass::DataType,
        }
    }
}

/// A node as read from the server. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub node_id: NodeId,
    pub browse_name: QualifiedName,
    pub display_name: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub write_mask: u32,
    pub user_write_mask: u32,
    pub attributes: ClassAttributes,
}

impl Node {
    pub fn new(node_id: NodeId, browse_name: QualifiedName, attributes: ClassAttributes) -> Self {
        Self {
            node_id,
            browse_name,
            display_name: None,
            description: None,
            write_mask: 0,
            user_write_mask: 0,
            attributes,
        }
    }

    pub fn with_display_name(mut self, display_name: LocalizedText) -> Self {
        self.display_name = Some(display_name);
        self
    }

    pub fn with_description(mut self, description: LocalizedText) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_write_masks(mut self, write_mask: u32, user_write_mask: u32) -> Self {
        self.write_mask = write_mask;
        self.user_write_mask = user_write_mask;
        self
    }

    pub fn node_class(&self) -> NodeClass {
        self.attributes.node_class()
    }
}

// ============================================================================
// References
// ============================================================================

/// One outgoing reference as returned by a browse call.
///
/// The source node is implicit (the node that was browsed). An inverse
/// reference (`is_forward == false`) points from `target` to the source in
/// the semantically-forward direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDescriptor {
    pub reference_type: NodeId,
    pub is_forward: bool,
    pub target: ExpandedNodeId,
}

impl ReferenceDescriptor {
    pub fn forward(reference_type: NodeId, target: NodeId) -> Self {
        Self { reference_type, is_forward: true, target: ExpandedNodeId::local(target) }
    }

    pub fn inverse(reference_type: NodeId, target: NodeId) -> Self {
        Self { reference_type, is_forward: false, target: ExpandedNodeId::local(target) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_parseable_forms() {
        assert_eq!(NodeId::numeric(0, 84).to_string(), "i=84");
        assert_eq!(NodeId::numeric(2, 6001).to_string(), "ns=2;i=6001");
        assert_eq!(NodeId::string(2, "Machine/Axis1").to_string(), "ns=2;s=Machine/Axis1");
        assert_eq!(NodeId::opaque(1, vec![0xde, 0xad]).to_string(), "ns=1;b=dead");
    }

    #[test]
    fn qualified_name_full_form() {
        assert_eq!(QualifiedName::new(2, "MyDevice").to_string(), "2:MyDevice");
    }

    #[test]
    fn identifier_value_string_has_no_kind_marker() {
        assert_eq!(Identifier::Numeric(5).value_string(), "5");
        assert_eq!(Identifier::String("Dynamic/Double".into()).value_string(), "Dynamic/Double");
    }

    #[test]
    fn class_attributes_report_their_class() {
        let attrs = ClassAttributes::Method { executable: true, user_executable: false };
        assert_eq!(attrs.node_class(), NodeClass::Method);
    }
}
