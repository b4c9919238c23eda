//! Typed values as transmitted by the source protocol.
//!
//! A [`Variant`] carries the declared data type of its payload alongside the
//! payload itself. The payload is a single [`Scalar`] or a homogeneous array
//! of them; a nested `Variant` scalar is the self-describing case, whose
//! actual wire type must be resolved through the type tree before mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node::{ExpandedNodeId, LocalizedText, NodeId, QualifiedName};

// ============================================================================
// Wire types
// ============================================================================

/// The builtin wire-type tags of the source protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
    Guid,
    ByteString,
    XmlElement,
    NodeId,
    ExpandedNodeId,
    StatusCode,
    QualifiedName,
    LocalizedText,
    ExtensionObject,
    DataValue,
    Variant,
    DiagnosticInfo,
}

impl WireType {
    /// The numeric builtin-type identifier (namespace 0) of this tag.
    pub fn builtin_id(&self) -> u32 {
        match self {
            WireType::Boolean => 1,
            WireType::SByte => 2,
            WireType::Byte => 3,
            WireType::Int16 => 4,
            WireType::UInt16 => 5,
            WireType::Int32 => 6,
            WireType::UInt32 => 7,
            WireType::Int64 => 8,
            WireType::UInt64 => 9,
            WireType::Float => 10,
            WireType::Double => 11,
            WireType::String => 12,
            WireType::DateTime => 13,
            WireType::Guid => 14,
            WireType::ByteString => 15,
            WireType::XmlElement => 16,
            WireType::NodeId => 17,
            WireType::ExpandedNodeId => 18,
            WireType::StatusCode => 19,
            WireType::QualifiedName => 20,
            WireType::LocalizedText => 21,
            WireType::ExtensionObject => 22,
            WireType::DataValue => 23,
            WireType::Variant => 24,
            WireType::DiagnosticInfo => 25,
        }
    }

    /// Inverse of [`builtin_id`](Self::builtin_id).
    pub fn from_builtin_id(id: u32) -> Option<WireType> {
        Some(match id {
            1 => WireType::Boolean,
            2 => WireType::SByte,
            3 => WireType::Byte,
            4 => WireType::Int16,
            5 => WireType::UInt16,
            6 => WireType::Int32,
            7 => WireType::UInt32,
            8 => WireType::Int64,
            9 => WireType::UInt64,
            10 => WireType::Float,
            11 => WireType::Double,
            12 => WireType::String,
            13 => WireType::DateTime,
            14 => WireType::Guid,
            15 => WireType::ByteString,
            16 => WireType::XmlElement,
            17 => WireType::NodeId,
            18 => WireType::ExpandedNodeId,
            19 => WireType::StatusCode,
            20 => WireType::QualifiedName,
            21 => WireType::LocalizedText,
            22 => WireType::ExtensionObject,
            23 => WireType::DataValue,
            24 => WireType::Variant,
            25 => WireType::DiagnosticInfo,
            _ => return None,
        })
    }

    /// The namespace-0 node identity of this builtin type.
    pub fn node_id(&self) -> NodeId {
        NodeId::numeric(0, self.builtin_id())
    }
}

// ============================================================================
// Auxiliary payload types
// ============================================================================

/// Raw status word. Displays in its hexadecimal string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCode(pub u32);

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// A structure payload already decoded by the transport into its string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionObject {
    pub type_id: ExpandedNodeId,
    pub body: String,
}

/// Diagnostic information attached to a value or service result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    pub symbolic_id: i32,
    pub localized_text: Option<String>,
    pub additional_info: Option<String>,
}

// ============================================================================
// Scalars and variants
// ============================================================================

/// One scalar payload, tagged by wire type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    ByteString(Vec<u8>),
    XmlElement(String),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(StatusCode),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    ExtensionObject(ExtensionObject),
    DiagnosticInfo(DiagnosticInfo),
    Variant(Box<Variant>),
}

impl Scalar {
    pub fn wire_type(&self) -> WireType {
        match self {
            Scalar::Boolean(_) => WireType::Boolean,
            Scalar::SByte(_) => WireType::SByte,
            Scalar::Byte(_) => WireType::Byte,
            Scalar::Int16(_) => WireType::Int16,
            Scalar::UInt16(_) => WireType::UInt16,
            Scalar::Int32(_) => WireType::Int32,
            Scalar::UInt32(_) => WireType::UInt32,
            Scalar::Int64(_) => WireType::Int64,
            Scalar::UInt64(_) => WireType::UInt64,
            Scalar::Float(_) => WireType::Float,
            Scalar::Double(_) => WireType::Double,
            Scalar::String(_) => WireType::String,
            Scalar::DateTime(_) => WireType::DateTime,
            Scalar::Guid(_) => WireType::Guid,
            Scalar::ByteString(_) => WireType::ByteString,
            Scalar::XmlElement(_) => WireType::XmlElement,
            Scalar::NodeId(_) => WireType::NodeId,
            Scalar::ExpandedNodeId(_) => WireType::ExpandedNodeId,
            Scalar::StatusCode(_) => WireType::StatusCode,
            Scalar::QualifiedName(_) => WireType::QualifiedName,
            Scalar::LocalizedText(_) => WireType::LocalizedText,
            Scalar::ExtensionObject(_) => WireType::ExtensionObject,
            Scalar::DiagnosticInfo(_) => WireType::DiagnosticInfo,
            Scalar::Variant(_) => WireType::Variant,
        }
    }
}

/// Scalar or homogeneous-array payload of a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariantBody {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

/// A typed value: the declared data type identity plus an optional payload.
///
/// `data_type` names a DataType node; for the self-describing case it is
/// resolved to a concrete wire type through the type tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub data_type: NodeId,
    pub body: Option<VariantBody>,
}

impl Variant {
    pub fn scalar(data_type: NodeId, value: Scalar) -> Self {
        Self { data_type, body: Some(VariantBody::Scalar(value)) }
    }

    pub fn array(data_type: NodeId, values: Vec<Scalar>) -> Self {
        Self { data_type, body: Some(VariantBody::Array(values)) }
    }

    /// A variant with a declared type but no payload.
    pub fn null(data_type: NodeId) -> Self {
        Self { data_type, body: None }
    }

    pub fn is_null(&self) -> bool {
        self.body.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_round_trip() {
        for id in 1..=25 {
            let tag = WireType::from_builtin_id(id).unwrap();
            assert_eq!(tag.builtin_id(), id);
        }
        assert_eq!(WireType::from_builtin_id(0), None);
        assert_eq!(WireType::from_builtin_id(26), None);
    }

    #[test]
    fn status_code_string_form() {
        assert_eq!(StatusCode(0).to_string(), "0x00000000");
        assert_eq!(StatusCode(0x8041_0000).to_string(), "0x80410000");
    }

    #[test]
    fn scalar_reports_wire_type() {
        assert_eq!(Scalar::Int32(7).wire_type(), WireType::Int32);
        let nested = Scalar::Variant(Box::new(Variant::null(WireType::Int32.node_id())));
        assert_eq!(nested.wire_type(), WireType::Variant);
    }
}
