//! Type-directed mapping of typed values to graph terms.
//!
//! One handler per builtin wire type, held in a [`WireTypeTable`] built once
//! and passed to the mapper explicitly. Arrays map element-wise in input
//! order; a null payload maps to nothing; a self-describing payload is
//! resolved through the type tree and re-dispatched, bounded by
//! [`MAX_VARIANT_DEPTH`].

use hashbrown::HashMap;
use smallvec::{smallvec, SmallVec};

use crate::model::{Literal, LocalizedText, Scalar, Term, Variant, VariantBody, WireType};
use crate::namespace::{NamespaceTable, NodeIdEncoder};
use crate::transport::TypeTree;
use crate::{Error, Result};

/// Hard bound on self-describing nesting. The wire format does not bound
/// this; exceeding the cap is a malformed value, not a traversal target.
pub const MAX_VARIANT_DEPTH: usize = 8;

/// Mapped terms for one value; scalar payloads dominate, so one slot inline.
pub type Terms = SmallVec<[Term; 1]>;

type Handler = fn(&ValueMapper<'_>, &Scalar, usize) -> Result<Terms>;

// ============================================================================
// Dispatch table
// ============================================================================

/// The tag → handler table. Pure data, constructed once per run.
pub struct WireTypeTable {
    handlers: HashMap<WireType, Handler>,
}

impl WireTypeTable {
    pub fn new() -> Self {
        let mut handlers: HashMap<WireType, Handler> = HashMap::new();
        handlers.insert(WireType::Boolean, map_boolean);
        handlers.insert(WireType::SByte, map_sbyte);
        handlers.insert(WireType::Byte, map_byte);
        handlers.insert(WireType::Int16, map_int16);
        handlers.insert(WireType::UInt16, map_uint16);
        handlers.insert(WireType::Int32, map_int32);
        handlers.insert(WireType::UInt32, map_uint32);
        handlers.insert(WireType::Int64, map_int64);
        handlers.insert(WireType::UInt64, map_uint64);
        handlers.insert(WireType::Float, map_float);
        handlers.insert(WireType::Double, map_double);
        handlers.insert(WireType::String, map_string);
        handlers.insert(WireType::DateTime, map_datetime);
        handlers.insert(WireType::Guid, map_guid);
        handlers.insert(WireType::ByteString, map_byte_string);
        handlers.insert(WireType::XmlElement, map_xml_element);
        handlers.insert(WireType::NodeId, map_node_id);
        handlers.insert(WireType::ExpandedNodeId, map_expanded_node_id);
        handlers.insert(WireType::StatusCode, map_status_code);
        handlers.insert(WireType::QualifiedName, map_qualified_name);
        handlers.insert(WireType::LocalizedText, map_localized_text);
        handlers.insert(WireType::ExtensionObject, map_extension_object);
        handlers.insert(WireType::DiagnosticInfo, map_diagnostic_info);
        handlers.insert(WireType::Variant, map_variant);
        // DataValue deliberately has no handler: it never appears as a
        // backing type and must surface as unsupported.
        Self { handlers }
    }

    pub fn handler(&self, tag: WireType) -> Option<Handler> {
        self.handlers.get(&tag).copied()
    }
}

impl Default for WireTypeTable {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ValueMapper
// ============================================================================

/// Maps one typed value to a sequence of graph terms.
pub struct ValueMapper<'a> {
    encoder: NodeIdEncoder<'a>,
    types: &'a dyn TypeTree,
    table: &'a WireTypeTable,
}

impl<'a> ValueMapper<'a> {
    pub fn new(
        namespaces: &'a NamespaceTable,
        types: &'a dyn TypeTree,
        table: &'a WireTypeTable,
    ) -> Self {
        Self { encoder: NodeIdEncoder::new(namespaces), types, table }
    }

    /// Map `value` under the given wire-type tag. Empty when the payload is
    /// null; one term per element for arrays, in input order.
    pub fn map_value(&self, value: &Variant, tag: WireType) -> Result<Terms> {
        self.map_at_depth(value, tag, 0)
    }

    fn map_at_depth(&self, value: &Variant, tag: WireType, depth: usize) -> Result<Terms> {
        let Some(body) = &value.body else {
            return Ok(Terms::new());
        };
        let handler = self
            .table
            .handler(tag)
            .ok_or_else(|| Error::UnsupportedType { type_id: value.data_type.clone() })?;
        match body {
            VariantBody::Scalar(scalar) => handler(self, scalar, depth),
            VariantBody::Array(items) => {
                let mut terms = Terms::new();
                for item in items {
                    terms.extend(handler(self, item, depth)?);
                }
                Ok(terms)
            }
        }
    }
}

/// Optional literal from language-tagged text: absent text maps to nothing,
/// text without a locale to a plain literal, text with a locale to a
/// language-tagged literal.
pub fn optional_text_literal(text: &LocalizedText) -> Option<Literal> {
    let value = text.text.clone()?;
    Some(match &text.locale {
        Some(lang) => Literal::LangText { text: value, lang: lang.clone() },
        None => Literal::Text(value),
    })
}

// ============================================================================
// Handlers
// ============================================================================

fn one(term: impl Into<Term>) -> Result<Terms> {
    Ok(smallvec![term.into()])
}

fn mismatch(expected: WireType, got: &Scalar) -> Error {
    Error::MalformedValue(format!(
        "expected a {expected:?} payload, got {:?}",
        got.wire_type()
    ))
}

fn map_boolean(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::Boolean(v) => one(Literal::Boolean(*v)),
        other => Err(mismatch(WireType::Boolean, other)),
    }
}

fn map_sbyte(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::SByte(v) => one(Literal::Int(i64::from(*v))),
        other => Err(mismatch(WireType::SByte, other)),
    }
}

fn map_byte(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::Byte(v) => one(Literal::UInt(u64::from(*v))),
        other => Err(mismatch(WireType::Byte, other)),
    }
}

fn map_int16(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::Int16(v) => one(Literal::Int(i64::from(*v))),
        other => Err(mismatch(WireType::Int16, other)),
    }
}

fn map_uint16(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::UInt16(v) => one(Literal::UInt(u64::from(*v))),
        other => Err(mismatch(WireType::UInt16, other)),
    }
}

fn map_int32(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::Int32(v) => one(Literal::Int(i64::from(*v))),
        other => Err(mismatch(WireType::Int32, other)),
    }
}

fn map_uint32(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::UInt32(v) => one(Literal::UInt(u64::from(*v))),
        other => Err(mismatch(WireType::UInt32, other)),
    }
}

fn map_int64(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::Int64(v) => one(Literal::Int(*v)),
        other => Err(mismatch(WireType::Int64, other)),
    }
}

fn map_uint64(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::UInt64(v) => one(Literal::UInt(*v)),
        other => Err(mismatch(WireType::UInt64, other)),
    }
}

fn map_float(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::Float(v) => one(Literal::Float(*v)),
        other => Err(mismatch(WireType::Float, other)),
    }
}

fn map_double(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::Double(v) => one(Literal::Double(*v)),
        other => Err(mismatch(WireType::Double, other)),
    }
}

fn map_string(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::String(v) => one(Literal::Text(v.clone())),
        other => Err(mismatch(WireType::String, other)),
    }
}

fn map_datetime(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::DateTime(v) => one(Literal::DateTime(*v)),
        other => Err(mismatch(WireType::DateTime, other)),
    }
}

fn map_guid(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::Guid(v) => one(Literal::Text(v.to_string())),
        other => Err(mismatch(WireType::Guid, other)),
    }
}

fn map_byte_string(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::ByteString(bytes) => one(Literal::Text(printable_bytes(bytes))),
        other => Err(mismatch(WireType::ByteString, other)),
    }
}

fn map_xml_element(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::XmlElement(v) => one(Literal::Text(v.clone())),
        other => Err(mismatch(WireType::XmlElement, other)),
    }
}

fn map_node_id(m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::NodeId(v) => one(m.encoder.encode(v)?),
        other => Err(mismatch(WireType::NodeId, other)),
    }
}

fn map_expanded_node_id(m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::ExpandedNodeId(v) => one(m.encoder.encode_expanded(v)?),
        other => Err(mismatch(WireType::ExpandedNodeId, other)),
    }
}

fn map_status_code(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::StatusCode(v) => one(Literal::Text(v.to_string())),
        other => Err(mismatch(WireType::StatusCode, other)),
    }
}

/// Name portion only; the namespace index is discarded.
fn map_qualified_name(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::QualifiedName(v) => one(Literal::Text(v.name.clone())),
        other => Err(mismatch(WireType::QualifiedName, other)),
    }
}

fn map_localized_text(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::LocalizedText(v) => {
            Ok(optional_text_literal(v).map(Term::Literal).into_iter().collect())
        }
        other => Err(mismatch(WireType::LocalizedText, other)),
    }
}

fn map_extension_object(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::ExtensionObject(v) => one(Literal::Text(v.body.clone())),
        other => Err(mismatch(WireType::ExtensionObject, other)),
    }
}

fn map_diagnostic_info(_m: &ValueMapper<'_>, s: &Scalar, _depth: usize) -> Result<Terms> {
    match s {
        Scalar::DiagnosticInfo(v) => Ok(v
            .localized_text
            .clone()
            .map(|text| Term::Literal(Literal::Text(text)))
            .into_iter()
            .collect()),
        other => Err(mismatch(WireType::DiagnosticInfo, other)),
    }
}

/// The self-describing case: resolve the nested value's own wire type and
/// re-dispatch on it one level deeper.
fn map_variant(m: &ValueMapper<'_>, s: &Scalar, depth: usize) -> Result<Terms> {
    let Scalar::Variant(inner) = s else {
        return Err(mismatch(WireType::Variant, s));
    };
    if depth >= MAX_VARIANT_DEPTH {
        return Err(Error::MalformedValue(format!(
            "self-describing value nested deeper than {MAX_VARIANT_DEPTH}"
        )));
    }
    let backing = m.types.backing_primitive_type(&inner.data_type)?;
    m.map_at_depth(inner, backing, depth + 1)
}

pub(crate) fn printable_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("[");
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&byte.to_string());
    }
    out.push(']');
    out
}
