//! Namespace resolution and node-identity encoding.
//!
//! The namespace table maps a node's namespace index to its declared URI.
//! [`segment_of`] derives the short identifier segment used for graph
//! prefixes, and [`NodeIdEncoder`] turns a node identity into its IRI.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::model::{ExpandedNodeId, Iri, NodeId};
use crate::{Error, Result};

/// URI of the base namespace, always present at index 0.
pub const UA_CORE_NAMESPACE: &str = "http://opcfoundation.org/UA/";

// ============================================================================
// Namespace table
// ============================================================================

/// The server's namespace array: index → declared URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceTable {
    uris: Vec<String>,
}

impl NamespaceTable {
    /// A table holding only the base namespace at index 0.
    pub fn new() -> Self {
        Self { uris: vec![UA_CORE_NAMESPACE.to_owned()] }
    }

    /// Append a URI and return its index. Re-adding an existing URI returns
    /// the index it already has.
    pub fn push_uri(&mut self, uri: impl Into<String>) -> u16 {
        let uri = uri.into();
        if let Some(index) = self.index_of(&uri) {
            return index;
        }
        self.uris.push(uri);
        (self.uris.len() - 1) as u16
    }

    pub fn uri(&self, index: u16) -> Option<&str> {
        self.uris.get(usize::from(index)).map(String::as_str)
    }

    pub fn index_of(&self, uri: &str) -> Option<u16> {
        self.uris.iter().position(|u| u == uri).map(|i| i as u16)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.uris.iter().enumerate().map(|(i, u)| (i as u16, u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    /// Resolve a browse-result identity against this table.
    ///
    /// Identities on a remote server (nonzero server index) and identities
    /// whose namespace URI is not in the table are unresolvable.
    pub fn resolve(&self, expanded: &ExpandedNodeId) -> Result<NodeId> {
        if expanded.server_index != 0 {
            return Err(Error::UnresolvedReference(format!(
                "{expanded} lives on remote server {}",
                expanded.server_index
            )));
        }
        match &expanded.namespace_uri {
            None => Ok(expanded.node_id.clone()),
            Some(uri) => {
                let namespace = self.index_of(uri).ok_or_else(|| {
                    Error::UnresolvedReference(format!("namespace uri {uri} is not in the table"))
                })?;
                Ok(NodeId { namespace, identifier: expanded.node_id.identifier.clone() })
            }
        }
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Segment derivation
// ============================================================================

/// Derive the short identifier segment of a URI or URN, used as a graph
/// prefix and in subject naming.
///
/// URIs keep the text after the final `/` (a single trailing `/` and any
/// `#fragment` are stripped first). URNs keep the tail from the last `:`
/// *including* the colon — the asymmetry is inherited behavior and callers
/// depend on the exact output.
pub fn segment_of(input: &str) -> Result<String> {
    if !input.contains('/') {
        if !(input.starts_with("urn") && input.contains(':')) {
            return Err(Error::MalformedIdentifier(input.to_owned()));
        }
        let trimmed = input.strip_suffix(':').unwrap_or(input);
        return match trimmed.rfind(':') {
            Some(pos) => Ok(trimmed[pos..].to_owned()),
            None => Err(Error::MalformedIdentifier(input.to_owned())),
        };
    }
    let mut parsed = input.strip_suffix('/').unwrap_or(input);
    if let Some(pos) = parsed.rfind('#') {
        parsed = &parsed[..pos];
    }
    let start = parsed.rfind('/').map_or(0, |pos| pos + 1);
    Ok(parsed[start..].to_owned())
}

// ============================================================================
// Node identity encoding
// ============================================================================

/// Encodes node identities into IRIs against one namespace table.
///
/// Equal identities always encode to the same IRI within a run; distinct
/// identities cannot collide unless the namespace table itself is broken.
#[derive(Debug, Clone, Copy)]
pub struct NodeIdEncoder<'a> {
    namespaces: &'a NamespaceTable,
}

impl<'a> NodeIdEncoder<'a> {
    pub fn new(namespaces: &'a NamespaceTable) -> Self {
        Self { namespaces }
    }

    /// Namespace URI (with a `/` appended when absent) followed by the
    /// percent-encoded identifier value.
    pub fn encode(&self, node_id: &NodeId) -> Result<Iri> {
        let namespace = self.namespaces.uri(node_id.namespace).ok_or_else(|| {
            Error::UnresolvedReference(format!(
                "no namespace uri for index {} ({node_id})",
                node_id.namespace
            ))
        })?;
        let segment =
            utf8_percent_encode(&node_id.identifier.value_string(), NON_ALPHANUMERIC).to_string();
        let mut iri = String::with_capacity(namespace.len() + 1 + segment.len());
        iri.push_str(namespace);
        if !namespace.ends_with('/') {
            iri.push('/');
        }
        iri.push_str(&segment);
        Ok(Iri(iri))
    }

    /// Resolve an expanded identity against the table, then encode it.
    pub fn encode_expanded(&self, expanded: &ExpandedNodeId) -> Result<Iri> {
        self.encode(&self.namespaces.resolve(expanded)?)
    }
}
