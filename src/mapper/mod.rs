//! # Node → Statement Mapping
//!
//! Turns one discovered node into its statements: the generic attribute set
//! every class shares, the class-specific attributes, and one directional
//! statement per recorded relation.

pub mod value;

use tracing::warn;

use crate::browse::DiscoveredNode;
use crate::model::{
    ClassAttributes, Iri, Literal, Node, NodeId, ReferenceDescriptor, StatementSet, Term, Variant,
};
use crate::namespace::{NamespaceTable, NodeIdEncoder};
use crate::transport::TypeTree;
use crate::vocab;
use crate::{Error, Result};

pub use value::{optional_text_literal, Terms, ValueMapper, WireTypeTable, MAX_VARIANT_DEPTH};

/// Maps discovered nodes to statements against one namespace table.
pub struct NodeMapper<'a> {
    namespaces: &'a NamespaceTable,
    encoder: NodeIdEncoder<'a>,
    types: &'a dyn TypeTree,
    values: ValueMapper<'a>,
}

impl<'a> NodeMapper<'a> {
    pub fn new(
        namespaces: &'a NamespaceTable,
        types: &'a dyn TypeTree,
        table: &'a WireTypeTable,
    ) -> Self {
        Self {
            namespaces,
            encoder: NodeIdEncoder::new(namespaces),
            types,
            values: ValueMapper::new(namespaces, types, table),
        }
    }

    /// Emit all statements of one node into `out`.
    ///
    /// Fails only when the node's own identity cannot be encoded. Value
    /// mapping failures abort the value statements alone; unresolvable
    /// relation targets are skipped per relation.
    pub fn map_node(&self, entry: &DiscoveredNode, out: &mut StatementSet) -> Result<()> {
        let node = &entry.node;
        let subject = self.encoder.encode(&node.node_id)?;

        self.emit_generic(&subject, node, out);
        self.emit_class_specific(&subject, node, out);
        self.emit_relations(&subject, &node.node_id, &entry.references, out);
        Ok(())
    }

    fn emit_generic(&self, subject: &Iri, node: &Node, out: &mut StatementSet) {
        out.add(
            subject.clone(),
            vocab::attribute("NodeClass"),
            Term::Iri(vocab::node_class(node.node_class())),
        );
        if let Some(literal) = node.display_name.as_ref().and_then(optional_text_literal) {
            out.add(subject.clone(), vocab::attribute("DisplayName"), literal);
        }
        out.add(
            subject.clone(),
            vocab::attribute("BrowseName"),
            Literal::Text(node.browse_name.to_string()),
        );
        out.add(
            subject.clone(),
            vocab::attribute("NodeId"),
            Literal::Text(node.node_id.to_string()),
        );
        if let Some(literal) = node.description.as_ref().and_then(optional_text_literal) {
            out.add(subject.clone(), vocab::attribute("Description"), literal);
        }
        out.add(
            subject.clone(),
            vocab::attribute("UserWriteMask"),
            Literal::UInt(u64::from(node.user_write_mask)),
        );
        out.add(
            subject.clone(),
            vocab::attribute("WriteMask"),
            Literal::UInt(u64::from(node.write_mask)),
        );
    }

    fn emit_class_specific(&self, subject: &Iri, node: &Node, out: &mut StatementSet) {
        match &node.attributes {
            ClassAttributes::Object { event_notifier } => {
                out.add(
                    subject.clone(),
                    vocab::attribute("EventNotifier"),
                    Literal::UInt(u64::from(*event_notifier)),
                );
            }
            ClassAttributes::ObjectType { is_abstract } => {
                out.add(
                    subject.clone(),
                    vocab::attribute("IsAbstract"),
                    Literal::Boolean(*is_abstract),
                );
            }
            ClassAttributes::Variable(attrs) => {
                self.emit_data_type(subject, &attrs.data_type, out);
                out.add(
                    subject.clone(),
                    vocab::attribute("ValueRank"),
                    Literal::Int(i64::from(attrs.value_rank)),
                );
                out.add(
                    subject.clone(),
                    vocab::attribute("AccessLevel"),
                    Literal::UInt(u64::from(attrs.access_level)),
                );
                out.add(
                    subject.clone(),
                    vocab::attribute("UserAccessLevel"),
                    Literal::UInt(u64::from(attrs.user_access_level)),
                );
                out.add(
                    subject.clone(),
                    vocab::attribute("Historizing"),
                    Literal::Boolean(attrs.historizing),
                );
                out.add(
                    subject.clone(),
                    vocab::attribute("ArrayDimensions"),
                    Literal::Text(dimension_text(attrs.array_dimensions.as_deref())),
                );
                self.emit_value(subject, &attrs.data_type, attrs.value.as_ref(), out);
            }
            ClassAttributes::VariableType(attrs) => {
                self.emit_data_type(subject, &attrs.data_type, out);
                out.add(
                    subject.clone(),
                    vocab::attribute("ValueRank"),
                    Literal::Int(i64::from(attrs.value_rank)),
                );
                self.emit_value(subject, &attrs.data_type, attrs.value.as_ref(), out);
                out.add(
                    subject.clone(),
                    vocab::attribute("ArrayDimensions"),
                    Literal::Text(dimension_text(attrs.array_dimensions.as_deref())),
                );
            }
            ClassAttributes::Method { executable, user_executable } => {
                out.add(
                    subject.clone(),
                    vocab::attribute("Executable"),
                    Literal::Boolean(*executable),
                );
                out.add(
                    subject.clone(),
                    vocab::attribute("UserExecutable"),
                    Literal::Boolean(*user_executable),
                );
            }
            ClassAttributes::ReferenceType { inverse_name, is_abstract, symmetric } => {
                if let Some(literal) = inverse_name.as_ref().and_then(optional_text_literal) {
                    out.add(subject.clone(), vocab::attribute("InverseName"), literal);
                }
                out.add(
                    subject.clone(),
                    vocab::attribute("IsAbstract"),
                    Literal::Boolean(*is_abstract),
                );
                out.add(
                    subject.clone(),
                    vocab::attribute("Symmetric"),
                    Literal::Boolean(*symmetric),
                );
            }
            ClassAttributes::View { contains_no_loops, event_notifier } => {
                out.add(
                    subject.clone(),
                    vocab::attribute("ContainsNoLoops"),
                    Literal::Boolean(*contains_no_loops),
                );
                out.add(
                    subject.clone(),
                    vocab::attribute("EventNotifier"),
                    Literal::UInt(u64::from(*event_notifier)),
                );
            }
            ClassAttributes::DataType { is_abstract } => {
                out.add(
                    subject.clone(),
                    vocab::attribute("IsAbstract"),
                    Literal::Boolean(*is_abstract),
                );
            }
        }
    }

    fn emit_data_type(&self, subject: &Iri, data_type: &NodeId, out: &mut StatementSet) {
        match self.encoder.encode(data_type) {
            Ok(iri) => out.add(subject.clone(), vocab::attribute("DataType"), Term::Iri(iri)),
            Err(error) => {
                warn!(subject = %subject, %error, "unencodable data type, skipping statement");
            }
        }
    }

    /// Value statements for a Variable/VariableType, dispatched through the
    /// backing primitive type. A failure aborts this node's value only.
    fn emit_value(
        &self,
        subject: &Iri,
        data_type: &NodeId,
        value: Option<&Variant>,
        out: &mut StatementSet,
    ) {
        let Some(variant) = value else { return };
        let backing = match self.types.backing_primitive_type(data_type) {
            Ok(backing) => backing,
            Err(error) => {
                warn!(subject = %subject, %error, "no backing type, skipping value");
                return;
            }
        };
        match self.values.map_value(variant, backing) {
            Ok(terms) => {
                for term in terms {
                    out.add(subject.clone(), vocab::attribute("Value"), term);
                }
            }
            Err(error @ (Error::UnsupportedType { .. } | Error::MalformedValue(_))) => {
                warn!(subject = %subject, %error, "value mapping failed, skipping value");
            }
            Err(error) => {
                warn!(subject = %subject, %error, "value payload unresolvable, skipping value");
            }
        }
    }

    /// One directional statement per recorded relation. Inverse references
    /// are stored in their semantically-forward direction.
    fn emit_relations(
        &self,
        subject: &Iri,
        node_id: &NodeId,
        references: &[ReferenceDescriptor],
        out: &mut StatementSet,
    ) {
        for reference in references {
            let target = match self.namespaces.resolve(&reference.target) {
                Ok(target) => target,
                Err(error) => {
                    warn!(source = %node_id, target = %reference.target, %error,
                        "unresolvable relation target, skipping");
                    continue;
                }
            };
            let target_iri = match self.encoder.encode(&target) {
                Ok(iri) => iri,
                Err(error) => {
                    warn!(source = %node_id, target = %target, %error,
                        "unencodable relation target, skipping");
                    continue;
                }
            };
            let predicate = match self.encoder.encode(&reference.reference_type) {
                Ok(iri) => iri,
                Err(error) => {
                    warn!(source = %node_id, reference_type = %reference.reference_type, %error,
                        "unencodable reference type, skipping");
                    continue;
                }
            };
            if reference.is_forward {
                out.add(subject.clone(), predicate, Term::Iri(target_iri));
            } else {
                out.add(target_iri, predicate, Term::Iri(subject.clone()));
            }
        }
    }
}

fn dimension_text(dimensions: Option<&[u32]>) -> String {
    let mut out = String::from("[");
    for (i, dim) in dimensions.unwrap_or_default().iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&dim.to_string());
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ExpandedNodeId, QualifiedName, Scalar, VariableAttributes, WireType,
    };
    use crate::transport::{ids, MemoryTypeTree};

    fn fixture() -> (NamespaceTable, MemoryTypeTree, WireTypeTable) {
        (NamespaceTable::new(), MemoryTypeTree::new(), WireTypeTable::new())
    }

    fn discovered(node: Node, references: Vec<ReferenceDescriptor>) -> DiscoveredNode {
        DiscoveredNode { node, references }
    }

    #[test]
    fn method_node_statements() {
        let (table, types, dispatch) = fixture();
        let mapper = NodeMapper::new(&table, &types, &dispatch);
        let mut out = StatementSet::new();

        let node = Node::new(
            NodeId::numeric(0, 9000),
            QualifiedName::new(0, "Start"),
            ClassAttributes::Method { executable: true, user_executable: false },
        );
        mapper.map_node(&discovered(node, Vec::new()), &mut out).unwrap();

        let subject = Iri::new("http://opcfoundation.org/UA/9000");
        assert!(out.contains(
            &subject,
            &vocab::attribute("Executable"),
            &Term::Literal(Literal::Boolean(true))
        ));
        assert!(out.contains(
            &subject,
            &vocab::attribute("UserExecutable"),
            &Term::Literal(Literal::Boolean(false))
        ));
        assert!(out.contains(
            &subject,
            &vocab::attribute("BrowseName"),
            &Term::Literal(Literal::Text("0:Start".into()))
        ));
    }

    #[test]
    fn variable_value_uses_backing_type() {
        let (table, types, dispatch) = fixture();
        let mapper = NodeMapper::new(&table, &types, &dispatch);
        let mut out = StatementSet::new();

        let node = Node::new(
            NodeId::numeric(0, 9001),
            QualifiedName::new(0, "Speed"),
            ClassAttributes::Variable(VariableAttributes {
                data_type: WireType::Int32.node_id(),
                value_rank: -1,
                access_level: 1,
                user_access_level: 1,
                historizing: false,
                array_dimensions: None,
                value: Some(Variant::scalar(WireType::Int32.node_id(), Scalar::Int32(42))),
            }),
        );
        mapper.map_node(&discovered(node, Vec::new()), &mut out).unwrap();

        let subject = Iri::new("http://opcfoundation.org/UA/9001");
        let values = out.objects_of(&subject, &vocab::attribute("Value"));
        assert_eq!(values, vec![&Term::Literal(Literal::Int(42))]);
        assert!(out.contains(
            &subject,
            &vocab::attribute("ArrayDimensions"),
            &Term::Literal(Literal::Text("[]".into()))
        ));
    }

    #[test]
    fn variable_type_omits_access_levels() {
        let (table, types, dispatch) = fixture();
        let mapper = NodeMapper::new(&table, &types, &dispatch);
        let mut out = StatementSet::new();

        let node = Node::new(
            NodeId::numeric(0, 9002),
            QualifiedName::new(0, "SpeedType"),
            ClassAttributes::VariableType(crate::model::VariableTypeAttributes {
                data_type: NodeId::numeric(0, 27), // abstract Integer
                value_rank: -1,
                array_dimensions: Some(vec![2, 3]),
                value: Some(Variant::scalar(NodeId::numeric(0, 27), Scalar::Int64(7))),
            }),
        );
        mapper.map_node(&discovered(node, Vec::new()), &mut out).unwrap();

        let subject = Iri::new("http://opcfoundation.org/UA/9002");
        // The abstract declared type normalizes to a concrete backing kind.
        let values = out.objects_of(&subject, &vocab::attribute("Value"));
        assert_eq!(values, vec![&Term::Literal(Literal::Int(7))]);
        assert!(out.contains(
            &subject,
            &vocab::attribute("ArrayDimensions"),
            &Term::Literal(Literal::Text("[2, 3]".into()))
        ));
        assert!(out.objects_of(&subject, &vocab::attribute("AccessLevel")).is_empty());
    }

    #[test]
    fn inverse_relation_is_stored_forward() {
        let (table, types, dispatch) = fixture();
        let mapper = NodeMapper::new(&table, &types, &dispatch);
        let mut out = StatementSet::new();

        let a = NodeId::numeric(0, 10);
        let b = NodeId::numeric(0, 11);
        let node = Node::new(
            a.clone(),
            QualifiedName::new(0, "A"),
            ClassAttributes::Object { event_notifier: 0 },
        );
        let references = vec![ReferenceDescriptor::inverse(ids::ORGANIZES, b.clone())];
        mapper.map_node(&discovered(node, references), &mut out).unwrap();

        let a_iri = Iri::new("http://opcfoundation.org/UA/10");
        let b_iri = Iri::new("http://opcfoundation.org/UA/11");
        let organizes = Iri::new("http://opcfoundation.org/UA/35");
        assert!(out.contains(&b_iri, &organizes, &Term::Iri(a_iri.clone())));
        assert!(!out.contains(&a_iri, &organizes, &Term::Iri(b_iri)));
    }

    #[test]
    fn unresolvable_relation_is_skipped() {
        let (table, types, dispatch) = fixture();
        let mapper = NodeMapper::new(&table, &types, &dispatch);
        let mut out = StatementSet::new();

        let node = Node::new(
            NodeId::numeric(0, 10),
            QualifiedName::new(0, "A"),
            ClassAttributes::Object { event_notifier: 0 },
        );
        let remote = ExpandedNodeId {
            node_id: NodeId::numeric(0, 99),
            namespace_uri: None,
            server_index: 2,
        };
        let references = vec![ReferenceDescriptor {
            reference_type: ids::ORGANIZES,
            is_forward: true,
            target: remote,
        }];
        let before = out.len();
        mapper.map_node(&discovered(node, references), &mut out).unwrap();

        // Generic + event-notifier statements only, nothing for the dead relation.
        assert_eq!(out.len() - before, 6);
    }
}
