//! End-to-end tests for the full transformation pipeline.
//!
//! Each test exercises: discover -> connect -> browse -> map against a
//! MemoryAddressSpace. Statement order is not part of the contract, so all
//! assertions are membership checks.

use opcua_rdf::model::{
    ClassAttributes, ExpandedNodeId, QualifiedName, ReferenceDescriptor, Scalar,
    VariableAttributes, Variant, WireType,
};
use opcua_rdf::transport::{ids, ConnectOptions, MemoryAddressSpace, Session, Transport};
use opcua_rdf::{
    vocab, AddressSpaceBrowser, Iri, Literal, LocalizedText, Node, NodeId, Term, Transformer,
};
use pretty_assertions::assert_eq;

const URL: &str = "opc.tcp://localhost:4840";

fn object(node_id: NodeId, name: &str) -> Node {
    Node::new(
        node_id,
        QualifiedName::new(0, name),
        ClassAttributes::Object { event_notifier: 0 },
    )
}

/// Root folder -> Objects folder -> one Int32 variable holding 42.
fn build_space() -> (MemoryAddressSpace, NodeId) {
    let space = MemoryAddressSpace::new();
    space.register_endpoint(MemoryAddressSpace::sample_endpoint(URL));
    let machines = space.push_namespace("http://iwu.fraunhofer.de/machines/");

    let objects = NodeId::numeric(0, 85);
    space.insert_node(object(ids::ROOT_FOLDER, "Root"));
    space.insert_node(object(objects.clone(), "Objects"));
    space.link(&ids::ROOT_FOLDER, ids::ORGANIZES, &objects);

    let speed = NodeId::numeric(machines, 100);
    space.insert_node(
        Node::new(
            speed.clone(),
            QualifiedName::new(machines, "Speed"),
            ClassAttributes::Variable(VariableAttributes {
                data_type: WireType::Int32.node_id(),
                value_rank: -1,
                access_level: 3,
                user_access_level: 3,
                historizing: false,
                array_dimensions: None,
                value: Some(Variant::scalar(WireType::Int32.node_id(), Scalar::Int32(42))),
            }),
        )
        .with_display_name(LocalizedText::new("en", "Spindle speed")),
    );
    space.link(&objects, ids::HAS_COMPONENT, &speed);

    (space, speed)
}

// ============================================================================
// 1. The canonical scenario: one Int32 variable holding 42
// ============================================================================

#[tokio::test]
async fn variable_node_produces_full_statement_set() {
    let (space, speed) = build_space();
    let set = Transformer::new(space).transform(URL, None).await.unwrap();

    let subject = Iri::new("http://iwu.fraunhofer.de/machines/100");
    let class = set.objects_of(&subject, &vocab::attribute("NodeClass"));
    assert_eq!(class, vec![&Term::Iri(vocab::node_class(opcua_rdf::NodeClass::Variable))]);

    assert!(set.contains(
        &subject,
        &vocab::attribute("BrowseName"),
        &Term::Literal(Literal::Text("1:Speed".into()))
    ));
    assert!(set.contains(
        &subject,
        &vocab::attribute("NodeId"),
        &Term::Literal(Literal::Text(speed.to_string()))
    ));
    assert!(set.contains(
        &subject,
        &vocab::attribute("DisplayName"),
        &Term::Literal(Literal::LangText { text: "Spindle speed".into(), lang: "en".into() })
    ));
    for mask in ["WriteMask", "UserWriteMask"] {
        assert!(set.contains(
            &subject,
            &vocab::attribute(mask),
            &Term::Literal(Literal::UInt(0))
        ));
    }
    assert!(set.contains(
        &subject,
        &vocab::attribute("DataType"),
        &Term::Iri(Iri::new("http://opcfoundation.org/UA/6"))
    ));
    assert!(set.contains(
        &subject,
        &vocab::attribute("ValueRank"),
        &Term::Literal(Literal::Int(-1))
    ));
    for level in ["AccessLevel", "UserAccessLevel"] {
        assert!(set.contains(
            &subject,
            &vocab::attribute(level),
            &Term::Literal(Literal::UInt(3))
        ));
    }
    assert!(set.contains(
        &subject,
        &vocab::attribute("Historizing"),
        &Term::Literal(Literal::Boolean(false))
    ));
    assert!(set.contains(
        &subject,
        &vocab::attribute("ArrayDimensions"),
        &Term::Literal(Literal::Text("[]".into()))
    ));

    let values = set.objects_of(&subject, &vocab::attribute("Value"));
    assert_eq!(values, vec![&Term::Literal(Literal::Int(42))]);
}

// ============================================================================
// 2. Hierarchical relations become directional statements
// ============================================================================

#[tokio::test]
async fn forward_relations_are_emitted() {
    let (space, _) = build_space();
    let set = Transformer::new(space).transform(URL, None).await.unwrap();

    let root = Iri::new("http://opcfoundation.org/UA/84");
    let objects = Iri::new("http://opcfoundation.org/UA/85");
    let organizes = Iri::new("http://opcfoundation.org/UA/35");
    assert!(set.contains(&root, &organizes, &Term::Iri(objects)));
}

#[tokio::test]
async fn inverse_relations_are_stored_forward() {
    let (space, speed) = build_space();
    // The variable also reports its component parent as an inverse reference.
    let objects = NodeId::numeric(0, 85);
    space.add_reference(&speed, ReferenceDescriptor::inverse(ids::HAS_COMPONENT, objects));

    let set = Transformer::new(space).transform(URL, None).await.unwrap();

    let parent = Iri::new("http://opcfoundation.org/UA/85");
    let child = Iri::new("http://iwu.fraunhofer.de/machines/100");
    let has_component = Iri::new("http://opcfoundation.org/UA/47");
    assert!(set.contains(&parent, &has_component, &Term::Iri(child.clone())));
    assert!(!set.contains(&child, &has_component, &Term::Iri(parent)));
}

// ============================================================================
// 3. Cycles terminate and rediscovery is a no-op
// ============================================================================

#[tokio::test]
async fn reference_cycles_terminate() {
    let (space, _) = build_space();
    let a = NodeId::numeric(0, 200);
    let b = NodeId::numeric(0, 201);
    space.insert_node(object(a.clone(), "A"));
    space.insert_node(object(b.clone(), "B"));
    space.link(&NodeId::numeric(0, 85), ids::ORGANIZES, &a);
    space.link(&a, ids::ORGANIZES, &b);
    space.link(&b, ids::ORGANIZES, &a); // cycle back

    let endpoints = space.discover_endpoints(URL).await.unwrap();
    let session = space.connect(&endpoints[0], &ConnectOptions::default()).await.unwrap();
    let namespaces = session.namespace_table().await.unwrap();

    let browser = AddressSpaceBrowser::new(&session, &namespaces);
    let graph = browser.browse_from(&ids::ROOT_FOLDER).await.unwrap();
    assert_eq!(graph.len(), 5); // root, objects, speed, a, b

    // Walking again from inside the cycle converges to the same closure.
    let from_a = browser.browse_from(&a).await.unwrap();
    assert_eq!(from_a.len(), 2);
}

// ============================================================================
// 4. Unresolvable targets are skipped, never fatal
// ============================================================================

#[tokio::test]
async fn unresolvable_targets_are_skipped() {
    let (space, speed) = build_space();
    let remote = ExpandedNodeId {
        node_id: NodeId::numeric(0, 999),
        namespace_uri: None,
        server_index: 7,
    };
    space.add_reference(
        &speed,
        ReferenceDescriptor { reference_type: ids::ORGANIZES, is_forward: true, target: remote },
    );

    let set = Transformer::new(space).transform(URL, None).await.unwrap();
    let dead = Term::Iri(Iri::new("http://opcfoundation.org/UA/999"));
    assert!(set.iter().all(|s| s.object != dead));
}

// ============================================================================
// 5. Namespace prefixes are registered on the produced set
// ============================================================================

#[tokio::test]
async fn namespace_prefixes_are_registered() {
    let (space, _) = build_space();
    let set = Transformer::new(space).transform(URL, None).await.unwrap();

    let prefixes = set.prefixes().to_vec();
    assert!(prefixes.contains(&("UA".to_owned(), "http://opcfoundation.org/UA/".to_owned())));
    assert!(prefixes
        .contains(&("machines".to_owned(), "http://iwu.fraunhofer.de/machines/".to_owned())));
}

// ============================================================================
// 6. Entry subject gets the endpoint fragment
// ============================================================================

#[tokio::test]
async fn entry_subject_is_linked_to_root_and_endpoints() {
    let (space, _) = build_space();
    let entry = Iri::new("http://iwu.fraunhofer.de/c32/Machine/1");
    let set = Transformer::new(space).transform(URL, Some(entry.clone())).await.unwrap();

    let root = Iri::new("http://opcfoundation.org/UA/84");
    assert!(set.contains(&entry, &vocab::has_address_space(), &Term::Iri(root)));

    let endpoint_iri = Iri::new(URL);
    assert!(set.contains(&entry, &vocab::has_endpoint(), &Term::Iri(endpoint_iri.clone())));
    assert!(set.contains(
        &endpoint_iri,
        &vocab::endpoint("SecurityPolicyUri"),
        &Term::Literal(Literal::Text(
            "http://opcfoundation.org/UA/SecurityPolicy#None".into()
        ))
    ));
    assert!(set.contains(
        &endpoint_iri,
        &vocab::endpoint("SecurityLevel"),
        &Term::Literal(Literal::UInt(0))
    ));
}

// ============================================================================
// 7. Connection failures are fatal
// ============================================================================

#[tokio::test]
async fn missing_policy_match_fails_the_run() {
    let space = MemoryAddressSpace::new();
    // No endpoints registered at all.
    let error = Transformer::new(space).transform(URL, None).await.unwrap_err();
    assert!(matches!(error, opcua_rdf::Error::Transport(_)));
}

// ============================================================================
// 8. The finished set serializes
// ============================================================================

#[tokio::test]
async fn finished_set_exports_as_turtle() {
    let (space, _) = build_space();
    let set = Transformer::new(space).transform(URL, None).await.unwrap();

    let mut buffer = Vec::new();
    opcua_rdf::export_turtle(&set, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.contains("@prefix UA: <http://opcfoundation.org/UA/> ."));
    assert!(text.contains("UA:84"));
}
