//! Orchestration of one transformation run.
//!
//! The assembler drives the browse, maps the discovered nodes group by
//! group, registers serialization prefixes from the namespace table, and
//! optionally attaches an endpoint fragment under a caller-supplied entry
//! subject. The produced set is buffered — nothing reaches a sink until the
//! run has completed.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::{debug, warn};

use crate::browse::AddressSpaceBrowser;
use crate::mapper::value::printable_bytes;
use crate::mapper::{optional_text_literal, NodeMapper, WireTypeTable};
use crate::model::{
    EndpointDescriptor, Iri, Literal, NodeClass, NodeId, StatementSet, Term,
};
use crate::namespace::{segment_of, NamespaceTable, NodeIdEncoder};
use crate::transport::{Session, TypeTree};
use crate::{vocab, Result};

/// Assembles the statement set of one run.
pub struct GraphAssembler<'a> {
    namespaces: &'a NamespaceTable,
    types: &'a dyn TypeTree,
    entry_subject: Option<Iri>,
}

impl<'a> GraphAssembler<'a> {
    pub fn new(namespaces: &'a NamespaceTable, types: &'a dyn TypeTree) -> Self {
        Self { namespaces, types, entry_subject: None }
    }

    /// Attach the endpoint fragment under this subject after mapping.
    pub fn with_entry_subject(mut self, subject: Iri) -> Self {
        self.entry_subject = Some(subject);
        self
    }

    /// Browse from `root`, map every discovered node, and return the
    /// complete buffered statement set.
    pub async fn run<S: Session + ?Sized>(
        &self,
        session: &S,
        root: &NodeId,
        endpoints: &[EndpointDescriptor],
    ) -> Result<StatementSet> {
        let browser = AddressSpaceBrowser::new(session, self.namespaces);
        let graph = browser.browse_from(root).await?;
        debug!(nodes = graph.len(), "browse complete");

        let mut set = StatementSet::new();
        for (_, uri) in self.namespaces.iter() {
            match segment_of(uri) {
                Ok(prefix) => set.set_prefix(prefix, uri),
                Err(error) => debug!(%uri, %error, "namespace uri has no usable prefix"),
            }
        }

        let table = WireTypeTable::new();
        let mapper = NodeMapper::new(self.namespaces, self.types, &table);
        for class in NodeClass::ALL {
            for entry in graph.by_class(class) {
                if let Err(error) = mapper.map_node(entry, &mut set) {
                    warn!(node = %entry.node.node_id, %error, "node not encodable, skipping");
                }
            }
        }

        if let Some(entry_subject) = &self.entry_subject {
            self.attach_endpoints(entry_subject, root, endpoints, &mut set)?;
        }
        debug!(statements = set.len(), "assembly complete");
        Ok(set)
    }

    /// Link the entry subject to the address-space root and describe every
    /// reachable endpoint.
    fn attach_endpoints(
        &self,
        entry: &Iri,
        root: &NodeId,
        endpoints: &[EndpointDescriptor],
        set: &mut StatementSet,
    ) -> Result<()> {
        let root_iri = NodeIdEncoder::new(self.namespaces).encode(root)?;
        set.add(entry.clone(), vocab::has_address_space(), Term::Iri(root_iri));

        for endpoint in endpoints {
            let endpoint_iri = Iri::new(endpoint.endpoint_url.clone());
            set.add(entry.clone(), vocab::has_endpoint(), Term::Iri(endpoint_iri.clone()));
            set.add(
                endpoint_iri.clone(),
                vocab::endpoint("EndpointUrl"),
                Literal::Text(endpoint.endpoint_url.clone()),
            );

            let server = &endpoint.server;
            let application_iri = Iri::new(server.application_uri.clone());
            set.add(
                endpoint_iri.clone(),
                vocab::endpoint("Server"),
                Term::Iri(application_iri.clone()),
            );
            set.add(
                application_iri.clone(),
                vocab::endpoint("ApplicationUri"),
                Literal::Text(server.application_uri.clone()),
            );
            set.add(
                application_iri.clone(),
                vocab::endpoint("ProductUri"),
                Literal::Text(server.product_uri.clone()),
            );
            if let Some(literal) = optional_text_literal(&server.application_name) {
                set.add(application_iri.clone(), vocab::endpoint("ApplicationName"), literal);
            }
            set.add(
                application_iri.clone(),
                vocab::endpoint("ApplicationType"),
                Literal::Text(server.application_type.name().to_owned()),
            );
            if let Some(uri) = &server.gateway_server_uri {
                set.add(
                    application_iri.clone(),
                    vocab::endpoint("GatewayServerUri"),
                    Literal::Text(uri.clone()),
                );
            }
            if let Some(uri) = &server.discovery_profile_uri {
                set.add(
                    application_iri.clone(),
                    vocab::endpoint("DiscoveryProfileUri"),
                    Literal::Text(uri.clone()),
                );
            }
            for url in &server.discovery_urls {
                set.add(
                    application_iri.clone(),
                    vocab::endpoint("DiscoveryUrl"),
                    Literal::Text(url.clone()),
                );
            }

            set.add(
                endpoint_iri.clone(),
                vocab::endpoint("ServerCertificate"),
                Literal::Text(printable_bytes(&endpoint.server_certificate)),
            );
            set.add(
                endpoint_iri.clone(),
                vocab::endpoint("SecurityMode"),
                Literal::Text(endpoint.security_mode.name().to_owned()),
            );
            set.add(
                endpoint_iri.clone(),
                vocab::endpoint("SecurityPolicyUri"),
                Literal::Text(endpoint.security_policy_uri.clone()),
            );

            for token in &endpoint.user_identity_tokens {
                let token_iri = Iri::new(format!(
                    "{}/tokens/{}",
                    endpoint.endpoint_url,
                    utf8_percent_encode(&token.policy_id, NON_ALPHANUMERIC)
                ));
                set.add(
                    endpoint_iri.clone(),
                    vocab::endpoint("UserIdentityToken"),
                    Term::Iri(token_iri.clone()),
                );
                set.add(
                    token_iri.clone(),
                    vocab::endpoint("PolicyId"),
                    Literal::Text(token.policy_id.clone()),
                );
                set.add(
                    token_iri.clone(),
                    vocab::endpoint("TokenType"),
                    Literal::Text(token.token_type.name().to_owned()),
                );
                if let Some(issued) = &token.issued_token_type {
                    set.add(
                        token_iri.clone(),
                        vocab::endpoint("IssuedTokenType"),
                        Literal::Text(issued.clone()),
                    );
                }
                if let Some(url) = &token.issuer_endpoint_url {
                    set.add(
                        token_iri.clone(),
                        vocab::endpoint("IssuerEndpointUrl"),
                        Literal::Text(url.clone()),
                    );
                }
                if let Some(uri) = &token.security_policy_uri {
                    set.add(
                        token_iri.clone(),
                        vocab::endpoint("SecurityPolicyUri"),
                        Literal::Text(uri.clone()),
                    );
                }
            }

            set.add(
                endpoint_iri.clone(),
                vocab::endpoint("TransportProfileUri"),
                Literal::Text(endpoint.transport_profile_uri.clone()),
            );
            set.add(
                endpoint_iri,
                vocab::endpoint("SecurityLevel"),
                Literal::UInt(u64::from(endpoint.security_level)),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ids, MemoryAddressSpace, MemoryTypeTree};

    #[test]
    fn endpoint_fragment_links_entry_subject() {
        let namespaces = NamespaceTable::new();
        let types = MemoryTypeTree::new();
        let assembler = GraphAssembler::new(&namespaces, &types);

        let entry = Iri::new("http://iwu.fraunhofer.de/c32/Machine/1");
        let endpoint = MemoryAddressSpace::sample_endpoint("opc.tcp://plc:4840");
        let mut set = StatementSet::new();
        assembler
            .attach_endpoints(&entry, &ids::ROOT_FOLDER, std::slice::from_ref(&endpoint), &mut set)
            .unwrap();

        let root_iri = Iri::new("http://opcfoundation.org/UA/84");
        assert!(set.contains(&entry, &vocab::has_address_space(), &Term::Iri(root_iri)));

        let endpoint_iri = Iri::new("opc.tcp://plc:4840");
        assert!(set.contains(&entry, &vocab::has_endpoint(), &Term::Iri(endpoint_iri.clone())));
        assert!(set.contains(
            &endpoint_iri,
            &vocab::endpoint("SecurityMode"),
            &Term::Literal(Literal::Text("None".into()))
        ));

        let token_iri = Iri::new("opc.tcp://plc:4840/tokens/anonymous");
        assert!(set.contains(
            &endpoint_iri,
            &vocab::endpoint("UserIdentityToken"),
            &Term::Iri(token_iri.clone())
        ));
        assert!(set.contains(
            &token_iri,
            &vocab::endpoint("TokenType"),
            &Term::Literal(Literal::Text("Anonymous".into()))
        ));
    }
}
