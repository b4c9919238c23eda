//! Fixed vocabulary: the namespaces and predicates the mapper emits.

use crate::model::{Iri, NodeClass};

/// Namespace for node attribute predicates.
pub const ATTRIBUTES: &str = "http://opcfoundation.org/UA/Attributes/";

/// Namespace for node-class identifiers.
pub const NODE_CLASSES: &str = "http://opcfoundation.org/UA/NodeClasses/";

/// Namespace for endpoint-description predicates.
pub const ENDPOINTS: &str = "http://opcfoundation.org/UA/Endpoints/";

/// Namespace for entry-subject linkage predicates.
pub const ENTRY: &str = "http://iwu.fraunhofer.de/c32/";

/// Predicate for one node attribute, e.g. `attribute("BrowseName")`.
pub fn attribute(name: &str) -> Iri {
    Iri::new(format!("{ATTRIBUTES}{name}"))
}

/// Identifier of a node class.
pub fn node_class(class: NodeClass) -> Iri {
    Iri::new(format!("{NODE_CLASSES}{}", class.name()))
}

/// Predicate for one endpoint-description field, e.g. `endpoint("SecurityMode")`.
pub fn endpoint(name: &str) -> Iri {
    Iri::new(format!("{ENDPOINTS}{name}"))
}

/// Links the entry subject to the address-space root.
pub fn has_address_space() -> Iri {
    Iri::new(format!("{ENTRY}hasOpcuaAddressSpace"))
}

/// Links the entry subject to one reachable endpoint.
pub fn has_endpoint() -> Iri {
    Iri::new(format!("{ENTRY}hasOpcuaEndpoint"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_are_stable() {
        assert_eq!(
            attribute("BrowseName").as_str(),
            "http://opcfoundation.org/UA/Attributes/BrowseName"
        );
        assert_eq!(
            node_class(NodeClass::Variable).as_str(),
            "http://opcfoundation.org/UA/NodeClasses/Variable"
        );
        assert_eq!(
            has_address_space().as_str(),
            "http://iwu.fraunhofer.de/c32/hasOpcuaAddressSpace"
        );
    }
}
