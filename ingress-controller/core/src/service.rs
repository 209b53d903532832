use std::{collections::BTreeMap, fmt};

/// Identifies a service within the cluster.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServicePort {
    pub name: Option<String>,
    pub port: i32,
}

/// The parts of a service that routes are derived from.
///
/// Only the first port is ever exposed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
}

// === impl ServiceRef ===

impl ServiceRef {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl ServiceDescriptor ===

impl ServiceDescriptor {
    pub fn id(&self) -> ServiceRef {
        ServiceRef::new(&self.namespace, &self.name)
    }

    pub fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name && self.namespace == other.namespace
    }
}
