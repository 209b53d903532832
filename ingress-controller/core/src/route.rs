use crate::{naming, RuleConfig, ServiceDescriptor, MANAGED_BY, MANAGED_BY_LABEL, ROUTE_FINALIZER};
use std::collections::BTreeMap;

/// The path every generated route serves.
pub const ROOT_PATH: &str = "/";

/// The desired state of a route exposing one service under one rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteSpec {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub class_name: String,
    pub host: String,
    pub path: PathMatch,
    pub backend: RouteBackend,
    pub tls: Option<RouteTls>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathMatch {
    Prefix(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteBackend {
    pub service: String,
    pub port: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTls {
    pub hosts: Vec<String>,
    pub secret_name: String,
}

/// A route as held by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRecord {
    pub spec: RouteSpec,
    pub finalizers: Vec<String>,
    /// Opaque version used by the store to detect conflicting writes.
    pub resource_version: Option<String>,
    /// Set once deletion has been requested but is blocked on finalizers.
    pub terminating: bool,
}

/// Routes can only be built for services that expose a port.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("service {namespace}/{name} does not expose any ports")]
pub struct NoPorts {
    pub namespace: String,
    pub name: String,
}

// === impl RouteSpec ===

impl RouteSpec {
    /// Derives the route that exposes `service` according to `rule`.
    ///
    /// The backend always targets the service's first port.
    pub fn build(service: &ServiceDescriptor, rule: &RuleConfig) -> Result<Self, NoPorts> {
        let port = service.ports.first().ok_or_else(|| NoPorts {
            namespace: service.namespace.clone(),
            name: service.name.clone(),
        })?;

        let host = naming::route_host(service, rule);
        let tls = rule.tls_secret().map(|secret| RouteTls {
            hosts: vec![host.clone()],
            secret_name: secret.to_string(),
        });

        let mut labels = service.labels.clone();
        labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string());

        Ok(Self {
            name: naming::route_name(&service.name, &rule.name),
            namespace: service.namespace.clone(),
            labels,
            annotations: rule.annotations.clone(),
            class_name: rule.route_class_name.clone(),
            host,
            path: PathMatch::Prefix(ROOT_PATH.to_string()),
            backend: RouteBackend {
                service: service.name.clone(),
                port: port.port,
            },
            tls,
        })
    }
}

// === impl RouteRecord ===

impl RouteRecord {
    /// A record that has not been persisted yet.
    pub fn new(spec: RouteSpec) -> Self {
        Self {
            spec,
            finalizers: Vec::new(),
            resource_version: None,
            terminating: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn namespace(&self) -> &str {
        &self.spec.namespace
    }

    pub fn has_finalizer(&self) -> bool {
        self.finalizers.iter().any(|f| f == ROUTE_FINALIZER)
    }

    /// Returns true if the finalizer was not already present.
    pub fn add_finalizer(&mut self) -> bool {
        if self.has_finalizer() {
            return false;
        }
        self.finalizers.push(ROUTE_FINALIZER.to_string());
        true
    }

    /// Returns true if the finalizer was present.
    pub fn remove_finalizer(&mut self) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != ROUTE_FINALIZER);
        self.finalizers.len() != before
    }

    /// Replaces the stored spec with `spec`, keeping store bookkeeping and
    /// finalizers owned by other controllers.
    pub fn converge(&mut self, spec: &RouteSpec) {
        self.spec = spec.clone();
        self.add_finalizer();
    }
}
