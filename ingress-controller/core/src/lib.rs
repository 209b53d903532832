#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod naming;
pub mod route;
pub mod rule;
pub mod service;
pub mod store;

pub use self::{
    naming::{route_host, route_name, service_name_for, split_route_name, NAME_SEPARATOR},
    route::{NoPorts, PathMatch, RouteBackend, RouteRecord, RouteSpec, RouteTls},
    rule::RuleConfig,
    service::{ServiceDescriptor, ServicePort, ServiceRef},
    store::{BoxError, RouteStore, RuleStore, ServiceStore, StoreError},
};

/// Finalizer shared by every route this controller creates. It must be
/// released before the route is deleted.
pub const ROUTE_FINALIZER: &str = "network.operator.com/autoingress";

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY: &str = "autoingress-controller";
