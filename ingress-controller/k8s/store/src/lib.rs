#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Kubernetes API server backed stores.

use async_trait::async_trait;
use autoingress_controller_core::{
    RouteRecord, RouteStore, RuleConfig, RuleStore, ServiceDescriptor, ServiceStore, StoreError,
};
use autoingress_controller_k8s_api::{
    self as k8s, Api, AutoIngress, DeleteParams, Ingress, ListParams, PostParams, Service,
};

pub const FIELD_MANAGER: &str = "autoingress-controller";

const ROUTE: &str = "route";
const SERVICE: &str = "service";
const RULE: &str = "rule";

/// Reads services and rules and writes Ingresses through the API server.
#[derive(Clone)]
pub struct KubeStore {
    client: k8s::Client,
}

// === impl KubeStore ===

impl KubeStore {
    pub fn new(client: k8s::Client) -> Self {
        Self { client }
    }

    fn ingresses(&self, namespace: &str) -> Api<Ingress> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RouteStore for KubeStore {
    async fn get_route(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RouteRecord>, StoreError> {
        let ingress = self
            .ingresses(namespace)
            .get_opt(name)
            .await
            .map_err(|e| StoreError::request(ROUTE, e))?;
        Ok(ingress.map(k8s::route_record))
    }

    async fn create_route(&self, route: RouteRecord) -> Result<RouteRecord, StoreError> {
        let created = self
            .ingresses(route.namespace())
            .create(&Self::post_params(), &k8s::ingress(&route))
            .await
            .map_err(|e| write_error(&route, e))?;
        Ok(k8s::route_record(created))
    }

    async fn update_route(&self, route: RouteRecord) -> Result<RouteRecord, StoreError> {
        let updated = self
            .ingresses(route.namespace())
            .replace(route.name(), &Self::post_params(), &k8s::ingress(&route))
            .await
            .map_err(|e| write_error(&route, e))?;
        Ok(k8s::route_record(updated))
    }

    async fn delete_route(&self, route: &RouteRecord) -> Result<(), StoreError> {
        match self
            .ingresses(route.namespace())
            .delete(route.name(), &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(k8s::Error::Api(resp)) if resp.code == 404 => {
                tracing::debug!(namespace = %route.namespace(), name = %route.name(), "Ingress already deleted");
                Ok(())
            }
            Err(error) => Err(write_error(route, error)),
        }
    }
}

#[async_trait]
impl ServiceStore for KubeStore {
    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceDescriptor>, StoreError> {
        let svc = Api::<Service>::namespaced(self.client.clone(), namespace)
            .get_opt(name)
            .await
            .map_err(|e| StoreError::request(SERVICE, e))?;
        Ok(svc.as_ref().and_then(k8s::service_descriptor))
    }

    async fn list_services(&self) -> Result<Vec<ServiceDescriptor>, StoreError> {
        let list = Api::<Service>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(|e| StoreError::request(SERVICE, e))?;
        Ok(list.iter().filter_map(k8s::service_descriptor).collect())
    }
}

#[async_trait]
impl RuleStore for KubeStore {
    async fn get_rule(&self, name: &str) -> Result<Option<RuleConfig>, StoreError> {
        let rule = Api::<AutoIngress>::all(self.client.clone())
            .get_opt(name)
            .await
            .map_err(|e| StoreError::request(RULE, e))?;
        Ok(rule.as_ref().map(AutoIngress::rule_config))
    }
}

fn write_error(route: &RouteRecord, error: k8s::Error) -> StoreError {
    match error {
        k8s::Error::Api(resp) if resp.code == 409 => StoreError::Conflict {
            kind: ROUTE,
            namespace: route.namespace().to_string(),
            name: route.name().to_string(),
        },
        error => StoreError::request(ROUTE, error),
    }
}
