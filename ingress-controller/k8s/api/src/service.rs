use autoingress_controller_core::{ServiceDescriptor, ServicePort};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;

/// Extracts the fields routes are derived from.
///
/// Returns `None` for objects without a namespace, which the API server never
/// produces for services.
pub fn service_descriptor(svc: &Service) -> Option<ServiceDescriptor> {
    let namespace = svc.namespace()?;
    let ports = svc
        .spec
        .iter()
        .flat_map(|spec| spec.ports.iter().flatten())
        .map(|p| ServicePort {
            name: p.name.clone(),
            port: p.port,
        })
        .collect();

    Some(ServiceDescriptor {
        name: svc.name_any(),
        namespace,
        labels: svc.labels().clone(),
        ports,
    })
}
