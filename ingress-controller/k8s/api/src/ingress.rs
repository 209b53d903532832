use autoingress_controller_core::{PathMatch, RouteBackend, RouteRecord, RouteSpec, RouteTls};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use kube::{api::ObjectMeta, ResourceExt};

const PATH_TYPE_PREFIX: &str = "Prefix";

/// Renders a route record as a `networking.k8s.io/v1` Ingress.
pub fn ingress(route: &RouteRecord) -> Ingress {
    let RouteSpec {
        name,
        namespace,
        labels,
        annotations,
        class_name,
        host,
        path,
        backend,
        tls,
    } = &route.spec;

    let PathMatch::Prefix(path) = path;
    let http_path = HTTPIngressPath {
        path: Some(path.clone()),
        path_type: PATH_TYPE_PREFIX.to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: backend.service.clone(),
                port: Some(ServiceBackendPort {
                    number: Some(backend.port),
                    name: None,
                }),
            }),
            resource: None,
        },
    };

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(namespace.clone()),
            labels: Some(labels.clone()),
            annotations: Some(annotations.clone()),
            finalizers: (!route.finalizers.is_empty()).then(|| route.finalizers.clone()),
            resource_version: route.resource_version.clone(),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: Some(class_name.clone()),
            rules: Some(vec![IngressRule {
                host: Some(host.clone()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![http_path],
                }),
            }]),
            tls: tls.as_ref().map(|tls| {
                vec![IngressTLS {
                    hosts: Some(tls.hosts.clone()),
                    secret_name: Some(tls.secret_name.clone()),
                }]
            }),
            default_backend: None,
        }),
        status: None,
    }
}

/// Reads a stored Ingress back into a route record.
///
/// Fields that were edited out of band into shapes this controller never
/// produces are read as empty; the next update overwrites them.
pub fn route_record(ingress: Ingress) -> RouteRecord {
    let terminating = ingress.metadata.deletion_timestamp.is_some();
    let name = ingress.name_any();
    let namespace = ingress.namespace().unwrap_or_default();
    let labels = ingress.labels().clone();
    let annotations = ingress.annotations().clone();
    let finalizers = ingress.finalizers().to_vec();
    let resource_version = ingress.resource_version();

    let spec = ingress.spec.unwrap_or_default();
    let rule = spec.rules.into_iter().flatten().next();
    let host = rule
        .as_ref()
        .and_then(|r| r.host.clone())
        .unwrap_or_default();
    let http_path = rule.and_then(|r| r.http).and_then(|h| h.paths.into_iter().next());
    let path = http_path
        .as_ref()
        .and_then(|p| p.path.clone())
        .unwrap_or_default();
    let backend = http_path
        .and_then(|p| p.backend.service)
        .map(|svc| RouteBackend {
            port: svc.port.and_then(|p| p.number).unwrap_or_default(),
            service: svc.name,
        })
        .unwrap_or(RouteBackend {
            service: String::new(),
            port: 0,
        });
    let tls = spec
        .tls
        .into_iter()
        .flatten()
        .next()
        .map(|tls| RouteTls {
            hosts: tls.hosts.unwrap_or_default(),
            secret_name: tls.secret_name.unwrap_or_default(),
        });

    RouteRecord {
        spec: RouteSpec {
            name,
            namespace,
            labels,
            annotations,
            class_name: spec.ingress_class_name.unwrap_or_default(),
            host,
            path: PathMatch::Prefix(path),
            backend,
            tls,
        },
        finalizers,
        resource_version,
        terminating,
    }
}
