use autoingress_controller_core::RuleConfig;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Annotations that describe the rule object itself and must not be copied
/// onto generated routes.
const EXCLUDED_ANNOTATIONS: &[&str] = &["kubectl.kubernetes.io/last-applied-configuration"];

/// Exposes every service whose name starts with one of `servicePrefixes`
/// through an Ingress under `rootDomain`.
#[derive(Clone, Debug, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "network.operator.com",
    version = "v1alpha1",
    kind = "AutoIngress",
    shortname = "autoing"
)]
#[serde(rename_all = "camelCase")]
pub struct AutoIngressSpec {
    /// Domain appended to every generated host.
    pub root_domain: String,

    /// IngressClass of generated ingresses.
    pub ingress_class_name: String,

    /// Secret holding the certificate served for generated hosts. TLS is
    /// disabled when unset or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_secret_name: Option<String>,

    /// Services whose names start with any of these prefixes are exposed.
    #[serde(default)]
    pub service_prefixes: Vec<String>,
}

// === impl AutoIngress ===

impl AutoIngress {
    pub fn rule_config(&self) -> RuleConfig {
        let annotations = self
            .annotations()
            .iter()
            .filter(|(k, _)| !EXCLUDED_ANNOTATIONS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        RuleConfig {
            name: self.name_any(),
            root_domain: self.spec.root_domain.clone(),
            route_class_name: self.spec.ingress_class_name.clone(),
            tls_secret_name: self.spec.tls_secret_name.clone(),
            name_prefixes: self.spec.service_prefixes.clone(),
            annotations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_camel_case_spec() {
        let rule: AutoIngress = serde_json::from_value(serde_json::json!({
            "apiVersion": "network.operator.com/v1alpha1",
            "kind": "AutoIngress",
            "metadata": { "name": "r1" },
            "spec": {
                "rootDomain": "example.com",
                "ingressClassName": "nginx",
                "servicePrefixes": ["web", "api"],
            },
        }))
        .expect("valid AutoIngress");

        assert_eq!(
            rule.spec,
            AutoIngressSpec {
                root_domain: "example.com".to_string(),
                ingress_class_name: "nginx".to_string(),
                tls_secret_name: None,
                service_prefixes: vec!["web".to_string(), "api".to_string()],
            }
        );
    }

    #[test]
    fn rule_config_drops_kubectl_annotations() {
        let rule = AutoIngress {
            metadata: ObjectMeta {
                name: Some("r1".to_string()),
                annotations: Some(btreemap! {
                    "kubectl.kubernetes.io/last-applied-configuration".to_string() => "{}".to_string(),
                    "cert-manager.io/cluster-issuer".to_string() => "letsencrypt".to_string(),
                }),
                ..Default::default()
            },
            spec: AutoIngressSpec {
                root_domain: "example.com".to_string(),
                ingress_class_name: "nginx".to_string(),
                tls_secret_name: Some("wildcard".to_string()),
                service_prefixes: vec!["web".to_string()],
            },
        };

        assert_eq!(
            rule.rule_config(),
            RuleConfig {
                name: "r1".to_string(),
                root_domain: "example.com".to_string(),
                route_class_name: "nginx".to_string(),
                tls_secret_name: Some("wildcard".to_string()),
                name_prefixes: vec!["web".to_string()],
                annotations: btreemap! {
                    "cert-manager.io/cluster-issuer".to_string() => "letsencrypt".to_string(),
                },
            }
        );
    }
}
