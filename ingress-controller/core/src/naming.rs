//! Naming contract for generated routes.
//!
//! These formats are shared with routes that already exist in clusters and
//! must not change.

use crate::{RuleConfig, ServiceDescriptor};

/// Separates the service and rule parts of a route name.
pub const NAME_SEPARATOR: &str = "--";

/// Separates the service name and namespace in a route host.
const HOST_SEPARATOR: &str = "---";

/// `<service>--<rule>`
pub fn route_name(service_name: &str, rule_name: &str) -> String {
    format!("{service_name}{NAME_SEPARATOR}{rule_name}")
}

/// `<service>---<namespace>.<root domain>`
pub fn route_host(service: &ServiceDescriptor, rule: &RuleConfig) -> String {
    format!(
        "{}{HOST_SEPARATOR}{}.{}",
        service.name, service.namespace, rule.root_domain
    )
}

/// Recovers the service name from a route generated for `rule_name`.
///
/// Returns `None` if the route was not derived from that rule.
pub fn service_name_for<'r>(route_name: &'r str, rule_name: &str) -> Option<&'r str> {
    route_name
        .strip_suffix(rule_name)?
        .strip_suffix(NAME_SEPARATOR)
        .filter(|name| !name.is_empty())
}

/// Splits a route name on the first separator.
pub fn split_route_name(route_name: &str) -> Option<(&str, &str)> {
    route_name
        .split_once(NAME_SEPARATOR)
        .filter(|(svc, rule)| !svc.is_empty() && !rule.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_hosts() {
        let svc = ServiceDescriptor {
            name: "web".to_string(),
            namespace: "default".to_string(),
            ..Default::default()
        };
        let rule = RuleConfig {
            name: "r1".to_string(),
            root_domain: "example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(route_name(&svc.name, &rule.name), "web--r1");
        assert_eq!(route_host(&svc, &rule), "web---default.example.com");
    }

    #[test]
    fn recovers_service_name_with_separator() {
        assert_eq!(service_name_for("web--r1", "r1"), Some("web"));
        assert_eq!(service_name_for("my--web--r1", "r1"), Some("my--web"));
        assert_eq!(service_name_for("web--r1", "r2"), None);
        assert_eq!(service_name_for("webr1", "r1"), None);
        assert_eq!(service_name_for("--r1", "r1"), None);
    }

    #[test]
    fn split_on_first_separator() {
        assert_eq!(split_route_name("web--r1"), Some(("web", "r1")));
        assert_eq!(split_route_name("web"), None);
        assert_eq!(split_route_name("web--"), None);
    }
}
