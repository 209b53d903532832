use std::collections::BTreeMap;

/// Selects services by name prefix and shapes the routes generated for them.
///
/// Rules are identified by `name`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleConfig {
    pub name: String,
    pub root_domain: String,
    pub route_class_name: String,
    pub tls_secret_name: Option<String>,
    pub name_prefixes: Vec<String>,
    pub annotations: BTreeMap<String, String>,
}

// === impl RuleConfig ===

impl RuleConfig {
    /// A rule without prefixes can never match a service.
    pub fn is_inert(&self) -> bool {
        self.name_prefixes.is_empty()
    }

    /// Returns true if `service_name` begins with one of the rule's prefixes.
    pub fn matches(&self, service_name: &str) -> bool {
        self.name_prefixes
            .iter()
            .any(|prefix| service_name.starts_with(prefix.as_str()))
    }

    pub fn tls_secret(&self) -> Option<&str> {
        self.tls_secret_name.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rule(prefixes: &[&str]) -> RuleConfig {
        RuleConfig {
            name: "r1".to_string(),
            root_domain: "example.com".to_string(),
            name_prefixes: prefixes.iter().map(ToString::to_string).collect(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(&["web"], "web", true)]
    #[case(&["web"], "web-frontend", true)]
    #[case(&["web"], "api", false)]
    #[case(&["api", "web"], "web", true)]
    #[case(&["Web"], "web", false)]
    #[case(&[], "web", false)]
    fn prefix_match(#[case] prefixes: &[&str], #[case] service: &str, #[case] expected: bool) {
        assert_eq!(rule(prefixes).matches(service), expected);
    }

    #[test]
    fn empty_prefix_list_is_inert() {
        assert!(rule(&[]).is_inert());
        assert!(!rule(&["web"]).is_inert());
    }

    #[test]
    fn empty_tls_secret_is_ignored() {
        let mut r = rule(&["web"]);
        assert_eq!(r.tls_secret(), None);
        r.tls_secret_name = Some(String::new());
        assert_eq!(r.tls_secret(), None);
        r.tls_secret_name = Some("wildcard-tls".to_string());
        assert_eq!(r.tls_secret(), Some("wildcard-tls"));
    }
}
