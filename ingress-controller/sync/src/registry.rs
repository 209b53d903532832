use autoingress_controller_core::RuleConfig;
use parking_lot::RwLock;
use std::sync::Arc;

pub type SharedRegistry = Arc<RuleRegistry>;

/// The set of active rules, in registration order.
///
/// Every read and write goes through one lock. Readers take a snapshot and
/// release the lock before talking to a store.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: RwLock<Vec<Arc<RuleConfig>>>,
}

// === impl RuleRegistry ===

impl RuleRegistry {
    pub fn shared() -> SharedRegistry {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> Vec<Arc<RuleConfig>> {
        self.rules.read().clone()
    }

    /// Registers `rule`, replacing any rule with the same name in place.
    /// Returns the replaced rule.
    pub fn upsert(&self, rule: Arc<RuleConfig>) -> Option<Arc<RuleConfig>> {
        let mut rules = self.rules.write();
        match rules.iter_mut().find(|r| r.name == rule.name) {
            Some(slot) => Some(std::mem::replace(slot, rule)),
            None => {
                rules.push(rule);
                None
            }
        }
    }

    pub fn remove(&self, name: &str) -> Option<Arc<RuleConfig>> {
        let mut rules = self.rules.write();
        let idx = rules.iter().position(|r| r.name == name)?;
        Some(rules.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<Arc<RuleConfig>> {
        self.rules.read().iter().find(|r| r.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}
