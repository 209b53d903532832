use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

#[derive(Clone, Debug)]
pub struct ConvergenceMetrics {
    ensured: Family<ResultLabels, Counter>,
    deleted: Family<ResultLabels, Counter>,
}

#[derive(Clone, Debug)]
pub struct QueueMetrics {
    retried: Family<KindLabels, Counter>,
    dropped: Family<KindLabels, Counter>,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct ResultLabels {
    result: &'static str,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct KindLabels {
    kind: &'static str,
}

// === impl ConvergenceMetrics ===

impl ConvergenceMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let ensured = Family::<ResultLabels, Counter>::default();
        reg.register(
            "route_ensure",
            "Count of attempts to converge a route toward its desired state",
            ensured.clone(),
        );

        let deleted = Family::<ResultLabels, Counter>::default();
        reg.register(
            "route_delete",
            "Count of attempts to delete a route",
            deleted.clone(),
        );

        Self { ensured, deleted }
    }

    pub(crate) fn ensure(&self, ok: bool) {
        self.ensured.get_or_create(&ResultLabels::new(ok)).inc();
    }

    pub(crate) fn delete(&self, ok: bool) {
        self.deleted.get_or_create(&ResultLabels::new(ok)).inc();
    }

    #[cfg(test)]
    pub(crate) fn ensure_count(&self, ok: bool) -> u64 {
        self.ensured.get_or_create(&ResultLabels::new(ok)).get()
    }

    #[cfg(test)]
    pub(crate) fn delete_count(&self, ok: bool) -> u64 {
        self.deleted.get_or_create(&ResultLabels::new(ok)).get()
    }
}

impl ResultLabels {
    fn new(ok: bool) -> Self {
        Self {
            result: if ok { "ok" } else { "error" },
        }
    }
}

// === impl QueueMetrics ===

impl QueueMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let retried = Family::<KindLabels, Counter>::default();
        reg.register(
            "event_retries",
            "Count of events requeued after a failed attempt",
            retried.clone(),
        );

        let dropped = Family::<KindLabels, Counter>::default();
        reg.register(
            "event_dropped",
            "Count of events abandoned after exhausting retries",
            dropped.clone(),
        );

        Self { retried, dropped }
    }

    pub(crate) fn retried(&self, kind: &'static str) {
        self.retried.get_or_create(&KindLabels { kind }).inc();
    }

    pub(crate) fn dropped(&self, kind: &'static str) {
        self.dropped.get_or_create(&KindLabels { kind }).inc();
    }

    #[cfg(test)]
    pub(crate) fn retried_count(&self, kind: &'static str) -> u64 {
        self.retried.get_or_create(&KindLabels { kind }).get()
    }

    #[cfg(test)]
    pub(crate) fn dropped_count(&self, kind: &'static str) -> u64 {
        self.dropped.get_or_create(&KindLabels { kind }).get()
    }
}
