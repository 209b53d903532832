use super::*;
use autoingress_controller_core::{RouteSpec, ROUTE_FINALIZER};
use pretty_assertions::assert_eq;

fn web_r1() -> RouteSpec {
    RouteSpec::build(&svc("default", "web", 80), &rule("r1", &["web"])).expect("has ports")
}

fn stored_route(spec: RouteSpec) -> RouteRecord {
    let mut route = RouteRecord::new(spec);
    route.add_finalizer();
    route
}

#[tokio::test]
async fn ensure_creates_route_with_finalizer() {
    let h = Harness::new();
    let spec = web_r1();

    assert!(h.convergence.ensure_route(&spec).await);

    assert_eq!(
        h.store.ops(),
        vec![
            Op::GetRoute("default/web--r1".to_string()),
            Op::CreateRoute("default/web--r1".to_string()),
            Op::UpdateRoute {
                route: "default/web--r1".to_string(),
                finalized: true,
            },
        ]
    );
    let stored = h.store.route("default", "web--r1").expect("route must exist");
    assert_eq!(stored.spec, spec);
    assert_eq!(stored.finalizers, vec![ROUTE_FINALIZER.to_string()]);
    assert_eq!(h.metrics.ensure_count(true), 1);
}

#[tokio::test]
async fn ensure_is_idempotent() {
    let h = Harness::new();
    let spec = web_r1();

    assert!(h.convergence.ensure_route(&spec).await);
    h.store.clear_ops();
    assert!(h.convergence.ensure_route(&spec).await);

    // The second pass updates in place rather than creating.
    assert_eq!(
        h.store.ops(),
        vec![
            Op::GetRoute("default/web--r1".to_string()),
            Op::UpdateRoute {
                route: "default/web--r1".to_string(),
                finalized: true,
            },
        ]
    );
    assert_eq!(h.store.route_names(), vec!["default/web--r1".to_string()]);
    let stored = h.store.route("default", "web--r1").expect("route must exist");
    assert_eq!(stored.spec, spec);
    assert_eq!(stored.finalizers, vec![ROUTE_FINALIZER.to_string()]);
}

#[tokio::test]
async fn ensure_reverts_out_of_band_edits() {
    let h = Harness::new();
    let spec = web_r1();

    let mut edited = spec.clone();
    edited.host = "hijacked.example.org".to_string();
    edited.backend.port = 8080;
    h.store.put_route(RouteRecord::new(edited));

    assert!(h.convergence.ensure_route(&spec).await);

    let stored = h.store.route("default", "web--r1").expect("route must exist");
    assert_eq!(stored.spec, spec);
    assert!(stored.has_finalizer());
}

#[tokio::test]
async fn ensure_keeps_foreign_finalizers() {
    let h = Harness::new();
    let spec = web_r1();

    let mut route = stored_route(spec.clone());
    route.finalizers.insert(0, "example.com/audit".to_string());
    h.store.put_route(route);

    assert!(h.convergence.ensure_route(&spec).await);

    let stored = h.store.route("default", "web--r1").expect("route must exist");
    assert_eq!(
        stored.finalizers,
        vec!["example.com/audit".to_string(), ROUTE_FINALIZER.to_string()]
    );
}

#[tokio::test]
async fn ensure_stops_after_failed_lookup() {
    let h = Harness::new();
    h.store.fail(Fail::GetRoute);

    assert!(!h.convergence.ensure_route(&web_r1()).await);

    assert_eq!(
        h.store.ops(),
        vec![Op::GetRoute("default/web--r1".to_string())]
    );
    assert_eq!(h.metrics.ensure_count(false), 1);
}

#[tokio::test]
async fn ensure_reports_failed_create() {
    let h = Harness::new();
    h.store.fail(Fail::CreateRoute);

    assert!(!h.convergence.ensure_route(&web_r1()).await);
    assert!(h.store.route("default", "web--r1").is_none());
}

#[tokio::test]
async fn ensure_reports_conflicting_update() {
    let h = Harness::new();
    h.store.put_route(stored_route(web_r1()));
    h.store.fail(Fail::ConflictOnUpdate);

    assert!(!h.convergence.ensure_route(&web_r1()).await);
}

#[tokio::test]
async fn ensure_releases_terminating_route() {
    let h = Harness::new();
    let mut route = stored_route(web_r1());
    route.finalizers.insert(0, "example.com/audit".to_string());
    route.terminating = true;
    h.store.put_route(route);

    assert!(!h.convergence.ensure_route(&web_r1()).await);

    assert_eq!(
        h.store.ops(),
        vec![
            Op::GetRoute("default/web--r1".to_string()),
            Op::UpdateRoute {
                route: "default/web--r1".to_string(),
                finalized: false,
            },
        ]
    );
    let stored = h.store.route("default", "web--r1").expect("route must remain");
    assert_eq!(stored.finalizers, vec!["example.com/audit".to_string()]);
    assert!(stored.terminating);
    assert_eq!(h.metrics.ensure_count(false), 1);
}

#[tokio::test]
async fn ensure_does_not_write_to_released_terminating_route() {
    let h = Harness::new();
    let mut route = RouteRecord::new(web_r1());
    route.finalizers.push("example.com/audit".to_string());
    route.terminating = true;
    h.store.put_route(route);

    assert!(!h.convergence.ensure_route(&web_r1()).await);

    assert!(!h.store.mutated());
    let stored = h.store.route("default", "web--r1").expect("route must remain");
    assert!(!stored.has_finalizer());
}

#[tokio::test]
async fn ensure_matching_skips_non_matching_services() {
    let h = Harness::new();

    assert!(
        h.convergence
            .ensure_matching(&svc("default", "api", 80), &rule("r1", &["web"]))
            .await
    );
    assert!(h.store.ops().is_empty());
}

#[tokio::test]
async fn ensure_matching_skips_services_without_ports() {
    let h = Harness::new();
    let headless = ServiceDescriptor {
        ports: vec![],
        ..svc("default", "web", 80)
    };

    assert!(
        h.convergence
            .ensure_matching(&headless, &rule("r1", &["web"]))
            .await
    );
    assert!(h.store.ops().is_empty());
}

#[tokio::test]
async fn delete_absent_route_is_noop() {
    let h = Harness::new();

    h.convergence
        .delete_route("default", "web--r1")
        .await
        .expect("deleting an absent route must succeed");

    assert_eq!(
        h.store.ops(),
        vec![Op::GetRoute("default/web--r1".to_string())]
    );
    assert!(!h.store.mutated());
}

#[tokio::test]
async fn delete_releases_finalizer_before_deleting() {
    let h = Harness::new();
    h.store.put_route(stored_route(web_r1()));

    h.convergence
        .delete_route("default", "web--r1")
        .await
        .expect("delete must succeed");

    assert_eq!(
        h.store.ops(),
        vec![
            Op::GetRoute("default/web--r1".to_string()),
            Op::UpdateRoute {
                route: "default/web--r1".to_string(),
                finalized: false,
            },
            Op::DeleteRoute("default/web--r1".to_string()),
        ]
    );
    assert!(h.store.route("default", "web--r1").is_none());
    assert_eq!(h.metrics.delete_count(true), 1);
}

#[tokio::test]
async fn delete_aborts_when_finalizer_cannot_be_released() {
    let h = Harness::new();
    h.store.put_route(stored_route(web_r1()));
    h.store.fail(Fail::UpdateRoute);

    h.convergence
        .delete_route("default", "web--r1")
        .await
        .expect_err("delete must fail");

    assert!(!h
        .store
        .ops()
        .contains(&Op::DeleteRoute("default/web--r1".to_string())));
    let stored = h.store.route("default", "web--r1").expect("route must remain");
    assert!(stored.has_finalizer());
    assert_eq!(h.metrics.delete_count(false), 1);
}

#[tokio::test]
async fn delete_reports_failed_delete() {
    let h = Harness::new();
    h.store.put_route(stored_route(web_r1()));
    h.store.fail(Fail::DeleteRoute);

    h.convergence
        .delete_route("default", "web--r1")
        .await
        .expect_err("delete must fail");

    h.store.heal();
    h.convergence
        .delete_route("default", "web--r1")
        .await
        .expect("retrying the delete must succeed");
    assert!(h.store.route("default", "web--r1").is_none());
}
