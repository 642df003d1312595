//! Staged apply of a canonical config.

mod common;

use serde_json::{json, Value};

use common::mock::{offset_page, validation_error};
use common::{FakeAccount, MockTransport};
use metricops::api::{ApiError, Method};
use metricops::apply::Action;
use metricops::{normalize, Applier, ApplyError, CanonicalConfig, Client, RawConfig, ResourceKind};

fn canonical(value: Value) -> CanonicalConfig {
    let raw: RawConfig = serde_json::from_value(value).unwrap();
    normalize(&raw).unwrap()
}

#[tokio::test]
async fn test_outdated_not_found_is_not_a_failure() {
    let mock = MockTransport::new();
    mock.fail(
        Method::Delete,
        "metrics/gone",
        ApiError::NotFound {
            path: "metrics/gone".to_string(),
        },
    );
    mock.empty(Method::Delete, "metrics/present");

    let client = Client::new(mock.clone());
    let report = Applier::new(&client)
        .apply(&canonical(json!({
            "outdated": {"metrics": ["gone", "present"]}
        })))
        .await
        .unwrap();

    assert_eq!(report.absent, 1);
    assert_eq!(report.deleted, 1);
}

#[tokio::test]
async fn test_outdated_other_failure_is_counted() {
    let mock = MockTransport::new();
    mock.fail(
        Method::Delete,
        "metrics/broken",
        ApiError::Status {
            status: 500,
            body: "oops".to_string(),
        },
    );
    mock.empty(Method::Delete, "metrics/fine");

    let client = Client::new(mock.clone());
    let err = Applier::new(&client)
        .apply(&canonical(json!({
            "outdated": {"metrics": ["broken", "fine", "never-existed"]}
        })))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "1 resource operation(s) failed");
    let ApplyError::Failed { count, failures } = err;
    assert_eq!(count, 1);
    assert_eq!(failures[0].kind, ResourceKind::Metric);
    assert_eq!(failures[0].identifier, "broken");
    assert_eq!(failures[0].action, Action::Delete);
    assert!(failures[0].message.contains("500"));
}

#[tokio::test]
async fn test_outdated_space_deleted_by_resolved_id() {
    let account = FakeAccount::new();
    let space = account.seed("spaces", json!({"name": "Legacy"}));

    let client = Client::new(account.clone());
    let report = Applier::new(&client)
        .apply(&canonical(json!({
            "outdated": {"spaces": ["Legacy", "Never existed"], "services": [{"title": "old pager"}]}
        })))
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.absent, 2);
    assert!(account
        .position(Method::Delete, &format!("spaces/{}", space["id"]))
        .is_some());
    assert!(account.items("spaces").is_empty());
}

#[tokio::test]
async fn test_upsert_creates_and_updates() {
    let account = FakeAccount::new();
    let pager = account.seed("services", json!({"title": "pager", "type": "pagerduty"}));
    account.seed("metrics", json!({"name": "cpu", "period": 30}));

    let client = Client::new(account.clone());
    let report = Applier::new(&client)
        .apply(&canonical(json!({
            "metrics": [{"name": "cpu", "period": 60}, {"name": "mem", "period": 60}],
            "services": [
                {"title": "pager", "type": "pagerduty", "settings": {"key": "k2"}},
                {"title": "chat", "type": "slack"}
            ]
        })))
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.updated, 2);

    assert!(account
        .position(Method::Put, &format!("services/{}", pager["id"]))
        .is_some());
    assert!(account.position(Method::Post, "services").is_some());
    assert!(account.position(Method::Put, "metrics/mem").is_some());

    let cpu = account
        .items("metrics")
        .into_iter()
        .find(|m| m["name"] == "cpu")
        .unwrap();
    assert_eq!(cpu["period"], 60);
}

#[tokio::test]
async fn test_stages_run_in_order() {
    let account = FakeAccount::new();
    account.seed("metrics", json!({"name": "old.metric"}));

    let client = Client::new(account.clone());
    Applier::new(&client)
        .apply(&canonical(json!({
            "metrics": [{"name": "new.metric"}],
            "services": [{"title": "pager", "type": "pagerduty"}],
            "spaces": [{"name": "Ops", "charts": [{"name": "new", "streams": [{"metric": "new.metric"}]}]}],
            "alerts": [{"name": "new.metric.high", "conditions": [{"type": "above", "threshold": 1}]}],
            "outdated": {"metrics": ["old.metric"]}
        })))
        .await
        .unwrap();

    let outdated = account.position(Method::Delete, "metrics/old.metric").unwrap();
    let metric = account.position(Method::Put, "metrics/new.metric").unwrap();
    let service = account.position(Method::Post, "services").unwrap();
    let space = account.position(Method::Post, "spaces").unwrap();
    let alert = account.position(Method::Post, "alerts").unwrap();

    assert!(outdated < metric.min(service));
    assert!(metric.max(service) < space.min(alert));

    // Stage 2 lookups start only after the outdated delete settled.
    let requests = account.requests();
    let first_lookup = requests
        .iter()
        .position(|r| r.path == "metrics/new.metric")
        .unwrap();
    assert!(outdated < first_lookup);
}

#[tokio::test]
async fn test_failures_do_not_stop_siblings_or_later_stages() {
    let account = FakeAccount::new();
    account.fail(
        Method::Put,
        "metrics/bad",
        validation_error("period", "must be positive"),
    );

    let client = Client::new(account.clone());
    let err = Applier::new(&client)
        .apply(&canonical(json!({
            "metrics": [{"name": "bad"}, {"name": "good"}],
            "spaces": [{"name": "Ops", "charts": []}]
        })))
        .await
        .unwrap_err();

    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].identifier, "bad");
    assert_eq!(err.failures()[0].action, Action::Upsert);
    assert!(err.failures()[0].message.contains("params.period: must be positive"));

    assert!(account.position(Method::Put, "metrics/good").is_some());
    assert_eq!(account.items("spaces").len(), 1);
}

#[tokio::test]
async fn test_space_failure_reported_once_with_chart_detail() {
    let mock = MockTransport::new();
    mock.ok(
        Method::Get,
        "spaces",
        offset_page("spaces", vec![json!({"id": 7, "name": "Ops"})]),
    );
    mock.ok(Method::Get, "spaces/7/charts", json!([]));
    mock.fail(
        Method::Post,
        "spaces/7/charts",
        validation_error("streams", "is empty"),
    );

    let client = Client::new(mock.clone());
    let err = Applier::new(&client)
        .apply(&canonical(json!({
            "spaces": [{"name": "Ops", "charts": [{"name": "a"}, {"name": "b"}]}]
        })))
        .await
        .unwrap_err();

    let failures = err.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, ResourceKind::Space);
    assert_eq!(failures[0].action, Action::Reconcile);
    assert!(failures[0].message.contains("create chart 'a'"));
    assert!(failures[0].message.contains("create chart 'b'"));
}

#[tokio::test]
async fn test_empty_config_sends_nothing() {
    let mock = MockTransport::new();
    let client = Client::new(mock.clone());

    let report = Applier::new(&client)
        .apply(&CanonicalConfig::default())
        .await
        .unwrap();

    assert_eq!(report, Default::default());
    assert!(mock.requests().is_empty());
}

#[test]
fn test_config_errors_stop_before_apply() {
    let raw: RawConfig = serde_json::from_value(json!({
        "metrics": [{"name": "__default__"}, {"name": "__default__"}],
        "outdated": {"metrics": ["x"]}
    }))
    .unwrap();

    assert!(normalize(&raw).is_err());
}
