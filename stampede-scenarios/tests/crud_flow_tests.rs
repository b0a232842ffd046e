//! CRUD lifecycle against a scripted client

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use stampede_config::ScenarioSettings;
use stampede_http::{ApiRequest, HttpClient, HttpMethod, RequestOutcome};
use stampede_runtime::metrics::HTTP_REQ_FAILED;
use stampede_runtime::{tags, Checks, MetricsSink, Tags, VuContext};
use stampede_scenarios::crud::{CRUD_FLOWS_FAILED, CRUD_FLOW_SUCCESS, CRUD_STEPS};
use stampede_scenarios::{crud_flow, CrudStep, ProductApi};
use std::sync::Arc;
use std::time::Duration;

type Responder = dyn Fn(&ApiRequest, &[ApiRequest]) -> (u16, Value) + Send + Sync;

/// Answers from a closure that sees the request and every earlier one
struct ScriptedApi {
    calls: Mutex<Vec<ApiRequest>>,
    respond: Box<Responder>,
}

impl ScriptedApi {
    fn new(respond: impl Fn(&ApiRequest, &[ApiRequest]) -> (u16, Value) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    fn calls(&self) -> Vec<(HttpMethod, String)> {
        self.calls
            .lock()
            .iter()
            .map(|request| (request.method, request.path.clone()))
            .collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedApi {
    async fn execute(&self, request: ApiRequest) -> RequestOutcome {
        let (status, body) = {
            let mut calls = self.calls.lock();
            let answer = (self.respond)(&request, &calls);
            calls.push(request.clone());
            answer
        };
        RequestOutcome {
            method: request.method,
            url: format!("http://api.test{}", request.path),
            status,
            body: if body.is_null() { String::new() } else { body.to_string() },
            elapsed: Duration::from_millis(3),
            error: None,
        }
    }
}

/// A well-behaved API: the item exists until it is deleted
fn healthy(request: &ApiRequest, history: &[ApiRequest]) -> (u16, Value) {
    let deleted = history.iter().any(|call| call.method == HttpMethod::Delete);
    match request.method {
        HttpMethod::Post => {
            let mut body = request.body.clone().unwrap_or_default();
            body["id"] = json!(41);
            (201, body)
        }
        HttpMethod::Get if deleted => (404, json!({"message": "not found"})),
        HttpMethod::Get => {
            // latest written representation
            let latest = history
                .iter()
                .rev()
                .find_map(|call| call.body.clone())
                .unwrap_or_default();
            let mut body = latest;
            body["id"] = json!(41);
            (200, body)
        }
        HttpMethod::Put => {
            let mut body = request.body.clone().unwrap_or_default();
            body["id"] = json!(41);
            (200, body)
        }
        HttpMethod::Delete => (204, Value::Null),
    }
}

fn settings() -> ScenarioSettings {
    ScenarioSettings {
        think_time: Duration::ZERO,
        crud_step_pause: Duration::ZERO,
        ..ScenarioSettings::default()
    }
}

fn context() -> (VuContext, MetricsSink) {
    let sink = MetricsSink::new();
    (VuContext::new("crud_flow", 1, Tags::new(), sink.clone()), sink)
}

/// Step names recorded under CRUD_STEPS, one per sample, sorted
fn step_counts(sink: &MetricsSink) -> Vec<String> {
    let mut steps: Vec<String> = sink
        .series(CRUD_STEPS, &Tags::new())
        .into_iter()
        .flat_map(|series| {
            let step = series.tags.get("step").cloned().unwrap_or_default();
            std::iter::repeat(step).take(series.values.len())
        })
        .collect();
    steps.sort();
    steps
}

#[tokio::test]
async fn test_successful_flow_records_one_success() {
    let client = ScriptedApi::new(healthy);
    let api = ProductApi::new(client.clone(), settings());
    let (ctx, sink) = context();

    let state = crud_flow(&api, &ctx).await;

    assert!(state.success);
    assert_eq!(state.created_id, Some(json!(41)));
    assert_eq!(state.executed, CrudStep::sequence().to_vec());

    let calls = client.calls();
    assert_eq!(
        calls,
        vec![
            (HttpMethod::Post, "/products".to_string()),
            (HttpMethod::Get, "/products/41".to_string()),
            (HttpMethod::Put, "/products/41".to_string()),
            (HttpMethod::Get, "/products/41".to_string()),
            (HttpMethod::Delete, "/products/41".to_string()),
            (HttpMethod::Get, "/products/41".to_string()),
        ]
    );

    assert_eq!(sink.values(CRUD_FLOW_SUCCESS, &Tags::new()), vec![1.0]);
    assert!(sink.values(CRUD_FLOWS_FAILED, &Tags::new()).is_empty());
    assert_eq!(
        step_counts(&sink),
        vec!["create", "delete", "read", "read_verify", "update", "verify_deleted"]
    );
    assert!(Checks::summarize(&sink).iter().all(|check| check.fails == 0));

    // the expected 404 is not a failed request
    let verify = tags(&[("endpoint", "verify_deleted")]);
    assert_eq!(sink.values(HTTP_REQ_FAILED, &verify), vec![0.0]);
}

#[tokio::test]
async fn test_create_failure_aborts_flow() {
    let client = ScriptedApi::new(|_, _| (500, json!({"error": "boom"})));
    let api = ProductApi::new(client.clone(), settings());
    let (ctx, sink) = context();

    let state = crud_flow(&api, &ctx).await;

    assert!(!state.success);
    assert_eq!(state.created_id, None);
    assert_eq!(state.executed, vec![CrudStep::Create]);
    assert_eq!(client.calls().len(), 1);

    assert_eq!(sink.values(CRUD_FLOW_SUCCESS, &Tags::new()), vec![0.0]);
    assert_eq!(sink.values(CRUD_FLOWS_FAILED, &Tags::new()), vec![1.0]);
    assert_eq!(step_counts(&sink), vec!["create"]);
}

#[tokio::test]
async fn test_create_without_id_aborts_flow() {
    let client = ScriptedApi::new(|_, _| (201, json!({"name": "x", "price": 1})));
    let api = ProductApi::new(client.clone(), settings());
    let (ctx, _) = context();

    let state = crud_flow(&api, &ctx).await;

    assert!(!state.success);
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn test_item_surviving_delete_fails_flow() {
    // DELETE reports success but the item is still served afterwards
    let client = ScriptedApi::new(|request, history| match request.method {
        HttpMethod::Delete => (204, Value::Null),
        _ => {
            let history: Vec<ApiRequest> = history
                .iter()
                .filter(|call| call.method != HttpMethod::Delete)
                .cloned()
                .collect();
            healthy(request, &history)
        }
    });
    let api = ProductApi::new(client.clone(), settings());
    let (ctx, sink) = context();

    let state = crud_flow(&api, &ctx).await;

    assert!(!state.success);
    assert_eq!(state.executed.len(), 6);
    assert_eq!(sink.values(CRUD_FLOW_SUCCESS, &Tags::new()), vec![0.0]);

    let checks = Checks::summarize(&sink);
    let delete = checks
        .iter()
        .find(|check| check.name == "delete status is 200 or 204")
        .unwrap();
    assert_eq!(delete.fails, 0);
    let gone = checks
        .iter()
        .find(|check| check.name == "deleted item returns 404")
        .unwrap();
    assert_eq!(gone.fails, 1);
}

#[tokio::test]
async fn test_failed_read_continues_flow() {
    // first read after create fails, everything else behaves
    let client = ScriptedApi::new(|request, history| {
        let reads = history
            .iter()
            .filter(|call| call.method == HttpMethod::Get)
            .count();
        if request.method == HttpMethod::Get && reads == 0 {
            return (503, json!({"message": "unavailable"}));
        }
        healthy(request, history)
    });
    let api = ProductApi::new(client.clone(), settings());
    let (ctx, sink) = context();

    let state = crud_flow(&api, &ctx).await;

    assert!(!state.success);
    assert_eq!(client.calls().len(), 6);
    assert_eq!(state.executed, CrudStep::sequence().to_vec());
    assert_eq!(sink.values(CRUD_FLOW_SUCCESS, &Tags::new()), vec![0.0]);
    assert_eq!(sink.values(CRUD_FLOWS_FAILED, &Tags::new()), vec![1.0]);
}
