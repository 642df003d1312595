//! In-memory backend.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use metricops::api::{ApiError, ApiRequest, Method, Transport};

/// Collections addressed by name instead of id.
const NAME_ADDRESSED: &[&str] = &["metrics", "sources"];

#[derive(Default)]
struct State {
    next_id: u64,
    /// Collection path -> items, in creation order.
    collections: BTreeMap<String, Vec<Value>>,
    requests: Vec<ApiRequest>,
    /// Requests whose path starts with the key fail with the value.
    failures: Vec<(Method, String, ApiError)>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A tiny account behind the management API.
///
/// Knows offset-paged collections, bare-array chart lists, keyset-paged
/// alerts, name-addressed metrics and sources, and assigns ids on create
/// (including stream ids, as the real service does).
#[derive(Default)]
pub struct FakeAccount {
    state: Mutex<State>,
}

impl FakeAccount {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                next_id: 100,
                ..Default::default()
            }),
        })
    }

    /// Stores `item` in `collection`, assigning an id when the collection is
    /// id-addressed. Returns the stored item.
    pub fn seed(&self, collection: &str, item: Value) -> Value {
        let mut state = self.state.lock().unwrap();
        let stored = prepare(&mut state, collection, item);
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(stored.clone());
        stored
    }

    /// Makes matching requests fail.
    pub fn fail(&self, method: Method, path_prefix: &str, error: ApiError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((method, path_prefix.to_string(), error));
    }

    pub fn items(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Position of the first request matching `method` and `path`.
    pub fn position(&self, method: Method, path: &str) -> Option<usize> {
        self.requests()
            .iter()
            .position(|r| r.method == method && r.path == path)
    }
}

fn is_name_addressed(collection: &str) -> bool {
    NAME_ADDRESSED.contains(&collection)
}

fn prepare(state: &mut State, collection: &str, item: Value) -> Value {
    let mut item = match item {
        Value::Object(fields) => fields,
        other => return other,
    };

    if !is_name_addressed(collection) && !item.contains_key("id") {
        item.insert("id".to_string(), json!(state.next_id()));
    }
    if collection.ends_with("/charts") {
        item.entry("type").or_insert_with(|| json!("line"));
        if let Some(Value::Array(streams)) = item.get_mut("streams") {
            for stream in streams.iter_mut() {
                if let Value::Object(stream) = stream {
                    if !stream.contains_key("id") {
                        stream.insert("id".to_string(), json!(state.next_id()));
                    }
                }
            }
        }
    }
    Value::Object(item)
}

fn key_matches(collection: &str, item: &Value, key: &str) -> bool {
    if is_name_addressed(collection) {
        item.get("name").and_then(Value::as_str) == Some(key)
    } else {
        match item.get("id") {
            Some(Value::Number(id)) => id.to_string() == key,
            _ => false,
        }
    }
}

fn list_body(collection: &str, items: Vec<Value>) -> Value {
    if collection.ends_with("/charts") {
        return Value::Array(items);
    }

    let list_key = collection.rsplit('/').next().unwrap_or(collection);
    if list_key == "alerts" {
        return json!({"query": {}, list_key: items});
    }

    let found = items.len();
    json!({
        "query": {"offset": 0, "length": found, "found": found, "total": found},
        list_key: items,
    })
}

fn handle(state: &mut State, request: &ApiRequest) -> Result<Option<Value>, ApiError> {
    let not_found = || ApiError::NotFound {
        path: request.path.clone(),
    };

    let segments: Vec<&str> = request.path.split('/').collect();
    if segments.len() % 2 == 1 {
        let collection = request.path.as_str();
        return match request.method {
            Method::Get => {
                let name = request.query.get("name");
                let items = state
                    .collections
                    .get(collection)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|item| match name {
                        // Server-side filtering is a substring match.
                        Some(name) => item
                            .get("name")
                            .and_then(Value::as_str)
                            .is_some_and(|n| n.contains(name)),
                        None => true,
                    })
                    .collect();
                Ok(Some(list_body(collection, items)))
            }
            Method::Post => {
                let body = request.body.clone().unwrap_or(Value::Object(Map::new()));
                let stored = prepare(state, collection, body);
                state
                    .collections
                    .entry(collection.to_string())
                    .or_default()
                    .push(stored.clone());
                Ok(Some(stored))
            }
            _ => Err(ApiError::Status {
                status: 405,
                body: String::new(),
            }),
        };
    }

    let (collection, key) = match request.path.rsplit_once('/') {
        Some(split) => split,
        None => return Err(not_found()),
    };
    let items = state.collections.entry(collection.to_string()).or_default();
    let index = items.iter().position(|item| key_matches(collection, item, key));

    match (request.method, index) {
        (Method::Get, Some(i)) => Ok(Some(items[i].clone())),
        (Method::Delete, Some(i)) => {
            // Deleting a space takes its charts with it.
            items.remove(i);
            state.collections.remove(&format!("{}/charts", request.path));
            Ok(None)
        }
        (Method::Put, Some(i)) => {
            let mut updated = request.body.clone().unwrap_or(Value::Object(Map::new()));
            if let (Value::Object(fields), Some(id)) = (&mut updated, items[i].get("id")) {
                fields.insert("id".to_string(), id.clone());
            }
            items[i] = updated.clone();
            Ok(Some(updated))
        }
        (Method::Put, None) if is_name_addressed(collection) => {
            let body = request.body.clone().unwrap_or(Value::Object(Map::new()));
            items.push(body);
            // Name-addressed creates answer with an empty body.
            Ok(None)
        }
        _ => Err(not_found()),
    }
}

#[async_trait]
impl Transport for FakeAccount {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        let failure = state.failures.iter().find(|(method, prefix, _)| {
            *method == request.method && request.path.starts_with(prefix.as_str())
        });
        if let Some((_, _, error)) = failure {
            return Err(error.clone());
        }

        handle(&mut state, &request)
    }
}
