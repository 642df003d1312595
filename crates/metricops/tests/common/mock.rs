//! Scripted transport.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use metricops::api::{ApiError, ApiRequest, FieldError, Method, Transport};

type Response = Result<Option<Value>, ApiError>;

/// Answers requests from per-`(method, path)` queues.
///
/// Queued responses are consumed in order; the last one keeps answering.
/// Requests without a scripted response get `NotFound`.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(Method, String), VecDeque<Response>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a response for `method path`.
    pub fn on(&self, method: Method, path: &str, response: Response) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub fn ok(&self, method: Method, path: &str, body: Value) -> &Self {
        self.on(method, path, Ok(Some(body)))
    }

    pub fn empty(&self, method: Method, path: &str) -> &Self {
        self.on(method, path, Ok(None))
    }

    pub fn fail(&self, method: Method, path: &str, error: ApiError) -> &Self {
        self.on(method, path, Err(error))
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Requests other than `GET`.
    pub fn mutations(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::Get)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(&(request.method, request.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ApiError::NotFound {
                path: request.path.clone(),
            }),
        }
    }
}

/// A `400` with one error on `field`.
pub fn validation_error(field: &str, message: &str) -> ApiError {
    ApiError::Validation {
        status: 400,
        errors: vec![FieldError {
            category: "params".to_string(),
            field: Some(field.to_string()),
            message: message.to_string(),
        }],
    }
}

/// Body of an offset-paged list response holding all of `items`.
pub fn offset_page(list_key: &str, items: Vec<Value>) -> Value {
    let found = items.len();
    serde_json::json!({
        "query": {"offset": 0, "length": found, "found": found, "total": found},
        list_key: items,
    })
}
