//! Scripted in-memory transport
//!
//! Routes are keyed by method and path (query string included when the
//! route was registered with one). Each route holds a queue of replies;
//! the last reply is repeated once the queue is drained.
//!
//! ```ignore
//! let mock = MockTransport::new();
//! mock.reply(HttpMethod::Get, "/api/v1/sets/orders", 200, ok(json!({"name": "orders"})));
//! ```

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// One scripted answer
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(HttpResponse),
    Failure(TransportError),
    /// Never answers; exercises the client timeout
    Stall,
}

/// `{"success": true, "data": data}`
pub fn ok(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

/// `{"success": false, "error": message, "code": code}`
pub fn failure(code: &str, message: &str) -> Value {
    json!({ "success": false, "error": message, "code": code })
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(HttpMethod, String), VecDeque<MockReply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method path`.
    pub fn push(&self, method: HttpMethod, path: &str, reply: MockReply) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes
                .entry((method, path.to_string()))
                .or_default()
                .push_back(reply);
        }
        self
    }

    /// Queue a JSON response.
    pub fn reply(&self, method: HttpMethod, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, MockReply::Response(HttpResponse::new(status, body)))
    }

    /// Queue a transport failure.
    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) -> &Self {
        self.push(method, path, MockReply::Failure(error))
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Requests received for `method path` (query ignored)
    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && strip_query(r.path()) == path)
            .collect()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    fn next_reply(&self, method: HttpMethod, path: &str) -> Option<MockReply> {
        let mut routes = self.routes.lock().ok()?;
        let queue = match routes.get_mut(&(method, path.to_string())) {
            Some(queue) => queue,
            None => routes.get_mut(&(method, strip_query(path).to_string()))?,
        };
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn strip_query(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method;
        let path = request.path().to_string();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match self.next_reply(method, &path) {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Failure(error)) => Err(error),
            Some(MockReply::Stall) => std::future::pending().await,
            None => Ok(HttpResponse::new(
                404,
                failure("ROUTE_NOT_MOCKED", &format!("No route for {} {}", method, path)),
            )),
        }
    }
}
