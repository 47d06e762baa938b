use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

use crate::api::endpoint::Verb;
use crate::error::TransportKind;

/// Fixed per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A single request issued to the platform
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub verb: Verb,
    pub url: String,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            verb: Verb::Get,
            url: url.into(),
            body: None,
        }
    }
}

/// Raw reply: HTTP status plus the undecoded body
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Failure below the HTTP layer
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub kind: TransportKind,
    pub message: String,
}

/// Trait for issuing HTTP requests, so the gateway can be driven by a mock
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpReply, TransportFailure>;
}

/// Real transport using a blocking reqwest client
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a client that authenticates with `api_key` and optionally skips TLS verification
    pub fn new(api_key: &str, verify_tls: bool) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("API key contains characters that are not valid in a header")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

fn classify(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_redirect() {
        TransportKind::TooManyRedirects
    } else if err.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpReply, TransportFailure> {
        let builder = match request.verb {
            Verb::Get => self.client.get(&request.url),
            Verb::Post => {
                let builder = self.client.post(&request.url);
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };

        let response = builder.send().map_err(|e| TransportFailure {
            kind: classify(&e),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| TransportFailure {
            kind: classify(&e),
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
pub use mock::MockTransport;

#[cfg(test)]
mod mock {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Scripted = std::result::Result<HttpReply, TransportFailure>;

    struct Route {
        verb: Verb,
        suffix: String,
        replies: VecDeque<Scripted>,
    }

    /// Scripted transport for testing. Routes match on verb and URL suffix;
    /// queued replies are consumed in order and the last one repeats.
    pub struct MockTransport {
        routes: Mutex<Vec<Route>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[allow(dead_code)]
    impl MockTransport {
        pub fn new() -> Self {
            Self {
                routes: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Queue a raw reply for requests whose URL ends with `suffix`
        pub fn on(&self, verb: Verb, suffix: &str, reply: Scripted) -> &Self {
            let mut routes = self.routes.lock().unwrap();
            if let Some(route) = routes
                .iter_mut()
                .find(|r| r.verb == verb && r.suffix == suffix)
            {
                route.replies.push_back(reply);
            } else {
                routes.push(Route {
                    verb,
                    suffix: suffix.to_string(),
                    replies: VecDeque::from(vec![reply]),
                });
            }
            self
        }

        /// Queue a `{status: 200, data}` envelope for `GET /api/<path>`
        pub fn get_data(&self, path: &str, data: Value) -> &Self {
            self.on(Verb::Get, &format!("/api/{}", path), Ok(Self::envelope(200, data)))
        }

        /// Queue a bare `{status}` envelope for `GET /api/<path>`
        pub fn get_status(&self, path: &str, status: i64) -> &Self {
            self.on(
                Verb::Get,
                &format!("/api/{}", path),
                Ok(Self::json_reply(json!({ "status": status }))),
            )
        }

        /// Queue a `{status: 200, data}` envelope for `POST /api/<path>`
        pub fn post_data(&self, path: &str, data: Value) -> &Self {
            self.on(Verb::Post, &format!("/api/{}", path), Ok(Self::envelope(200, data)))
        }

        /// Queue a 201 creation acknowledgment for `POST /api/<path>`
        pub fn post_created(&self, path: &str, record_id: i64) -> &Self {
            self.on(
                Verb::Post,
                &format!("/api/{}", path),
                Ok(Self::json_reply(json!({ "status": 201, "record_id": record_id }))),
            )
        }

        pub fn envelope(status: i64, data: Value) -> HttpReply {
            Self::json_reply(json!({ "status": status, "data": data }))
        }

        pub fn json_reply(body: Value) -> HttpReply {
            HttpReply {
                status: 200,
                body: body.to_string(),
            }
        }

        /// All requests issued so far
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// Number of requests whose URL ends with `suffix`
        pub fn count(&self, verb: Verb, suffix: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.verb == verb && r.url.ends_with(suffix))
                .count()
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl HttpTransport for MockTransport {
        fn execute(&self, request: &HttpRequest) -> Scripted {
            self.requests.lock().unwrap().push(request.clone());

            let mut routes = self.routes.lock().unwrap();
            let route = routes
                .iter_mut()
                .filter(|r| r.verb == request.verb && request.url.ends_with(&r.suffix))
                .max_by_key(|r| r.suffix.len());

            match route {
                Some(route) if route.replies.len() > 1 => route.replies.pop_front().unwrap(),
                Some(route) => route.replies.front().cloned().unwrap(),
                None => Ok(Self::json_reply(
                    json!({ "status": 404, "message": "no mock route" }),
                )),
            }
        }
    }
}
