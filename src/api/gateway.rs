use serde_json::Value;
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, warn};

use super::endpoint::Verb;
use crate::error::{ImportError, ImportResult};
use crate::traits::{HttpRequest, HttpTransport};

/// How many times an unauthorized envelope is retried before giving up
pub const MAX_UNAUTHORIZED_RETRIES: u32 = 15;

/// Successful outcome of a platform call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply {
    /// Envelope status 200; carries the `data` member
    Data(Value),
    /// Envelope status 201; carries the whole envelope (it holds `record_id`)
    Created(Value),
}

/// Issues requests against the platform API and classifies the envelope.
///
/// The unauthorized-retry counter lives on the instance. It is bumped on each
/// retried 401 and reset on the next successful envelope, so one exhausted
/// call leaves later 401s failing fast until something succeeds again.
pub struct ApiGateway {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    max_unauthorized_retries: u32,
    unauthorized_retries: Cell<u32>,
}

impl ApiGateway {
    /// `platform_url` is the platform root without a trailing slash
    pub fn new(transport: Arc<dyn HttpTransport>, platform_url: &str) -> Self {
        Self {
            transport,
            api_base: format!("{}/api", platform_url.trim_end_matches('/')),
            max_unauthorized_retries: MAX_UNAUTHORIZED_RETRIES,
            unauthorized_retries: Cell::new(0),
        }
    }

    /// Override the unauthorized retry bound
    pub fn with_max_unauthorized_retries(mut self, max: u32) -> Self {
        self.max_unauthorized_retries = max;
        self
    }

    /// Current value of the unauthorized-retry counter
    pub fn unauthorized_retries(&self) -> u32 {
        self.unauthorized_retries.get()
    }

    /// Full URL for an API path fragment
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Check that `url` answers at all. Only transport failures count.
    pub fn probe(&self, url: &str) -> ImportResult<()> {
        self.transport
            .execute(&HttpRequest::get(url))
            .map(|_| ())
            .map_err(|failure| ImportError::Transport {
                url: url.to_string(),
                kind: failure.kind,
                message: failure.message,
            })
    }

    /// GET a path and return the envelope's `data`
    pub fn get(&self, path: &str) -> ImportResult<Value> {
        match self.call(Verb::Get, path, None)? {
            ApiReply::Data(data) => Ok(data),
            ApiReply::Created(envelope) => Err(ImportError::MalformedResponse {
                url: self.url_for(path),
                reason: format!("unexpected creation envelope on GET: {}", envelope),
            }),
        }
    }

    /// POST a payload to a path
    pub fn post(&self, path: &str, payload: Value) -> ImportResult<ApiReply> {
        self.call(Verb::Post, path, Some(payload))
    }

    /// Issue a request, retrying unauthorized envelopes up to the bound
    pub fn call(&self, verb: Verb, path: &str, payload: Option<Value>) -> ImportResult<ApiReply> {
        let url = self.url_for(path);
        let request = HttpRequest {
            verb,
            url: url.clone(),
            body: payload,
        };
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(%verb, %url, attempt = attempts, "calling platform API");

            let reply = self
                .transport
                .execute(&request)
                .map_err(|failure| ImportError::Transport {
                    url: url.clone(),
                    kind: failure.kind,
                    message: failure.message,
                })?;

            let envelope: Value =
                serde_json::from_str(&reply.body).map_err(|e| ImportError::MalformedResponse {
                    url: url.clone(),
                    reason: format!("body is not JSON ({}): {}", e, truncate(&reply.body)),
                })?;

            let status = envelope
                .get("status")
                .and_then(Value::as_i64)
                .ok_or_else(|| ImportError::MalformedResponse {
                    url: url.clone(),
                    reason: format!("envelope has no status: {}", truncate(&reply.body)),
                })?;

            match status {
                200 => {
                    self.unauthorized_retries.set(0);
                    let data = envelope.get("data").cloned().ok_or_else(|| {
                        ImportError::MalformedResponse {
                            url: url.clone(),
                            reason: "envelope has no data".to_string(),
                        }
                    })?;
                    return Ok(ApiReply::Data(data));
                }
                201 => {
                    self.unauthorized_retries.set(0);
                    return Ok(ApiReply::Created(envelope));
                }
                401 => {
                    let used = self.unauthorized_retries.get();
                    if used < self.max_unauthorized_retries {
                        warn!(
                            %url,
                            remaining = self.max_unauthorized_retries - used,
                            "received unauthorized response, retrying"
                        );
                        self.unauthorized_retries.set(used + 1);
                        continue;
                    }
                    warn!(%url, attempts, "hit max unauthorized retries");
                    return Err(ImportError::Unauthorized { url, attempts });
                }
                other => {
                    return Err(ImportError::Application {
                        url,
                        status: other,
                        body: reply.body,
                    });
                }
            }
        }
    }
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportKind;
    use crate::traits::{HttpReply, MockTransport, TransportFailure};
    use serde_json::json;

    const BASE: &str = "https://kion.test";

    fn gateway(transport: &Arc<MockTransport>) -> ApiGateway {
        ApiGateway::new(transport.clone(), BASE)
    }

    #[test]
    fn test_success_returns_data() {
        let transport = Arc::new(MockTransport::new());
        transport.get_data("v3/cft", json!([{"id": 1}]));

        let reply = gateway(&transport).get("v3/cft").unwrap();
        assert_eq!(reply, json!([{"id": 1}]));
        assert_eq!(transport.requests()[0].url, "https://kion.test/api/v3/cft");
    }

    #[test]
    fn test_created_returns_whole_envelope() {
        let transport = Arc::new(MockTransport::new());
        transport.post_created("v3/iam-policy", 77);

        let reply = gateway(&transport)
            .post("v3/iam-policy", json!({"name": "x"}))
            .unwrap();
        assert_eq!(reply, ApiReply::Created(json!({"status": 201, "record_id": 77})));
    }

    #[test]
    fn test_unauthorized_retries_then_succeeds_and_resets() {
        let transport = Arc::new(MockTransport::new());
        transport
            .get_status("v3/ou", 401)
            .get_status("v3/ou", 401)
            .get_data("v3/ou", json!([]));

        let gw = gateway(&transport);
        assert_eq!(gw.get("v3/ou").unwrap(), json!([]));
        assert_eq!(transport.count(Verb::Get, "/api/v3/ou"), 3);
        assert_eq!(gw.unauthorized_retries(), 0);
    }

    #[test]
    fn test_unauthorized_bound_is_max_plus_one_attempts() {
        let transport = Arc::new(MockTransport::new());
        transport.get_status("v3/ou", 401);

        let gw = gateway(&transport).with_max_unauthorized_retries(3);
        let err = gw.get("v3/ou").unwrap_err();

        assert!(matches!(err, ImportError::Unauthorized { attempts: 4, .. }));
        assert_eq!(transport.count(Verb::Get, "/api/v3/ou"), 4);
    }

    #[test]
    fn test_default_bound_is_fifteen_retries() {
        let transport = Arc::new(MockTransport::new());
        transport.get_status("v3/ou", 401);

        let err = gateway(&transport).get("v3/ou").unwrap_err();
        assert!(matches!(err, ImportError::Unauthorized { attempts: 16, .. }));
        assert_eq!(transport.count(Verb::Get, "/api/v3/ou"), 16);
    }

    #[test]
    fn test_counter_is_per_gateway() {
        let transport = Arc::new(MockTransport::new());
        transport.get_status("v3/ou", 401);

        let first = gateway(&transport).with_max_unauthorized_retries(2);
        assert!(first.get("v3/ou").is_err());
        assert_eq!(first.unauthorized_retries(), 2);

        let second = gateway(&transport).with_max_unauthorized_retries(2);
        assert_eq!(second.unauthorized_retries(), 0);
        assert!(matches!(
            second.get("v3/ou").unwrap_err(),
            ImportError::Unauthorized { attempts: 3, .. }
        ));
    }

    #[test]
    fn test_application_error_is_not_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.get_status("v3/cloud-rule", 500);

        let err = gateway(&transport).get("v3/cloud-rule").unwrap_err();
        assert!(matches!(err, ImportError::Application { status: 500, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            Verb::Get,
            "/api/v3/cft",
            Ok(HttpReply {
                status: 502,
                body: "<html>Bad Gateway</html>".to_string(),
            }),
        );

        let err = gateway(&transport).get("v3/cft").unwrap_err();
        assert!(matches!(err, ImportError::MalformedResponse { .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_missing_status_is_malformed() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            Verb::Get,
            "/api/v3/cft",
            Ok(MockTransport::json_reply(json!({"data": []}))),
        );

        let err = gateway(&transport).get("v3/cft").unwrap_err();
        assert!(matches!(err, ImportError::MalformedResponse { .. }));
    }

    #[test]
    fn test_transport_failure_is_surfaced_without_retry() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            Verb::Get,
            "/api/v3/cft",
            Err(TransportFailure {
                kind: TransportKind::Timeout,
                message: "deadline".to_string(),
            }),
        );

        let err = gateway(&transport).get("v3/cft").unwrap_err();
        assert!(matches!(
            err,
            ImportError::Transport {
                kind: TransportKind::Timeout,
                ..
            }
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_probe_ignores_envelope() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            Verb::Get,
            BASE,
            Ok(HttpReply {
                status: 200,
                body: "<html></html>".to_string(),
            }),
        );

        assert!(gateway(&transport).probe(BASE).is_ok());
    }

    #[test]
    fn test_url_for_trims_slashes() {
        let transport = Arc::new(MockTransport::new());
        let gw = ApiGateway::new(transport, "https://kion.test/");
        assert_eq!(gw.url_for("/v3/ou"), "https://kion.test/api/v3/ou");
    }
}
