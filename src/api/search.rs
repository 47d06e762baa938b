use serde_json::{Value, json};

use super::endpoint::{ResourceType, SEARCH_ENDPOINT};
use super::gateway::{ApiGateway, ApiReply};
use crate::error::{ImportError, ImportResult};

/// Result of an exact-match search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(Value),
    NotFound,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }
}

/// Client for the platform's free-text search endpoint
pub struct SearchIndexClient<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> SearchIndexClient<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// Find an object of `resource_type` whose name is exactly `name`
    pub fn find_by_name(&self, resource_type: ResourceType, name: &str) -> ImportResult<SearchOutcome> {
        self.find_by_field(resource_type, "name", name)
    }

    /// Query the index for `value` and keep only hits of the same type whose
    /// `field` equals `value` exactly. Fuzzy and substring hits are ignored.
    pub fn find_by_field(
        &self,
        resource_type: ResourceType,
        field: &str,
        value: &str,
    ) -> ImportResult<SearchOutcome> {
        let tag = resource_type
            .search_tag()
            .ok_or(ImportError::NotSearchable(resource_type))?;

        let hits = match self.gateway.post(SEARCH_ENDPOINT, json!({ "query": value }))? {
            ApiReply::Data(Value::Null) => return Ok(SearchOutcome::NotFound),
            ApiReply::Data(Value::Array(items)) => items,
            other => {
                return Err(ImportError::MalformedResponse {
                    url: self.gateway.url_for(SEARCH_ENDPOINT),
                    reason: format!("expected a list of search results, got {:?}", other),
                });
            }
        };

        let found = hits.into_iter().find(|hit| {
            hit.get("type").and_then(Value::as_str) == Some(tag)
                && hit.get(field).and_then(Value::as_str) == Some(value)
        });

        Ok(match found {
            Some(hit) => SearchOutcome::Found(hit),
            None => SearchOutcome::NotFound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::endpoint::Verb;
    use crate::traits::MockTransport;
    use std::sync::Arc;

    fn setup() -> (Arc<MockTransport>, ApiGateway) {
        let transport = Arc::new(MockTransport::new());
        let gateway = ApiGateway::new(transport.clone(), "https://kion.test");
        (transport, gateway)
    }

    #[test]
    fn test_exact_match_found() {
        let (transport, gateway) = setup();
        transport.post_data(
            "v1/search",
            json!([
                {"type": "iam", "name": "co_Default-Policy-Extended", "id": 3},
                {"type": "iam", "name": "co_Default-Policy", "id": 4}
            ]),
        );

        let outcome = SearchIndexClient::new(&gateway)
            .find_by_name(ResourceType::IamPolicy, "co_Default-Policy")
            .unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Found(json!({"type": "iam", "name": "co_Default-Policy", "id": 4}))
        );

        let sent = &transport.requests()[0];
        assert_eq!(sent.verb, Verb::Post);
        assert_eq!(sent.body, Some(json!({"query": "co_Default-Policy"})));
    }

    #[test]
    fn test_fuzzy_and_other_type_hits_are_not_found() {
        let (transport, gateway) = setup();
        transport.post_data(
            "v1/search",
            json!([
                {"type": "cft", "name": "co_Default-Policy", "id": 1},
                {"type": "iam", "name": "co_default-policy", "id": 2}
            ]),
        );

        let outcome = SearchIndexClient::new(&gateway)
            .find_by_name(ResourceType::IamPolicy, "co_Default-Policy")
            .unwrap();
        assert_eq!(outcome, SearchOutcome::NotFound);
    }

    #[test]
    fn test_empty_result_is_not_found() {
        let (transport, gateway) = setup();
        transport.post_data("v1/search", json!([]));

        let outcome = SearchIndexClient::new(&gateway)
            .find_by_name(ResourceType::CloudRule, "co_rule")
            .unwrap();
        assert!(!outcome.is_found());
    }

    #[test]
    fn test_search_failure_is_an_error_not_not_found() {
        let (transport, gateway) = setup();
        transport.on(
            Verb::Post,
            "/api/v1/search",
            Ok(MockTransport::json_reply(json!({"status": 500}))),
        );

        let result = SearchIndexClient::new(&gateway).find_by_name(ResourceType::CloudRule, "x");
        assert!(matches!(result, Err(ImportError::Application { status: 500, .. })));
    }

    #[test]
    fn test_unsearchable_type() {
        let (_transport, gateway) = setup();
        let result = SearchIndexClient::new(&gateway).find_by_name(ResourceType::Project, "x");
        assert!(matches!(result, Err(ImportError::NotSearchable(ResourceType::Project))));
    }
}
