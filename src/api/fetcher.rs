use serde_json::Value;

use super::endpoint::{ResourceType, Verb, resolve};
use super::gateway::ApiGateway;
use crate::error::{ImportError, ImportResult};

/// Read access to platform objects, built on the gateway and endpoint table
pub struct ObjectFetcher<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> ObjectFetcher<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &'a ApiGateway {
        self.gateway
    }

    /// Fetch every object of a type
    pub fn fetch_all(&self, resource_type: ResourceType) -> ImportResult<Vec<Value>> {
        let path = resolve(resource_type, Verb::Get)?;
        let data = self.gateway.get(path)?;

        let list = match resource_type.collection_key() {
            Some(key) => data.get(key).cloned().unwrap_or(Value::Null),
            None => data,
        };

        into_list(list).ok_or_else(|| ImportError::MalformedResponse {
            url: self.gateway.url_for(path),
            reason: format!("expected a list of {} records", resource_type),
        })
    }

    /// Fetch a single object by id
    pub fn fetch_one(&self, resource_type: ResourceType, id: i64) -> ImportResult<Value> {
        let path = resolve(resource_type, Verb::Get)?;
        self.gateway.get(&format!("{}/{}", path, id))
    }

    /// Fetch the `child` objects attached to one `parent`, e.g. a project's cloud rules
    pub fn fetch_children(
        &self,
        parent: ResourceType,
        parent_id: i64,
        child: ResourceType,
    ) -> ImportResult<Vec<Value>> {
        let path = format!("{}/{}/{}", resolve(parent, Verb::Get)?, parent_id, child.as_str());
        let data = self.gateway.get(&path)?;

        into_list(data).ok_or_else(|| ImportError::MalformedResponse {
            url: self.gateway.url_for(&path),
            reason: format!("expected a list of {} records", child),
        })
    }

    /// Ids of the cloud rules applied directly to a project.
    /// Rules inherited from parent OUs are not part of this list.
    pub fn locally_applied_rule_ids(&self, project_id: i64) -> ImportResult<Vec<i64>> {
        let rules = self.fetch_children(ResourceType::Project, project_id, ResourceType::CloudRule)?;
        Ok(extract_ids(&Value::Array(rules)))
    }

    /// Cloud access roles defined on the OU itself. The endpoint also returns
    /// roles inherited from parent OUs, which are dropped here.
    pub fn local_ou_roles(&self, ou_id: i64) -> ImportResult<Vec<Value>> {
        let roles = self.fetch_children(ResourceType::Ou, ou_id, ResourceType::OuCloudAccessRole)?;
        Ok(roles
            .into_iter()
            .filter(|role| role.get("ou_id").and_then(Value::as_i64) == Some(ou_id))
            .collect())
    }
}

/// Project the ids of `resource_type` objects embedded in a composite record.
///
/// A missing or null sub-list means no associations. A sub-list of any other
/// shape is an error so the caller can flag the type as unresolved.
pub fn ids_of_associated(resource_type: ResourceType, composite: &Value) -> ImportResult<Vec<i64>> {
    let key = resource_type.association_key();
    match composite.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list @ Value::Array(_)) => Ok(extract_ids(list)),
        Some(_) => Err(ImportError::UnexpectedShape {
            field: key.to_string(),
            expected: "a list",
        }),
    }
}

/// Collect ids from a list of bare integers and/or records carrying an `id`.
/// Anything else is ignored; duplicates keep their first position.
pub fn extract_ids(list: &Value) -> Vec<i64> {
    let mut ids = Vec::new();
    if let Some(items) = list.as_array() {
        for item in items {
            let id = match item {
                Value::Number(n) => n.as_i64(),
                Value::Object(map) => map.get("id").and_then(Value::as_i64),
                _ => None,
            };
            if let Some(id) = id {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }
    ids
}

fn into_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}
