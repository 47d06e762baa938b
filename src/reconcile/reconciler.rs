use anyhow::{Result, bail};
use serde_json::{Value, json};
use tracing::debug;

use super::descriptor::{TypeDescriptor, descriptor};
use crate::api::{
    ApiGateway, ApiReply, ObjectFetcher, ResourceType, SearchIndexClient, SearchOutcome, Verb,
};
use crate::error::{ImportError, ImportResult};

/// How system-managed objects are duplicated into user-owned ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneDirective {
    pub prefix: String,
    pub owner_user_ids: Vec<i64>,
    pub owner_group_ids: Vec<i64>,
}

impl CloneDirective {
    /// Validate and build a directive. The prefix must end in `-` or `_` and
    /// at least one owner list must be non-empty.
    pub fn new(prefix: &str, owner_user_ids: Vec<i64>, owner_group_ids: Vec<i64>) -> Result<Self> {
        if prefix.is_empty() {
            bail!("You did not provide a clone prefix value using the --clone-prefix flag.");
        }
        if !prefix.ends_with('-') && !prefix.ends_with('_') {
            bail!("Clone prefix '{}' must end with '_' or '-'.", prefix);
        }
        if owner_user_ids.is_empty() && owner_group_ids.is_empty() {
            bail!(
                "You must provide at least one of --clone-user-ids or --clone-user-group-ids \
                 in order to clone system-managed resources."
            );
        }

        Ok(Self {
            prefix: prefix.to_string(),
            owner_user_ids,
            owner_group_ids,
        })
    }

    /// The name a clone of `name` carries
    pub fn clone_name(&self, name: &str) -> String {
        if name.starts_with(&self.prefix) {
            name.to_string()
        } else {
            format!("{}{}", self.prefix, name)
        }
    }
}

/// Outcome of a find-or-clone attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// A clone with the target name already exists; carries the search hit
    AlreadyExists(Value),
    /// A new owned copy was created; carries the record as fetched back
    Created(Value),
}

/// Find-or-clone for system-managed objects.
///
/// Idempotency relies on searching before creating. Two importers racing
/// against the same platform can still both create; the platform offers no
/// conditional create to close that gap.
pub struct Reconciler<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> Reconciler<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    pub fn reconcile(
        &self,
        resource_type: ResourceType,
        candidate: Value,
        directive: &CloneDirective,
    ) -> ImportResult<ReconcileOutcome> {
        let create_path = resource_type.endpoint(Verb::Post)?;
        let desc = descriptor(resource_type);
        let mut payload = candidate;

        let name = apply_clone_name(&desc, &mut payload, directive)
            .ok_or(ImportError::MissingName { resource_type })?;

        desc.strip_managed_fields(&mut payload);

        match SearchIndexClient::new(self.gateway).find_by_name(resource_type, &name)? {
            SearchOutcome::Found(existing) => {
                debug!(%resource_type, %name, "clone already exists");
                return Ok(ReconcileOutcome::AlreadyExists(existing));
            }
            SearchOutcome::NotFound => {}
        }

        set_owners(&desc, &mut payload, directive);

        let envelope = match self.gateway.post(create_path, payload)? {
            ApiReply::Created(envelope) => envelope,
            ApiReply::Data(data) => {
                return Err(ImportError::MalformedResponse {
                    url: self.gateway.url_for(create_path),
                    reason: format!("expected a creation acknowledgment, got {}", data),
                });
            }
        };

        let record_id = envelope
            .get("record_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                ImportError::missing_field(format!("creation response {}", envelope), "record_id")
            })?;

        debug!(%resource_type, %name, record_id, "created clone");
        let record = ObjectFetcher::new(self.gateway).fetch_one(resource_type, record_id)?;
        Ok(ReconcileOutcome::Created(record))
    }
}

/// Rewrite the name in place (root first, then the nested record) and return it
fn apply_clone_name(
    desc: &TypeDescriptor,
    payload: &mut Value,
    directive: &CloneDirective,
) -> Option<String> {
    let slot = if payload.get("name").and_then(Value::as_str).is_some() {
        payload.get_mut("name")
    } else {
        desc.record_key
            .and_then(|key| payload.get_mut(key))
            .and_then(|nested| nested.get_mut("name"))
            .filter(|name| name.is_string())
    }?;

    let name = directive.clone_name(slot.as_str()?);
    *slot = Value::String(name.clone());
    Some(name)
}

/// Overwrite both owner field-name variants with the directive's owners
fn set_owners(desc: &TypeDescriptor, payload: &mut Value, directive: &CloneDirective) {
    if let Some(map) = payload.as_object_mut() {
        for field in desc.owner_user_fields {
            map.insert(field.to_string(), json!(directive.owner_user_ids));
        }
        for field in desc.owner_group_fields {
            map.insert(field.to_string(), json!(directive.owner_group_ids));
        }
    }
}
