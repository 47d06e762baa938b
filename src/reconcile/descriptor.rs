use serde_json::Value;

use crate::api::ResourceType;

/// Field names that carry owning users, in the order they are consulted
pub const OWNER_USER_FIELDS: &[&str] = &["owner_users", "owner_user_ids"];

/// Field names that carry owning user groups, in the order they are consulted
pub const OWNER_GROUP_FIELDS: &[&str] = &["owner_user_groups", "owner_user_group_ids"];

const COMMON_MANAGED_FIELDS: &[&str] = &["id", "built_in", "ct_managed"];

/// How records of one type are shaped.
///
/// Types listed with a `record_key` return their own fields nested under that
/// key (e.g. `{"azure_policy": {"name": ..}, "owner_users": [..]}`), and their
/// create payloads may keep the same nesting. The name is looked up at the
/// root first and under `record_key` second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub resource_type: ResourceType,
    pub record_key: Option<&'static str>,
    /// Type-specific server-managed flags, stripped in addition to the common ones
    pub managed_fields: &'static [&'static str],
    pub owner_user_fields: &'static [&'static str],
    pub owner_group_fields: &'static [&'static str],
}

/// Descriptor for a resource type
pub fn descriptor(resource_type: ResourceType) -> TypeDescriptor {
    let (record_key, managed_fields): (Option<&'static str>, &'static [&'static str]) =
        match resource_type {
            ResourceType::CloudFormationTemplate => (Some("cft"), &[]),
            ResourceType::IamPolicy => (
                Some("iam_policy"),
                &["aws_managed_policy", "system_managed_policy"],
            ),
            ResourceType::AzureArmTemplate => (Some("azure_arm_template"), &[]),
            ResourceType::AzurePolicy => (Some("azure_policy"), &["azure_managed_policy_def_id"]),
            ResourceType::AzureRole => (
                Some("azure_role"),
                &["azure_managed_policy", "system_managed_policy"],
            ),
            ResourceType::ComplianceStandard => (Some("compliance_standard"), &[]),
            ResourceType::ComplianceCheck => (Some("compliance_check"), &[]),
            ResourceType::CloudRule => (Some("cloud_rule"), &[]),
            ResourceType::ProjectCloudAccessRole => (Some("project_cloud_access_role"), &[]),
            ResourceType::OuCloudAccessRole => (Some("ou_cloud_access_role"), &[]),
            _ => (None, &[]),
        };

    TypeDescriptor {
        resource_type,
        record_key,
        managed_fields,
        owner_user_fields: OWNER_USER_FIELDS,
        owner_group_fields: OWNER_GROUP_FIELDS,
    }
}

impl TypeDescriptor {
    /// The object holding this type's own fields: the nested record if present, else the root
    pub fn fields<'v>(&self, record: &'v Value) -> &'v Value {
        self.record_key
            .and_then(|key| record.get(key))
            .filter(|nested| nested.is_object())
            .unwrap_or(record)
    }

    /// Display name, from the root or the nested record
    pub fn name_of<'v>(&self, record: &'v Value) -> Option<&'v str> {
        record
            .get("name")
            .and_then(Value::as_str)
            .or_else(|| self.fields(record).get("name").and_then(Value::as_str))
    }

    /// Identity, from the root or the nested record
    pub fn id_of(&self, record: &Value) -> Option<i64> {
        record
            .get("id")
            .and_then(Value::as_i64)
            .or_else(|| self.fields(record).get("id").and_then(Value::as_i64))
    }

    /// Every field that must be removed before a record is resubmitted
    pub fn stripped_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        COMMON_MANAGED_FIELDS
            .iter()
            .chain(self.managed_fields.iter())
            .copied()
    }

    /// Remove identity and managed flags from the root and the nested record
    pub fn strip_managed_fields(&self, record: &mut Value) {
        let fields: Vec<&str> = self.stripped_fields().collect();
        if let Some(map) = record.as_object_mut() {
            for field in &fields {
                map.remove(*field);
            }
        }
        if let Some(nested) = self
            .record_key
            .and_then(|key| record.get_mut(key))
            .and_then(Value::as_object_mut)
        {
            for field in &fields {
                nested.remove(*field);
            }
        }
    }
}
