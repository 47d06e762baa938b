use serde_json::Value;

use super::descriptor::TypeDescriptor;
use crate::api::extract_ids;

/// Owning users and user groups, by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerSet {
    pub users: Vec<i64>,
    pub groups: Vec<i64>,
}

impl OwnerSet {
    pub fn new(users: Vec<i64>, groups: Vec<i64>) -> Self {
        Self { users, groups }
    }

    /// Read owners off a record. Owners may be embedded user objects or bare
    /// ids, under either field-name variant, at the root or in the nested record.
    pub fn from_record(descriptor: &TypeDescriptor, record: &Value) -> Self {
        let nested = descriptor.fields(record);
        Self {
            users: collect_owner_ids(record, nested, descriptor.owner_user_fields),
            groups: collect_owner_ids(record, nested, descriptor.owner_group_fields),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}

/// Normalize one owner list to plain ids. Null or a non-list yields an empty list.
pub fn normalize_owner_ids(owners: &Value) -> Vec<i64> {
    extract_ids(owners)
}

fn collect_owner_ids(root: &Value, nested: &Value, fields: &[&str]) -> Vec<i64> {
    let mut ids: Vec<i64> = Vec::new();
    for source in [root, nested] {
        for field in fields {
            if let Some(list) = source.get(*field) {
                for id in normalize_owner_ids(list) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
    }
    ids
}
