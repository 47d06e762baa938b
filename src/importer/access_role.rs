//! Cloud access roles, attached either to a project or to an OU.
//!
//! Roles are listed per container and each role needs a second call for its
//! policies, members and permissions boundary. Files land in one directory
//! per container, named `<container id>-<container name>`.

use serde_json::{Value, json};

use super::{FamilyReport, ImportSession, Placement, flag, number_or_null, require_number, text};
use crate::api::{ObjectFetcher, ResourceType, extract_ids};
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::ledger::ImportLedger;
use crate::render::{hcl_bool, hcl_string, id_blocks, normalize_name};

/// Where a role family's roles hang off
#[derive(Debug, Clone, Copy)]
struct RoleScope {
    family: Family,
    container: ResourceType,
    role: ResourceType,
    /// Label used in messages, e.g. "Project"
    label: &'static str,
}

const PROJECT_SCOPE: RoleScope = RoleScope {
    family: Family::ProjectRoles,
    container: ResourceType::Project,
    role: ResourceType::ProjectCloudAccessRole,
    label: "Project",
};

const OU_SCOPE: RoleScope = RoleScope {
    family: Family::OuRoles,
    container: ResourceType::Ou,
    role: ResourceType::OuCloudAccessRole,
    label: "OU",
};

pub(super) fn import_project_roles(
    session: &ImportSession,
    ledger: &mut ImportLedger,
) -> ImportResult<FamilyReport> {
    import_scope(session, PROJECT_SCOPE, ledger)
}

pub(super) fn import_ou_roles(session: &ImportSession, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    import_scope(session, OU_SCOPE, ledger)
}

fn import_scope(session: &ImportSession, scope: RoleScope, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    let fetcher = ObjectFetcher::new(session.gateway);
    let containers = fetcher.fetch_all(scope.container)?;
    let mut report = FamilyReport::default();
    let mut incomplete = Vec::new();

    for container in &containers {
        let container_name = text(container, "name");
        let container_id = match require_number(container, "id", scope.label) {
            Ok(id) => id,
            Err(err) => {
                session.record_failure(&mut report, &container_name, &err);
                continue;
            }
        };

        let roles = match list_roles(&fetcher, scope, container_id) {
            Ok(roles) => roles,
            Err(err) => {
                session.record_failure(&mut report, &container_name, &err);
                continue;
            }
        };

        session.ctx.output.info(&format!(
            "Found {} roles on {} (ID: {}) {}",
            roles.len(),
            scope.label,
            container_id,
            container_name
        ));
        report.found += roles.len();

        let subdir = format!("{}-{}", container_id, normalize_name(&container_name, None));
        for role in &roles {
            let role_name = text(role, "name");
            let role_id = match require_number(role, "id", "cloud access role") {
                Ok(id) => id,
                Err(err) => {
                    session.record_failure(&mut report, &role_name, &err);
                    continue;
                }
            };

            let details = match fetcher.fetch_one(scope.role, role_id) {
                Ok(details) if details.is_object() => details,
                Ok(_) => {
                    session.ctx.output.warning(&format!(
                        "Details for {} role {} weren't found. Data will be incomplete. Skipping",
                        scope.label, role_name
                    ));
                    incomplete.push(role_name);
                    continue;
                }
                Err(err) => {
                    session.ctx.output.warning(&format!(
                        "Failed to fetch details for {} role {}: {}. Skipping",
                        scope.label, role_name, err
                    ));
                    incomplete.push(role_name);
                    continue;
                }
            };

            let result = role_data(scope, container_id, role, &details).and_then(|data| {
                session.emit(
                    Placement {
                        family: scope.family,
                        subdir: Some(&subdir),
                        name: &role_name,
                        id: role_id,
                    },
                    data,
                    &mut report,
                    ledger,
                )
            });
            match result {
                Ok(()) => report.imported += 1,
                Err(err) => session.record_failure(&mut report, &role_name, &err),
            }
        }
    }

    if !incomplete.is_empty() {
        session.ctx.output.warning(&format!(
            "{} roles that failed to return full details: {}",
            scope.label,
            incomplete.join(", ")
        ));
        report.failed.extend(incomplete);
    }

    Ok(report)
}

fn list_roles(fetcher: &ObjectFetcher, scope: RoleScope, container_id: i64) -> ImportResult<Vec<Value>> {
    match scope.container {
        ResourceType::Ou => fetcher.local_ou_roles(container_id),
        _ => fetcher.fetch_children(scope.container, container_id, scope.role),
    }
}

/// Template data for one role. Access flags for OU roles only come with the
/// detail record; project roles carry them on the list entry.
fn role_data(scope: RoleScope, container_id: i64, role: &Value, details: &Value) -> ImportResult<Value> {
    let id = require_number(role, "id", "cloud access role")?;
    let name = hcl_string(&text(role, "name"));

    let flags_source = match scope.family {
        Family::OuRoles => details
            .get("ou_cloud_access_role")
            .filter(|nested| nested.is_object())
            .ok_or_else(|| ImportError::missing_field("ou cloud access role details", "ou_cloud_access_role"))?,
        _ => role,
    };

    let permissions_boundary = details
        .get("aws_iam_permissions_boundary")
        .and_then(|boundary| boundary.get("id"))
        .and_then(Value::as_i64);

    let mut data = json!({
        "resource_id": normalize_name(&name, None),
        "id": id,
        "name": name,
        "aws_iam_role_name": text(role, "aws_iam_role_name"),
        "aws_iam_path": text(role, "aws_iam_path"),
        "permissions_boundary": number_or_null(permissions_boundary),
        "short_term_access_keys": hcl_bool(flag(flags_source, "short_term_access_keys")),
        "long_term_access_keys": hcl_bool(flag(flags_source, "long_term_access_keys")),
        "web_access": hcl_bool(flag(flags_source, "web_access")),
        "aws_iam_policies": id_blocks("aws_iam_policies", &ids_in(details, "aws_iam_policies")),
        "users": id_blocks("users", &ids_in(details, "users")),
        "user_groups": id_blocks("user_groups", &ids_in(details, "user_groups")),
    });

    if let Some(map) = data.as_object_mut() {
        match scope.family {
            Family::OuRoles => {
                map.insert("ou_id".to_string(), json!(container_id));
            }
            _ => {
                map.insert("project_id".to_string(), json!(container_id));
                map.insert(
                    "future_accounts".to_string(),
                    json!(hcl_bool(flag(role, "future_accounts"))),
                );
                map.insert(
                    "accounts".to_string(),
                    json!(id_blocks("accounts", &ids_in(details, "accounts"))),
                );
            }
        }
    }

    Ok(data)
}

fn ids_in(details: &Value, field: &str) -> Vec<i64> {
    details.get(field).map(extract_ids).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Verb;
    use crate::config::ImportConfig;
    use crate::importer::test_support::Harness;

    #[test]
    fn test_project_roles_written_per_project() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness
            .transport
            .get_data("v3/project", json!([{"id": 13, "name": "Test Project"}]))
            .get_data(
                "v3/project/13/project-cloud-access-role",
                json!([{
                    "id": 30,
                    "name": "Developers",
                    "aws_iam_role_name": "dev",
                    "future_accounts": true,
                    "long_term_access_keys": false,
                    "short_term_access_keys": true,
                    "web_access": true
                }]),
            )
            .get_data(
                "v3/project-cloud-access-role/30",
                json!({
                    "aws_iam_policies": [{"id": 4}],
                    "users": [{"id": 1}, {"id": 2}],
                    "user_groups": null,
                    "accounts": [{"id": 77}],
                    "aws_iam_permissions_boundary": {"id": 9}
                }),
            );

        let mut ledger = ImportLedger::new();
        let report = import_project_roles(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.found, 1);
        assert_eq!(report.imported, 1);

        let content = harness
            .file("project-cloud-access-role/13-Test_Project/Developers.tf")
            .unwrap();
        assert!(content.contains("resource \"kion_project_cloud_access_role\" \"Developers\""));
        assert!(content.contains("project_id                  = 13"));
        assert!(content.contains("aws_iam_path                = \"\""));
        assert!(content.contains("aws_permissions_boundary_id = 9"));
        assert!(content.contains("future_accounts             = true"));
        assert!(content.contains("long_term_access_keys       = false"));
        assert!(content.contains("accounts { id = 77 }"));
        assert!(content.contains("users { id = 1 }\n    users { id = 2 }"));
        assert!(!content.contains("user_groups"));

        assert_eq!(
            ledger.resources()[0].address,
            "module.project-cloud-access-role.kion_project_cloud_access_role.Developers"
        );
        assert_eq!(ledger.resources()[0].id, 30);
    }

    #[test]
    fn test_role_without_details_is_incomplete() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness
            .transport
            .get_data("v3/project", json!([{"id": 1, "name": "P"}]))
            .get_data(
                "v3/project/1/project-cloud-access-role",
                json!([
                    {"id": 5, "name": "Broken", "aws_iam_role_name": "b"},
                    {"id": 6, "name": "Fine", "aws_iam_role_name": "f"}
                ]),
            )
            .get_status("v3/project-cloud-access-role/5", 500)
            .get_data(
                "v3/project-cloud-access-role/6",
                json!({"aws_iam_permissions_boundary": null}),
            );

        let mut ledger = ImportLedger::new();
        let report = import_project_roles(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.failed, vec!["Broken".to_string()]);
        assert!(
            harness
                .output
                .get_warnings()
                .iter()
                .any(|w| w.contains("failed to return full details: Broken"))
        );
        assert!(harness.output.get_warnings().iter().any(|w| {
            w.starts_with("Failed to fetch details for Project role Broken")
                && w.contains("status 500")
        }));

        let content = harness.file("project-cloud-access-role/1-P/Fine.tf").unwrap();
        assert!(content.contains("aws_permissions_boundary_id = null"));
    }

    #[test]
    fn test_ou_roles_use_detail_flags_and_skip_inherited() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness
            .transport
            .get_data("v3/ou", json!([{"id": 3, "name": "Engineering"}]))
            .get_data(
                "v3/ou/3/ou-cloud-access-role",
                json!([
                    {"id": 8, "ou_id": 3, "name": "Admins", "aws_iam_role_name": "admin"},
                    {"id": 9, "ou_id": 1, "name": "Inherited", "aws_iam_role_name": "x"}
                ]),
            )
            .get_data(
                "v3/ou-cloud-access-role/8",
                json!({
                    "ou_cloud_access_role": {
                        "long_term_access_keys": true,
                        "short_term_access_keys": false,
                        "web_access": true
                    },
                    "aws_iam_policies": [],
                    "users": [],
                    "user_groups": [{"id": 12}]
                }),
            );

        let mut ledger = ImportLedger::new();
        let report = import_ou_roles(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.found, 1);
        assert_eq!(harness.transport.count(Verb::Get, "/api/v3/ou-cloud-access-role/9"), 0);

        let content = harness.file("ou-cloud-access-role/3-Engineering/Admins.tf").unwrap();
        assert!(content.contains("ou_id                       = 3"));
        assert!(content.contains("long_term_access_keys       = true"));
        assert!(content.contains("short_term_access_keys      = false"));
        assert!(content.contains("user_groups { id = 12 }"));
        assert!(!content.contains("future_accounts"));
        assert_eq!(
            ledger.resources()[0].address,
            "module.ou-cloud-access-role.kion_ou_cloud_access_role.Admins"
        );
    }

    #[test]
    fn test_container_role_listing_failure_continues() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness
            .transport
            .get_data("v3/ou", json!([{"id": 1, "name": "Root"}, {"id": 2, "name": "Child"}]))
            .get_status("v3/ou/1/ou-cloud-access-role", 500)
            .get_data("v3/ou/2/ou-cloud-access-role", json!([]));

        let mut ledger = ImportLedger::new();
        let report = import_ou_roles(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.failed, vec!["Root".to_string()]);
        assert_eq!(report.found, 0);
        assert!(ledger.resources().is_empty());
    }
}
