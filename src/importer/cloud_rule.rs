use serde_json::{Map, Value, json};

use super::{FamilyReport, ImportSession, Placement, flag, number, number_or_null, text};
use crate::api::{ObjectFetcher, ResourceType};
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::graph::{AssociationGraph, GraphResolver, RULE_ASSOCIATIONS};
use crate::ledger::ImportLedger;
use crate::reconcile::{OwnerSet, descriptor};
use crate::render::{hcl_string, id_blocks, normalize_name, owner_blocks};

const TYPE: ResourceType = ResourceType::CloudRule;

pub(super) fn import(session: &ImportSession, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    let fetcher = ObjectFetcher::new(session.gateway);
    let rules = fetcher.fetch_all(TYPE)?;
    let mut report = FamilyReport {
        found: rules.len(),
        ..Default::default()
    };
    session
        .ctx
        .output
        .info(&format!("Found {} Cloud Rules", rules.len()));

    let resolver = GraphResolver::new(ObjectFetcher::new(session.gateway));
    let desc = descriptor(TYPE);
    for rule in &rules {
        let name = desc.name_of(rule).unwrap_or("<unnamed>").to_string();
        if let Err(err) = import_one(session, &resolver, rule, &name, &mut report, ledger) {
            session.record_failure(&mut report, &name, &err);
        }
    }

    Ok(report)
}

fn import_one(
    session: &ImportSession,
    resolver: &GraphResolver,
    rule: &Value,
    name: &str,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let desc = descriptor(TYPE);
    let built_in = flag(rule, "built_in");

    if built_in && session.config.clone_directive().is_none() {
        session.skip(report, &format!("Skipping built-in Cloud Rule: {}", name));
        return Ok(());
    }

    let id = desc
        .id_of(rule)
        .ok_or_else(|| ImportError::missing_field("cloud rule", "id"))?;
    let detail = ObjectFetcher::new(session.gateway).fetch_one(TYPE, id)?;

    let resolution = resolver.resolve_associations(id, &detail);
    if !resolution.is_complete() {
        let missing = resolution
            .missing_types()
            .iter()
            .map(|t| t.association_key())
            .collect::<Vec<_>>()
            .join(", ");
        // Clones are only created from a fully resolved graph.
        if built_in {
            return Err(ImportError::IncompleteAssociations {
                rule: name.to_string(),
                missing,
            });
        }
        session.ctx.output.warning(&format!(
            "Could not resolve {} for Cloud Rule {}; rendering the associations that were found",
            missing, name
        ));
    }
    let graph = resolution.graph;

    if built_in {
        let candidate = clone_payload(rule, &graph);
        if let Some(clone) = session.clone_record(TYPE, candidate, name, report) {
            write_rule(session, &clone, &graph, session.clone_owners(), report, ledger)?;
        }
        return Ok(());
    }

    session
        .ctx
        .output
        .dimmed(&format!("Importing Cloud Rule - {}", name));
    let owners = OwnerSet::from_record(&desc, &detail);
    write_rule(session, rule, &graph, owners, report, ledger)?;
    report.imported += 1;
    Ok(())
}

/// Field of the create payload that carries the ids of one association type
fn payload_key(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::IamPolicy => "iam_policy_ids",
        ResourceType::CloudFormationTemplate => "cft_ids",
        ResourceType::AzureArmTemplate => "azure_arm_template_definition_ids",
        ResourceType::AzurePolicy => "azure_policy_definition_ids",
        ResourceType::AzureRole => "azure_role_definition_ids",
        ResourceType::ComplianceStandard => "compliance_standard_ids",
        ResourceType::InternalAmi => "internal_ami_ids",
        ResourceType::InternalPortfolio => "internal_portfolio_ids",
        ResourceType::ServiceControlPolicy => "service_control_policy_ids",
        ResourceType::Ou => "ou_ids",
        ResourceType::Project => "project_ids",
        _ => "ids",
    }
}

/// The list entry of a built-in rule plus every resolved association
fn clone_payload(rule: &Value, graph: &AssociationGraph) -> Value {
    let mut payload = match rule {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for resource_type in RULE_ASSOCIATIONS {
        payload.insert(
            payload_key(*resource_type).to_string(),
            json!(graph.ids(*resource_type)),
        );
    }
    Value::Object(payload)
}

fn write_rule(
    session: &ImportSession,
    record: &Value,
    graph: &AssociationGraph,
    owners: OwnerSet,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let desc = descriptor(TYPE);
    let fields = desc.fields(record);
    let id = desc
        .id_of(record)
        .ok_or_else(|| ImportError::missing_field("cloud rule", "id"))?;
    let name = hcl_string(&text(fields, "name"));

    let associations: Vec<String> = RULE_ASSOCIATIONS
        .iter()
        .map(|t| id_blocks(t.association_key(), graph.ids(*t)))
        .collect();

    let (owner_users, owner_groups) = owner_blocks(&owners);
    let data = json!({
        "resource_id": normalize_name(&name, None),
        "id": id,
        "name": name,
        "description": hcl_string(&text(fields, "description")),
        "pre_webhook_id": number_or_null(number(fields, "pre_webhook_id")),
        "post_webhook_id": number_or_null(number(fields, "post_webhook_id")),
        "associations": associations,
        "owner_users": owner_users,
        "owner_groups": owner_groups,
    });

    session.emit(
        Placement {
            family: Family::CloudRules,
            subdir: None,
            name: &name,
            id,
        },
        data,
        report,
        ledger,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Verb;
    use crate::config::ImportConfig;
    use crate::importer::test_support::Harness;

    #[test]
    fn test_rule_rendered_with_associations() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness
            .transport
            .get_data(
                "v3/cloud-rule",
                json!([{
                    "id": 7,
                    "name": "Baseline Guardrails",
                    "description": "Applies\nbaseline",
                    "built_in": false,
                    "pre_webhook_id": null,
                    "post_webhook_id": 3
                }]),
            )
            .get_data(
                "v3/cloud-rule/7",
                json!({
                    "cloud_rule": {"id": 7, "name": "Baseline Guardrails"},
                    "aws_iam_policies": [{"id": 1}, {"id": 2}],
                    "ous": [{"id": 4}],
                    "owner_users": [{"id": 11}],
                    "owner_user_groups": []
                }),
            )
            .get_data("v3/project", json!([{"id": 10}, {"id": 11}]))
            .get_data("v3/project/10/cloud-rule", json!([{"id": 7}]))
            .get_data("v3/project/11/cloud-rule", json!([{"id": 8}]));

        let mut ledger = ImportLedger::new();
        let report = import(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.imported, 1);
        let content = harness.file("cloud-rule/Baseline_Guardrails.tf").unwrap();
        assert!(content.contains("description                             = \"Applies\\nbaseline\""));
        assert!(content.contains("pre_webhook_id                          = null"));
        assert!(content.contains("post_webhook_id                         = 3"));
        assert!(content.contains("aws_iam_policies { id = 1 }\n    aws_iam_policies { id = 2 }"));
        assert!(content.contains("ous { id = 4 }"));
        assert!(content.contains("projects { id = 10 }"));
        assert!(!content.contains("projects { id = 11 }"));
        assert!(!content.contains("service_control_policies"));
        assert!(content.contains("owner_users { id = 11 }"));
        assert_eq!(
            ledger.resources()[0].address,
            "module.cloud-rule.kion_cloud_rule.Baseline_Guardrails"
        );
    }

    #[test]
    fn test_unresolved_projects_warned_not_fatal() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness
            .transport
            .get_data("v3/cloud-rule", json!([{"id": 7, "name": "R", "built_in": false}]))
            .get_data("v3/cloud-rule/7", json!({"aws_iam_policies": [{"id": 1}]}))
            .get_status("v3/project", 500);

        let mut ledger = ImportLedger::new();
        let report = import(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.imported, 1);
        assert!(report.failed.is_empty());
        assert!(
            harness
                .output
                .get_warnings()
                .iter()
                .any(|w| w.contains("Could not resolve projects for Cloud Rule R"))
        );
        assert!(harness.file("cloud-rule/R.tf").unwrap().contains("aws_iam_policies { id = 1 }"));
    }

    #[test]
    fn test_detail_failure_fails_only_that_rule() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness
            .transport
            .get_data(
                "v3/cloud-rule",
                json!([
                    {"id": 1, "name": "Gone", "built_in": false},
                    {"id": 2, "name": "Kept", "built_in": false}
                ]),
            )
            .get_status("v3/cloud-rule/1", 404)
            .get_data("v3/cloud-rule/2", json!({}))
            .get_data("v3/project", json!([]));

        let mut ledger = ImportLedger::new();
        let report = import(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.failed, vec!["Gone".to_string()]);
        assert_eq!(report.imported, 1);
        assert!(harness.file("cloud-rule/Kept.tf").is_some());
    }

    #[test]
    fn test_built_in_rule_cloned_with_associations() {
        let harness = Harness::new(ImportConfig::for_tests("/repo").with_clone("co_", vec![5], vec![]));
        harness
            .transport
            .get_data(
                "v3/cloud-rule",
                json!([{"id": 1, "name": "Kion Default", "built_in": true, "description": "d"}]),
            )
            .get_data("v3/cloud-rule/1", json!({"compliance_standards": [{"id": 6}]}))
            .get_data("v3/project", json!([{"id": 10}]))
            .get_data("v3/project/10/cloud-rule", json!([{"id": 1}]))
            .post_data("v1/search", json!([]))
            .post_created("v3/cloud-rule", 90)
            .get_data(
                "v3/cloud-rule/90",
                json!({"cloud_rule": {"id": 90, "name": "co_Kion Default", "description": "d"}}),
            );

        let mut ledger = ImportLedger::new();
        let report = import(&harness.session(), &mut ledger).unwrap();
        assert_eq!(report.cloned, 1);

        let create = harness
            .transport
            .requests()
            .into_iter()
            .find(|r| r.verb == Verb::Post && r.url.ends_with("/api/v3/cloud-rule"))
            .unwrap();
        let body = create.body.unwrap();
        assert_eq!(body["name"], "co_Kion Default");
        assert_eq!(body["compliance_standard_ids"], json!([6]));
        assert_eq!(body["project_ids"], json!([10]));
        assert_eq!(body["iam_policy_ids"], json!([]));
        assert!(body.get("built_in").is_none());
        assert!(body.get("id").is_none());

        let content = harness.file("cloud-rule/co_Kion_Default.tf").unwrap();
        assert!(content.contains("compliance_standards { id = 6 }"));
        assert!(content.contains("owner_users { id = 5 }"));
        assert_eq!(ledger.resources()[0].id, 90);
    }

    #[test]
    fn test_built_in_rule_not_cloned_when_projects_unresolved() {
        let harness = Harness::new(ImportConfig::for_tests("/repo").with_clone("co_", vec![5], vec![]));
        harness
            .transport
            .get_data(
                "v3/cloud-rule",
                json!([{"id": 1, "name": "Kion Default", "built_in": true, "description": "d"}]),
            )
            .get_data("v3/cloud-rule/1", json!({"compliance_standards": [{"id": 6}]}))
            .get_status("v3/project", 500)
            .post_data("v1/search", json!([]))
            .post_created("v3/cloud-rule", 90);

        let mut ledger = ImportLedger::new();
        let report = import(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.cloned, 0);
        assert_eq!(report.failed, vec!["Kion Default".to_string()]);
        assert_eq!(harness.transport.count(Verb::Post, "/api/v1/search"), 0);
        assert_eq!(harness.transport.count(Verb::Post, "/api/v3/cloud-rule"), 0);
        assert!(harness.file("cloud-rule/co_Kion_Default.tf").is_none());
        assert!(ledger.resources().is_empty());
    }

    #[test]
    fn test_built_in_rule_skipped_without_fetching_detail() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness
            .transport
            .get_data("v3/cloud-rule", json!([{"id": 1, "name": "Default", "built_in": true}]));

        let mut ledger = ImportLedger::new();
        let report = import(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(harness.transport.count(Verb::Get, "/api/v3/cloud-rule/1"), 0);
    }
}
