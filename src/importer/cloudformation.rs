use serde_json::{Value, json};

use super::{FamilyReport, ImportSession, Placement, flag, text};
use crate::api::{ObjectFetcher, ResourceType};
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::ledger::ImportLedger;
use crate::reconcile::{OwnerSet, descriptor};
use crate::render::{hcl_bool, hcl_string, heredoc, normalize_name, owner_blocks};

const TYPE: ResourceType = ResourceType::CloudFormationTemplate;

/// CloudFormation templates are imported as-is; they are never cloned
pub(super) fn import(session: &ImportSession, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    let records = ObjectFetcher::new(session.gateway).fetch_all(TYPE)?;
    let mut report = FamilyReport {
        found: records.len(),
        ..Default::default()
    };
    session
        .ctx
        .output
        .info(&format!("Found {} CFTs", records.len()));

    let desc = descriptor(TYPE);
    for record in &records {
        if let Err(err) = import_one(session, record, &mut report, ledger) {
            let name = desc.name_of(record).unwrap_or("<unnamed>");
            session.record_failure(&mut report, name, &err);
        }
    }

    Ok(report)
}

fn import_one(
    session: &ImportSession,
    record: &Value,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let desc = descriptor(TYPE);
    let fields = desc.fields(record);
    let id = desc
        .id_of(record)
        .ok_or_else(|| ImportError::missing_field("cloudformation template", "id"))?;
    let name = hcl_string(&text(fields, "name"));

    session
        .ctx
        .output
        .dimmed(&format!("Importing CFT - {}", name));

    let (owner_users, owner_groups) = owner_blocks(&OwnerSet::from_record(&desc, record));
    let regions = match fields.get("regions") {
        Some(list @ Value::Array(_)) => list.to_string(),
        _ => "[]".to_string(),
    };

    let data = json!({
        "resource_id": normalize_name(&name, None),
        "id": id,
        "name": name,
        "description": hcl_string(&text(fields, "description")),
        "regions": regions,
        "region": text(fields, "region"),
        "sns_arns": hcl_string(&text(fields, "sns_arns")),
        "termination_protection": hcl_bool(flag(fields, "termination_protection")),
        "owner_users": owner_users,
        "owner_groups": owner_groups,
        "template_parameters": heredoc(&text(fields, "template_parameters")),
        "policy": heredoc(&text(fields, "policy")),
    });

    session.emit(
        Placement {
            family: Family::CloudFormationTemplates,
            subdir: None,
            name: &name,
            id,
        },
        data,
        report,
        ledger,
    )?;
    report.imported += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::importer::test_support::Harness;

    #[test]
    fn test_imports_templates() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness.transport.get_data(
            "v3/cft",
            json!([
                {
                    "cft": {
                        "id": 3,
                        "name": "VPC Baseline",
                        "description": "Creates \"the\" VPC",
                        "regions": ["us-east-1"],
                        "region": "",
                        "sns_arns": "",
                        "template_parameters": "",
                        "termination_protection": true,
                        "policy": "Resources:\n  Bucket: !Sub '${AWS::StackName}'\n"
                    },
                    "owner_users": [{"id": 1}],
                    "owner_user_groups": [{"id": 2}]
                },
                {"cft": {"name": "broken"}}
            ]),
        );

        let mut ledger = ImportLedger::new();
        let report = import(&harness.session(), &mut ledger).unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.imported, 1);
        assert_eq!(report.failed, vec!["broken".to_string()]);

        let content = harness.file("aws-cloudformation-template/VPC_Baseline.tf").unwrap();
        assert!(content.contains("resource \"kion_aws_cloudformation_template\" \"VPC_Baseline\""));
        assert!(content.contains("description             = \"Creates 'the' VPC\""));
        assert!(content.contains("termination_protection  = true"));
        assert!(content.contains("owner_user_groups { id = 2 }"));
        assert!(content.contains("$${AWS::StackName}"));
        assert!(!content.contains("template_parameters"));

        assert_eq!(
            ledger.resources()[0].address,
            "module.aws-cloudformation-template.kion_aws_cloudformation_template.VPC_Baseline"
        );
        assert_eq!(ledger.resources()[0].id, 3);
    }

    #[test]
    fn test_prepend_id_changes_filename_only() {
        let mut config = ImportConfig::for_tests("/repo");
        config.prepend_id = true;
        let harness = Harness::new(config);
        harness.transport.get_data(
            "v3/cft",
            json!([{"cft": {"id": 8, "name": "T", "policy": "x"}, "owner_users": []}]),
        );

        let mut ledger = ImportLedger::new();
        import(&harness.session(), &mut ledger).unwrap();

        assert!(harness.file("aws-cloudformation-template/8-T.tf").is_some());
        assert_eq!(
            ledger.resources()[0].address,
            "module.aws-cloudformation-template.kion_aws_cloudformation_template.T"
        );
    }

    #[test]
    fn test_collection_failure_is_family_error() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness.transport.get_status("v3/cft", 500);

        let mut ledger = ImportLedger::new();
        assert!(import(&harness.session(), &mut ledger).is_err());
        assert!(ledger.resources().is_empty());
    }
}
