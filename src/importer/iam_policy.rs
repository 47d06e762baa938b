use serde_json::{Value, json};
use std::path::PathBuf;

use super::{FamilyReport, ImportSession, Placement, flag, text};
use crate::api::{ObjectFetcher, ResourceType};
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::ledger::ImportLedger;
use crate::reconcile::{OwnerSet, descriptor};
use crate::render::{build_filename, hcl_string, heredoc, normalize_name, owner_blocks};

const TYPE: ResourceType = ResourceType::IamPolicy;

pub(super) fn import(session: &ImportSession, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    let records = ObjectFetcher::new(session.gateway).fetch_all(TYPE)?;
    let mut report = FamilyReport {
        found: records.len(),
        ..Default::default()
    };
    session
        .ctx
        .output
        .info(&format!("Found {} IAM Policies", records.len()));

    let desc = descriptor(TYPE);
    for record in &records {
        let name = desc.name_of(record).unwrap_or("<unnamed>").to_string();
        if let Err(err) = import_one(session, record, &name, &mut report, ledger) {
            session.record_failure(&mut report, &name, &err);
        }
    }

    Ok(report)
}

fn import_one(
    session: &ImportSession,
    record: &Value,
    name: &str,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let desc = descriptor(TYPE);
    let fields = desc.fields(record);

    let aws_managed = flag(fields, "aws_managed_policy");
    if aws_managed && !session.config.import_aws_managed {
        session.skip(report, &format!("Skipping AWS-managed IAM Policy: {}", name));
        return Ok(());
    }

    if flag(fields, "system_managed_policy") {
        if session.config.clone_directive().is_none() {
            session.skip(report, &format!("Skipping System-managed IAM Policy: {}", name));
            return Ok(());
        }

        let Some(clone) = session.clone_record(TYPE, fields.clone(), name, report) else {
            return Ok(());
        };
        return write_policy(session, &clone, session.clone_owners(), report, ledger).map(|_| ());
    }

    session
        .ctx
        .output
        .dimmed(&format!("Importing IAM Policy - {}", name));
    let owners = OwnerSet::from_record(&desc, record);

    if aws_managed {
        write_aws_managed(session, record, owners, report)
    } else {
        write_policy(session, record, owners, report, ledger)?;
        report.imported += 1;
        Ok(())
    }
}

/// Template data for one policy, with its display name and id
fn policy_data(record: &Value, owners: &OwnerSet) -> ImportResult<(String, i64, Value)> {
    let desc = descriptor(TYPE);
    let fields = desc.fields(record);
    let id = desc
        .id_of(record)
        .ok_or_else(|| ImportError::missing_field("iam policy", "id"))?;
    let name = hcl_string(&text(fields, "name"));

    let aws_iam_path = match fields.get("aws_iam_path").or_else(|| record.get("aws_iam_path")) {
        Some(Value::String(path)) => path.trim().to_string(),
        _ => String::new(),
    };

    let (owner_users, owner_groups) = owner_blocks(owners);
    let data = json!({
        "resource_id": normalize_name(&name, None),
        "id": id,
        "name": name,
        "description": hcl_string(&text(fields, "description")),
        "aws_iam_path": aws_iam_path,
        "owner_users": owner_users,
        "owner_groups": owner_groups,
        "policy": heredoc(&text(fields, "policy")),
    });

    Ok((name, id, data))
}

fn write_policy(
    session: &ImportSession,
    record: &Value,
    owners: OwnerSet,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<i64> {
    let (name, id, data) = policy_data(record, &owners)?;
    session.emit(
        Placement {
            family: Family::IamPolicies,
            subdir: None,
            name: &name,
            id,
        },
        data,
        report,
        ledger,
    )?;
    Ok(id)
}

/// AWS-managed policies are written for reference only: a `.tf.skip` file
/// that Terraform ignores, and no state import entry.
fn write_aws_managed(
    session: &ImportSession,
    record: &Value,
    owners: OwnerSet,
    report: &mut FamilyReport,
) -> ImportResult<()> {
    let (name, id, data) = policy_data(record, &owners)?;
    let content = session.renderer.render_resource(Family::IamPolicies, &data)?;

    let stem = build_filename(&name, true, session.config.prepend_id, id);
    let relative = PathBuf::from(Family::IamPolicies.module_dir()).join(format!("{}.tf.skip", stem));
    session.writer.write_resource(relative, &content)?;

    report.skipped += 1;
    Ok(())
}
