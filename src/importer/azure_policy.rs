use serde_json::{Value, json};

use super::{FamilyReport, ImportSession, Placement, flag, text};
use crate::api::{ObjectFetcher, ResourceType};
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::ledger::ImportLedger;
use crate::reconcile::{OwnerSet, descriptor};
use crate::render::{hcl_string, heredoc, normalize_name, owner_blocks};

const TYPE: ResourceType = ResourceType::AzurePolicy;

pub(super) fn import(session: &ImportSession, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    let records = ObjectFetcher::new(session.gateway).fetch_all(TYPE)?;
    let mut report = FamilyReport {
        found: records.len(),
        ..Default::default()
    };
    session
        .ctx
        .output
        .info(&format!("Found {} Azure Policies", records.len()));

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

    if flag(desc.fields(record), "ct_managed") {
        if session.config.clone_directive().is_none() {
            session.skip(report, &format!("Skipping System-managed Azure Policy: {}", name));
            return Ok(());
        }

        let candidate = as_custom_policy(record)?;
        if let Some(clone) = session.clone_record(TYPE, candidate, name, report) {
            write_policy(session, &clone, session.clone_owners(), report, ledger)?;
        }
        return Ok(());
    }

    session
        .ctx
        .output
        .dimmed(&format!("Importing Azure Policy - {}", name));
    write_policy(session, record, OwnerSet::from_record(&desc, record), report, ledger)?;
    report.imported += 1;
    Ok(())
}

/// A copy of a system-managed policy that the platform accepts as a custom
/// one: no managed definition id, and `policyType` set to `Custom`.
fn as_custom_policy(record: &Value) -> ImportResult<Value> {
    let mut candidate = record.clone();
    let Some(nested) = candidate.get_mut("azure_policy").and_then(Value::as_object_mut) else {
        return Err(ImportError::missing_field("azure policy", "azure_policy"));
    };

    nested.remove("azure_managed_policy_def_id");

    let source = match nested.get("policy") {
        Some(Value::String(source)) => source.clone(),
        _ => return Err(ImportError::missing_field("azure policy", "policy")),
    };
    let mut definition: Value = serde_json::from_str(&source).map_err(|_| ImportError::UnexpectedShape {
        field: "policy".to_string(),
        expected: "a JSON policy definition",
    })?;
    let Some(definition_map) = definition.as_object_mut() else {
        return Err(ImportError::UnexpectedShape {
            field: "policy".to_string(),
            expected: "a JSON object",
        });
    };
    definition_map.insert("policyType".to_string(), json!("Custom"));
    nested.insert("policy".to_string(), Value::String(definition.to_string()));

    Ok(candidate)
}

fn write_policy(
    session: &ImportSession,
    record: &Value,
    owners: OwnerSet,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let desc = descriptor(TYPE);
    let fields = desc.fields(record);
    let id = desc
        .id_of(record)
        .ok_or_else(|| ImportError::missing_field("azure policy", "id"))?;
    let name = hcl_string(&text(fields, "name"));

    let (owner_users, owner_groups) = owner_blocks(&owners);
    let data = json!({
        "resource_id": normalize_name(&name, None),
        "id": id,
        "name": name,
        "description": hcl_string(&text(fields, "description")),
        "azure_managed_policy_def_id": text(fields, "azure_managed_policy_def_id"),
        "owner_users": owner_users,
        "owner_groups": owner_groups,
        "policy": heredoc(&text(fields, "policy")),
        "parameters": heredoc(&text(fields, "parameters")),
    });

    session.emit(
        Placement {
            family: Family::AzurePolicies,
            subdir: None,
            name: &name,
            id,
        },
        data,
        report,
        ledger,
    )
}
