use serde_json::{Value, json};

use super::{FamilyReport, ImportSession, Placement, flag, text};
use crate::api::{ObjectFetcher, ResourceType};
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::ledger::ImportLedger;
use crate::reconcile::{OwnerSet, descriptor};
use crate::render::{hcl_string, heredoc, normalize_name, owner_blocks};

const TYPE: ResourceType = ResourceType::AzureRole;

pub(super) fn import(session: &ImportSession, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    let records = ObjectFetcher::new(session.gateway).fetch_all(TYPE)?;
    let mut report = FamilyReport {
        found: records.len(),
        ..Default::default()
    };
    session
        .ctx
        .output
        .info(&format!("Found {} Azure Roles", records.len()));

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

    // Azure's built-in roles cannot be owned by the platform at all
    if flag(fields, "azure_managed_policy") {
        session.skip(report, &format!("Skipping Azure-managed Azure Role: {}", name));
        return Ok(());
    }

    if flag(fields, "system_managed_policy") {
        if session.config.clone_directive().is_none() {
            session.skip(report, &format!("Skipping System-managed Azure Role: {}", name));
            return Ok(());
        }

        if let Some(clone) = session.clone_record(TYPE, fields.clone(), name, report) {
            write_role(session, &clone, session.clone_owners(), report, ledger)?;
        }
        return Ok(());
    }

    session
        .ctx
        .output
        .dimmed(&format!("Importing Azure Role - {}", name));
    write_role(session, record, OwnerSet::from_record(&desc, record), report, ledger)?;
    report.imported += 1;
    Ok(())
}

fn write_role(
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
        .ok_or_else(|| ImportError::missing_field("azure role", "id"))?;
    let name = hcl_string(&text(fields, "name"));

    let (owner_users, owner_groups) = owner_blocks(&owners);
    let data = json!({
        "resource_id": normalize_name(&name, None),
        "id": id,
        "name": name,
        "description": hcl_string(&text(fields, "description")),
        "owner_users": owner_users,
        "owner_groups": owner_groups,
        "role_permissions": heredoc(&text(fields, "role_permissions")),
    });

    session.emit(
        Placement {
            family: Family::AzureRoles,
            subdir: None,
            name: &name,
            id,
        },
        data,
        report,
        ledger,
    )
}
