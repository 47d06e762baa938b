use serde_json::{Value, json};

use super::{FamilyReport, ImportSession, Placement, flag, number, number_or_null, text};
use crate::api::{ObjectFetcher, ResourceType, extract_ids};
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::ledger::ImportLedger;
use crate::reconcile::{OwnerSet, descriptor};
use crate::render::{hcl_string, id_blocks, normalize_name, owner_blocks};

const TYPE: ResourceType = ResourceType::ComplianceStandard;

/// Fields of a standard that only the detail record carries
struct StandardDetail {
    description: String,
    created_by_user_id: Option<i64>,
    check_ids: Vec<i64>,
    owners: OwnerSet,
}

impl StandardDetail {
    fn from_record(detail: &Value) -> Self {
        let desc = descriptor(TYPE);
        let fields = desc.fields(detail);
        Self {
            description: text(fields, "description"),
            created_by_user_id: number(fields, "created_by_user_id"),
            check_ids: detail
                .get("compliance_checks")
                .map(extract_ids)
                .unwrap_or_default(),
            owners: OwnerSet::from_record(&desc, detail),
        }
    }
}

pub(super) fn import(session: &ImportSession, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    let standards = ObjectFetcher::new(session.gateway).fetch_all(TYPE)?;
    let mut report = FamilyReport {
        found: standards.len(),
        ..Default::default()
    };
    session
        .ctx
        .output
        .info(&format!("Found {} Compliance Standards", standards.len()));

    let desc = descriptor(TYPE);
    for standard in &standards {
        let name = desc.name_of(standard).unwrap_or("<unnamed>").to_string();
        if let Err(err) = import_one(session, standard, &name, &mut report, ledger) {
            session.record_failure(&mut report, &name, &err);
        }
    }

    Ok(report)
}

/// Built-in standards are marked `ct_managed` or were created by user 0.
/// A name already carrying the clone prefix is one of our own clones.
fn is_system_managed(session: &ImportSession, fields: &Value, name: &str) -> bool {
    (flag(fields, "ct_managed") || number(fields, "created_by_user_id") == Some(0))
        && !session.config.has_clone_prefix(name)
}

fn import_one(
    session: &ImportSession,
    standard: &Value,
    name: &str,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let desc = descriptor(TYPE);
    let fields = desc.fields(standard);
    let system_managed = is_system_managed(session, fields, name);

    if system_managed && session.config.clone_directive().is_none() {
        session.skip(report, &format!("Skipping built-in Compliance Standard - {}", name));
        return Ok(());
    }

    let id = desc
        .id_of(standard)
        .ok_or_else(|| ImportError::missing_field("compliance standard", "id"))?;
    let detail = StandardDetail::from_record(&ObjectFetcher::new(session.gateway).fetch_one(TYPE, id)?);

    if system_managed {
        let candidate = json!({
            "name": name,
            "description": detail.description,
            "created_by_user_id": detail.created_by_user_id,
            "compliance_checks": detail.check_ids,
        });
        if let Some(clone) = session.clone_record(TYPE, candidate, name, report) {
            let clone_fields = desc.fields(&clone);
            let clone_id = desc
                .id_of(&clone)
                .ok_or_else(|| ImportError::missing_field("compliance standard clone", "id"))?;
            write_standard(
                session,
                StandardRender {
                    id: clone_id,
                    name: &text(clone_fields, "name"),
                    description: &detail.description,
                    created_by_user_id: number(clone_fields, "created_by_user_id"),
                    check_ids: &detail.check_ids,
                    owners: &session.clone_owners(),
                },
                report,
                ledger,
            )?;
        }
        return Ok(());
    }

    session
        .ctx
        .output
        .dimmed(&format!("Importing Compliance Standard - {}", name));
    write_standard(
        session,
        StandardRender {
            id,
            name,
            description: &detail.description,
            created_by_user_id: detail.created_by_user_id,
            check_ids: &detail.check_ids,
            owners: &detail.owners,
        },
        report,
        ledger,
    )?;
    report.imported += 1;
    Ok(())
}

struct StandardRender<'r> {
    id: i64,
    name: &'r str,
    description: &'r str,
    created_by_user_id: Option<i64>,
    check_ids: &'r [i64],
    owners: &'r OwnerSet,
}

fn write_standard(
    session: &ImportSession,
    standard: StandardRender<'_>,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let name = hcl_string(standard.name);
    let (owner_users, owner_groups) = owner_blocks(standard.owners);
    let data = json!({
        "resource_id": normalize_name(&name, None),
        "id": standard.id,
        "name": name,
        "description": hcl_string(standard.description),
        "created_by_user_id": number_or_null(standard.created_by_user_id),
        "owner_users": owner_users,
        "owner_groups": owner_groups,
        "compliance_checks": id_blocks("compliance_checks", standard.check_ids),
    });

    session.emit(
        Placement {
            family: Family::ComplianceStandards,
            subdir: None,
            name: &name,
            id: standard.id,
        },
        data,
        report,
        ledger,
    )
}
