use serde_json::{Value, json};

use super::{FamilyReport, ImportSession, Placement, flag, number, number_or_null, require_number, text};
use crate::api::{ObjectFetcher, ResourceType};
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::ledger::ImportLedger;
use crate::reconcile::{OwnerSet, descriptor};
use crate::render::{hcl_bool, hcl_string, heredoc, normalize_name, owner_blocks};

const TYPE: ResourceType = ResourceType::ComplianceCheck;

const PROVIDER_AWS: i64 = 1;
const PROVIDER_AZURE: i64 = 2;
const PROVIDER_GCP: i64 = 3;

const CHECK_EXTERNAL: i64 = 1;
const CHECK_C7N: i64 = 2;
const CHECK_AZURE_POLICY: i64 = 3;
const CHECK_TENABLE: i64 = 4;

const FREQUENCY_HOURS: i64 = 3;
const FREQUENCY_DAYS: i64 = 4;

/// Which optional attributes a check renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CheckShape {
    body: bool,
    azure_policy_id: bool,
}

/// Shape for a provider / check type pair, `None` when it cannot be rendered
fn shape_for(cloud_provider_id: i64, check_type_id: i64) -> Option<CheckShape> {
    match cloud_provider_id {
        PROVIDER_AWS | PROVIDER_GCP => Some(CheckShape {
            body: !matches!(check_type_id, CHECK_EXTERNAL | CHECK_TENABLE),
            azure_policy_id: false,
        }),
        PROVIDER_AZURE => match check_type_id {
            CHECK_EXTERNAL => Some(CheckShape {
                body: false,
                azure_policy_id: false,
            }),
            CHECK_C7N => Some(CheckShape {
                body: true,
                azure_policy_id: false,
            }),
            CHECK_AZURE_POLICY => Some(CheckShape {
                body: false,
                azure_policy_id: true,
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Frequency in the unit of its frequency type
fn frequency_in_unit(minutes: i64, frequency_type_id: i64) -> i64 {
    match frequency_type_id {
        FREQUENCY_HOURS => minutes / 60,
        FREQUENCY_DAYS => minutes / 1440,
        _ => minutes,
    }
}

/// `regions` as an HCL list; a leading empty entry means no regions
fn regions_literal(regions: Option<&Value>) -> String {
    match regions.and_then(Value::as_array) {
        Some(list) if list.first().and_then(Value::as_str) != Some("") => Value::Array(list.clone()).to_string(),
        _ => "[]".to_string(),
    }
}

pub(super) fn import(session: &ImportSession, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
    let checks = ObjectFetcher::new(session.gateway).fetch_all(TYPE)?;
    let mut report = FamilyReport {
        found: checks.len(),
        ..Default::default()
    };
    session
        .ctx
        .output
        .info(&format!("Found {} Compliance Checks", checks.len()));

    let desc = descriptor(TYPE);
    for check in &checks {
        let name = desc.name_of(check).unwrap_or("<unnamed>").to_string();
        if let Err(err) = import_one(session, check, &name, &mut report, ledger) {
            session.record_failure(&mut report, &name, &err);
        }
    }

    Ok(report)
}

fn import_one(
    session: &ImportSession,
    check: &Value,
    name: &str,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let desc = descriptor(TYPE);
    let fields = desc.fields(check);
    let system_managed = flag(fields, "ct_managed");

    if system_managed && session.config.clone_directive().is_none() {
        session.skip(report, &format!("Skipping System-managed Compliance Check - {}", name));
        return Ok(());
    }

    let cloud_provider_id = require_number(fields, "cloud_provider_id", "compliance check")?;
    let check_type_id = require_number(fields, "compliance_check_type_id", "compliance check")?;
    let Some(shape) = shape_for(cloud_provider_id, check_type_id) else {
        session.skip(
            report,
            &format!(
                "Skipping Compliance Check {}: unsupported cloud provider {} / check type {}",
                name, cloud_provider_id, check_type_id
            ),
        );
        return Ok(());
    };

    if system_managed {
        if let Some(clone) = session.clone_record(TYPE, fields.clone(), name, report) {
            write_check(session, &clone, shape, session.clone_owners(), report, ledger)?;
        }
        return Ok(());
    }

    session
        .ctx
        .output
        .dimmed(&format!("Importing Compliance Check - {}", name));

    let id = desc
        .id_of(check)
        .ok_or_else(|| ImportError::missing_field("compliance check", "id"))?;
    let details = ObjectFetcher::new(session.gateway).fetch_one(TYPE, id)?;
    let owners = OwnerSet::from_record(&desc, &details);

    write_check(session, check, shape, owners, report, ledger)?;
    report.imported += 1;
    Ok(())
}

fn write_check(
    session: &ImportSession,
    record: &Value,
    shape: CheckShape,
    owners: OwnerSet,
    report: &mut FamilyReport,
    ledger: &mut ImportLedger,
) -> ImportResult<()> {
    let desc = descriptor(TYPE);
    let fields = desc.fields(record);
    let id = desc
        .id_of(record)
        .ok_or_else(|| ImportError::missing_field("compliance check", "id"))?;
    let name = hcl_string(&text(fields, "name"));

    let frequency_type_id = number(fields, "frequency_type_id").unwrap_or_default();
    let frequency_minutes = frequency_in_unit(
        number(fields, "frequency_minutes").unwrap_or_default(),
        frequency_type_id,
    );

    let azure_policy_id = if shape.azure_policy_id {
        number_or_null(number(fields, "azure_policy_id"))
    } else {
        String::new()
    };
    let body = if shape.body {
        heredoc(&text(fields, "body"))
    } else {
        String::new()
    };

    let (owner_users, owner_groups) = owner_blocks(&owners);
    let data = json!({
        "resource_id": normalize_name(&name, None),
        "id": id,
        "name": name,
        "description": hcl_string(&text(fields, "description")),
        "created_by_user_id": number_or_null(number(fields, "created_by_user_id")),
        "regions": regions_literal(fields.get("regions")),
        "azure_policy_id": azure_policy_id,
        "cloud_provider_id": number_or_null(number(fields, "cloud_provider_id")),
        "compliance_check_type_id": number_or_null(number(fields, "compliance_check_type_id")),
        "severity_type_id": number_or_null(number(fields, "severity_type_id")),
        "frequency_minutes": frequency_minutes,
        "frequency_type_id": frequency_type_id,
        "is_all_regions": hcl_bool(flag(fields, "is_all_regions")),
        "is_auto_archived": hcl_bool(flag(fields, "is_auto_archived")),
        "owner_users": owner_users,
        "owner_groups": owner_groups,
        "body": body,
    });

    session.emit(
        Placement {
            family: Family::ComplianceChecks,
            subdir: None,
            name: &name,
            id,
        },
        data,
        report,
        ledger,
    )
}
