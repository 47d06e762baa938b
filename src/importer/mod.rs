//! Per-family import orchestration.
//!
//! Every family fetches its collection, decides per record whether to skip,
//! import or clone it, renders what survives and records it in the ledger.
//! A failure on one record is reported and the loop moves on; a failure to
//! fetch the collection abandons that family only.

mod access_role;
mod azure_policy;
mod azure_role;
mod cloud_rule;
mod cloudformation;
mod compliance_check;
mod compliance_standard;
mod iam_policy;

use anyhow::{Context as _, Result};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::api::{ApiGateway, ResourceType};
use crate::config::ImportConfig;
use crate::context::Context;
use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::layout;
use crate::ledger::ImportLedger;
use crate::reconcile::{OwnerSet, ReconcileOutcome, Reconciler};
use crate::render::{Renderer, build_filename, normalize_name};
use crate::writer::{IMPORT_SCRIPT, ImportWriter, WriteOutcome};

/// Tally for one family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyReport {
    /// Records in the fetched collection
    pub found: usize,
    pub imported: usize,
    pub cloned: usize,
    /// System-managed records whose clone already existed
    pub existing_clones: usize,
    pub skipped: usize,
    /// Resource files left untouched because they already existed
    pub kept: usize,
    /// Names of records that could not be processed
    pub failed: Vec<String>,
}

impl FamilyReport {
    fn fail(&mut self, name: &str) {
        self.failed.push(name.to_string());
    }

    fn summary_line(&self) -> String {
        format!(
            "{} found, {} imported, {} cloned, {} already cloned, {} skipped, {} kept, {} failed",
            self.found,
            self.imported,
            self.cloned,
            self.existing_clones,
            self.skipped,
            self.kept,
            self.failed.len()
        )
    }
}

/// Result of a family run
#[derive(Debug)]
pub enum FamilyStatus {
    Completed(FamilyReport),
    Skipped,
    Failed(ImportError),
}

/// Everything produced by a run
#[derive(Debug)]
pub struct ImportSummary {
    pub families: Vec<(Family, FamilyStatus)>,
    pub ledger: ImportLedger,
}

impl ImportSummary {
    pub fn report(&self, family: Family) -> Option<&FamilyReport> {
        self.families.iter().find_map(|(f, status)| match status {
            FamilyStatus::Completed(report) if *f == family => Some(report),
            _ => None,
        })
    }
}

/// Where a rendered resource goes and how it is recorded
pub(crate) struct Placement<'p> {
    pub family: Family,
    /// Directory below the module directory, e.g. a project's `<id>-<name>`
    pub subdir: Option<&'p str>,
    pub name: &'p str,
    pub id: i64,
}

/// Shared collaborators for one run
pub struct ImportSession<'a> {
    pub ctx: &'a Context,
    pub config: &'a ImportConfig,
    pub gateway: &'a ApiGateway,
    pub renderer: &'a Renderer,
    pub writer: &'a ImportWriter,
}

impl<'a> ImportSession<'a> {
    pub fn new(
        ctx: &'a Context,
        config: &'a ImportConfig,
        gateway: &'a ApiGateway,
        renderer: &'a Renderer,
        writer: &'a ImportWriter,
    ) -> Self {
        Self {
            ctx,
            config,
            gateway,
            renderer,
            writer,
        }
    }

    /// Run one family
    pub fn import_family(&self, family: Family, ledger: &mut ImportLedger) -> ImportResult<FamilyReport> {
        match family {
            Family::CloudFormationTemplates => cloudformation::import(self, ledger),
            Family::IamPolicies => iam_policy::import(self, ledger),
            Family::AzurePolicies => azure_policy::import(self, ledger),
            Family::AzureRoles => azure_role::import(self, ledger),
            Family::ProjectRoles => access_role::import_project_roles(self, ledger),
            Family::OuRoles => access_role::import_ou_roles(self, ledger),
            Family::CloudRules => cloud_rule::import(self, ledger),
            Family::ComplianceChecks => compliance_check::import(self, ledger),
            Family::ComplianceStandards => compliance_standard::import(self, ledger),
        }
    }

    /// Render and write one resource, then record it in the ledger
    pub(crate) fn emit(
        &self,
        placement: Placement<'_>,
        data: Value,
        report: &mut FamilyReport,
        ledger: &mut ImportLedger,
    ) -> ImportResult<()> {
        let content = self.renderer.render_resource(placement.family, &data)?;

        let stem = build_filename(placement.name, false, self.config.prepend_id, placement.id);
        let mut relative = PathBuf::from(placement.family.module_dir());
        if let Some(subdir) = placement.subdir {
            relative.push(subdir);
        }
        relative.push(format!("{}.tf", stem));

        if let WriteOutcome::Kept(path) = self.writer.write_resource(&relative, &content)? {
            debug!(path = %path.display(), "resource file already present");
            report.kept += 1;
        }

        ledger.record_resource(
            placement.family.resource_address(&normalize_name(placement.name, None)),
            placement.id,
        );
        Ok(())
    }

    /// Find-or-clone a system-managed record. Returns the clone to render, or
    /// `None` when there is nothing to render (clone exists or cloning failed).
    pub(crate) fn clone_record(
        &self,
        resource_type: ResourceType,
        candidate: Value,
        original_name: &str,
        report: &mut FamilyReport,
    ) -> Option<Value> {
        let directive = self.config.clone_directive()?;

        match Reconciler::new(self.gateway).reconcile(resource_type, candidate, directive) {
            Ok(ReconcileOutcome::Created(record)) => {
                self.ctx.output.success(&format!(
                    "Cloned system-managed {}: {} -> {}",
                    resource_type,
                    original_name,
                    directive.clone_name(original_name)
                ));
                report.cloned += 1;
                Some(record)
            }
            Ok(ReconcileOutcome::AlreadyExists(_)) => {
                self.ctx.output.dimmed(&format!(
                    "Already found a clone of {}. Skipping.",
                    original_name
                ));
                report.existing_clones += 1;
                None
            }
            Err(err) => {
                self.ctx
                    .output
                    .error(&format!("An error occurred cloning {}: {}", original_name, err));
                report.fail(original_name);
                None
            }
        }
    }

    /// Owners attached to clones
    pub(crate) fn clone_owners(&self) -> OwnerSet {
        self.config
            .clone_directive()
            .map(|d| OwnerSet::new(d.owner_user_ids.clone(), d.owner_group_ids.clone()))
            .unwrap_or_default()
    }

    pub(crate) fn skip(&self, report: &mut FamilyReport, message: &str) {
        self.ctx.output.dimmed(message);
        report.skipped += 1;
    }

    pub(crate) fn record_failure(&self, report: &mut FamilyReport, name: &str, err: &ImportError) {
        self.ctx
            .output
            .error(&format!("Failed to import {}: {}", name, err));
        report.fail(name);
    }
}

/// Validate the environment, import every enabled family and write the
/// root module file and state import script.
pub fn run(ctx: &Context, config: &ImportConfig) -> Result<ImportSummary> {
    let gateway = ApiGateway::new(ctx.transport.clone(), &config.kion_url);
    gateway
        .probe(&config.kion_url)
        .with_context(|| format!("Unable to connect to {}", config.kion_url))?;

    layout::ensure_layout(ctx, config)?;

    let renderer = Renderer::new()?;
    let writer = ImportWriter::new(ctx.fs.clone(), config.import_dir.clone(), config.overwrite);
    let session = ImportSession::new(ctx, config, &gateway, &renderer, &writer);

    ctx.output
        .info(&format!("Beginning import from {}", config.kion_url));

    let mut ledger = ImportLedger::new();
    let mut families = Vec::new();

    for family in Family::ALL {
        if config.is_skipped(family) {
            ctx.output.dimmed(&format!("Skipping {}", family.title()));
            families.push((family, FamilyStatus::Skipped));
            continue;
        }

        ctx.output.section(&format!("Importing {}", family.title()));
        match session.import_family(family, &mut ledger) {
            Ok(report) => {
                if report.found > 0 {
                    ledger.record_module(family.module_dir());
                    let provider = PathBuf::from(family.module_dir()).join("provider.tf");
                    writer.write_scaffold(provider, renderer.provider_file())?;
                }
                info!(family = family.module_dir(), "{}", report.summary_line());
                ctx.output.success("Done.");
                families.push((family, FamilyStatus::Completed(report)));
            }
            Err(err) => {
                ctx.output
                    .error(&format!("Error while importing {}: {}", family.title(), err));
                families.push((family, FamilyStatus::Failed(err)));
            }
        }
    }

    let main = writer.write_scaffold("main.tf", &renderer.render_main(ledger.modules())?)?;
    writer.write_import_script(&ledger)?;

    let summary = ImportSummary { families, ledger };
    print_summary(ctx, config, &summary, &main);
    Ok(summary)
}

fn print_summary(ctx: &Context, config: &ImportConfig, summary: &ImportSummary, main: &std::path::Path) {
    ctx.output.section("Summary");
    for (family, status) in &summary.families {
        let line = match status {
            FamilyStatus::Completed(report) => report.summary_line(),
            FamilyStatus::Skipped => "skipped".to_string(),
            FamilyStatus::Failed(err) => format!("failed: {}", err),
        };
        ctx.output.key_value(family.title(), &line);
    }

    for (family, status) in &summary.families {
        if let FamilyStatus::Completed(report) = status {
            if !report.failed.is_empty() {
                ctx.output.warning(&format!(
                    "{} that could not be imported: {}",
                    family.title(),
                    report.failed.join(", ")
                ));
            }
        }
    }

    ctx.output.blank();
    ctx.output.key_value("Root module", &main.display().to_string());
    ctx.output
        .info("If you need to refresh the terraform state of the imported resources, run:");
    ctx.output.dimmed(&format!(
        "  cd {} ; bash {}",
        config.import_dir.display(),
        IMPORT_SCRIPT
    ));
    ctx.output.success("Import finished.");
}

/// String field of a record, empty when absent or null
pub(crate) fn text(record: &Value, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub(crate) fn flag(record: &Value, field: &str) -> bool {
    record.get(field).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn number(record: &Value, field: &str) -> Option<i64> {
    record.get(field).and_then(Value::as_i64)
}

/// A required integer field
pub(crate) fn require_number(record: &Value, field: &str, context: &str) -> ImportResult<i64> {
    number(record, field).ok_or_else(|| ImportError::missing_field(context, field))
}

/// HCL literal for an optional integer
pub(crate) fn number_or_null(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::Harness;
    use super::*;
    use crate::api::Verb;
    use crate::error::TransportKind;
    use crate::traits::{FileSystem, TransportFailure};
    use serde_json::json;

    #[test]
    fn test_summary_line_counts_kept_files() {
        let report = FamilyReport {
            found: 3,
            imported: 2,
            kept: 1,
            failed: vec!["x".to_string()],
            ..Default::default()
        };

        assert_eq!(
            report.summary_line(),
            "3 found, 2 imported, 0 cloned, 0 already cloned, 0 skipped, 1 kept, 1 failed"
        );
    }

    fn empty_platform(harness: &Harness) {
        for path in [
            "v3/cft",
            "v3/iam-policy",
            "v3/azure-policy",
            "v3/azure-role",
            "v3/project",
            "v3/ou",
            "v3/cloud-rule",
            "v3/compliance/check",
            "v3/compliance/standard",
        ] {
            harness.transport.get_data(path, json!([]));
        }
    }

    #[test]
    fn test_run_against_empty_platform_writes_scaffolding() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        empty_platform(&harness);

        let summary = run(&harness.ctx, &harness.config).unwrap();

        assert!(summary.ledger.modules().is_empty());
        assert_eq!(summary.families.len(), 9);
        assert_eq!(harness.file("import_resource_state.sh").unwrap(), "#!/bin/bash\n");
        let main = harness.file("main.tf").unwrap();
        assert!(main.contains("kionsoftware/kion"));
        assert!(!main.contains("module \""));
        assert!(harness.output.get_successes().contains(&"Import finished.".to_string()));
    }

    #[test]
    fn test_unreachable_platform_aborts_before_any_family() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        harness.transport.on(
            Verb::Get,
            "kion.test",
            Err(TransportFailure {
                kind: TransportKind::Connect,
                message: "refused".to_string(),
            }),
        );

        let err = run(&harness.ctx, &harness.config).unwrap_err();

        assert!(err.to_string().contains("Unable to connect"));
        assert_eq!(harness.transport.requests().len(), 1);
        assert!(harness.file("main.tf").is_none());
    }

    #[test]
    fn test_family_fetch_failure_does_not_stop_others() {
        let mut config = ImportConfig::for_tests("/repo");
        config.skipped = Family::ALL
            .into_iter()
            .filter(|f| !matches!(f, Family::CloudFormationTemplates | Family::AzureRoles))
            .collect();
        let harness = Harness::new(config);
        harness
            .transport
            .get_status("v3/cft", 500)
            .get_data(
                "v3/azure-role",
                json!([{
                    "azure_role": {
                        "id": 4,
                        "name": "Reader",
                        "description": "",
                        "role_permissions": "{}",
                        "azure_managed_policy": false,
                        "system_managed_policy": false
                    },
                    "owner_users": [{"id": 1}],
                    "owner_user_groups": []
                }]),
            );

        let summary = run(&harness.ctx, &harness.config).unwrap();

        assert!(matches!(
            summary.families[0],
            (Family::CloudFormationTemplates, FamilyStatus::Failed(_))
        ));
        assert_eq!(summary.report(Family::AzureRoles).unwrap().imported, 1);
        assert_eq!(summary.ledger.modules(), &["azure-role".to_string()]);
        assert!(harness.file("azure-role/provider.tf").is_some());
        assert!(harness.file("main.tf").unwrap().contains("module \"azure-role\""));
        assert_eq!(
            harness.file("import_resource_state.sh").unwrap(),
            "#!/bin/bash\nterraform import module.azure-role.kion_azure_role.Reader 4\n"
        );
    }

    #[test]
    fn test_existing_main_goes_to_example() {
        let harness = Harness::new(ImportConfig::for_tests("/repo"));
        empty_platform(&harness);
        harness.fs.write(std::path::Path::new("/repo/main.tf"), "mine").unwrap();

        run(&harness.ctx, &harness.config).unwrap();

        assert_eq!(harness.file("main.tf").unwrap(), "mine");
        assert!(harness.file("main.tf.example").is_some());
    }

    #[test]
    fn test_text_helper() {
        let record = json!({"a": "x", "b": null, "c": 3});
        assert_eq!(text(&record, "a"), "x");
        assert_eq!(text(&record, "b"), "");
        assert_eq!(text(&record, "c"), "3");
        assert_eq!(text(&record, "missing"), "");
        assert_eq!(number_or_null(None), "null");
        assert_eq!(number_or_null(Some(7)), "7");
    }
}
