use anyhow::{Context, Result, bail};
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use url::Url;

use crate::family::Family;
use crate::reconcile::CloneDirective;

#[derive(Parser, Debug)]
#[command(name = "kion-import")]
#[command(about = "Import Kion cloud governance resources into a Terraform repository", long_about = None)]
#[command(version)]
pub struct Cli {
    /// URL to Kion, e.g. https://kion.example.com
    #[arg(long)]
    pub kion_url: String,

    /// Kion API key
    #[arg(long, env = "KION_APIKEY", hide_env_values = true)]
    pub kion_api_key: Option<String>,

    /// Root of the target import directory
    #[arg(long)]
    pub import_dir: String,

    /// Skip importing AWS CloudFormation templates
    #[arg(long)]
    pub skip_cfts: bool,

    /// Skip importing AWS IAM policies
    #[arg(long)]
    pub skip_iams: bool,

    /// Skip importing Azure policies
    #[arg(long)]
    pub skip_azure_policies: bool,

    /// Skip importing Azure roles
    #[arg(long)]
    pub skip_azure_roles: bool,

    /// Skip importing project cloud access roles
    #[arg(long)]
    pub skip_project_roles: bool,

    /// Skip importing OU cloud access roles
    #[arg(long)]
    pub skip_ou_roles: bool,

    /// Skip importing cloud rules
    #[arg(long)]
    pub skip_cloud_rules: bool,

    /// Skip importing compliance checks
    #[arg(long)]
    pub skip_checks: bool,

    /// Skip importing compliance standards
    #[arg(long)]
    pub skip_standards: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub skip_ssl_verify: bool,

    /// Overwrite existing resource files
    #[arg(long)]
    pub overwrite: bool,

    /// Write AWS-managed IAM policies to .tf.skip files
    #[arg(long)]
    pub import_aws_managed: bool,

    /// Prepend each resource's id to its filename
    #[arg(long)]
    pub prepend_id: bool,

    /// Clone system-managed resources into owned copies
    #[arg(long)]
    pub clone_system_managed: bool,

    /// Name prefix for clones, ending in '-' or '_'
    #[arg(long)]
    pub clone_prefix: Option<String>,

    /// Owner user ids for clones
    #[arg(long, num_args = 1..)]
    pub clone_user_ids: Vec<i64>,

    /// Owner user group ids for clones
    #[arg(long, num_args = 1..)]
    pub clone_user_group_ids: Vec<i64>,

    /// Create missing module directories without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated, immutable run configuration
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub kion_url: String,
    pub api_key: String,
    pub import_dir: PathBuf,
    pub skipped: BTreeSet<Family>,
    pub verify_tls: bool,
    pub overwrite: bool,
    pub import_aws_managed: bool,
    pub prepend_id: bool,
    /// Prefix carried by clones; empty when none was given
    pub clone_prefix: String,
    pub clone: Option<CloneDirective>,
    pub assume_yes: bool,
}

impl ImportConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let kion_url = trim_trailing_slash(&cli.kion_url);
        if kion_url.is_empty() {
            bail!("Please provide the URL to Kion. Example: --kion-url https://kion.example.com");
        }
        Url::parse(&kion_url).with_context(|| format!("Invalid Kion URL: {}", kion_url))?;

        let import_dir = trim_trailing_slash(&cli.import_dir);
        if import_dir.is_empty() {
            bail!("Please provide the path to the directory in which to import with --import-dir");
        }

        let api_key = match cli.kion_api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => bail!(
                "Did not find a Kion API key supplied via --kion-api-key or the KION_APIKEY environment variable."
            ),
        };

        let clone_prefix = cli.clone_prefix.unwrap_or_default();
        let clone = if cli.clone_system_managed {
            Some(CloneDirective::new(
                &clone_prefix,
                cli.clone_user_ids,
                cli.clone_user_group_ids,
            )?)
        } else {
            None
        };

        let skipped = [
            (Family::CloudFormationTemplates, cli.skip_cfts),
            (Family::IamPolicies, cli.skip_iams),
            (Family::AzurePolicies, cli.skip_azure_policies),
            (Family::AzureRoles, cli.skip_azure_roles),
            (Family::ProjectRoles, cli.skip_project_roles),
            (Family::OuRoles, cli.skip_ou_roles),
            (Family::CloudRules, cli.skip_cloud_rules),
            (Family::ComplianceChecks, cli.skip_checks),
            (Family::ComplianceStandards, cli.skip_standards),
        ]
        .into_iter()
        .filter(|(_, skip)| *skip)
        .map(|(family, _)| family)
        .collect();

        Ok(Self {
            kion_url,
            api_key,
            import_dir: PathBuf::from(import_dir),
            skipped,
            verify_tls: !cli.skip_ssl_verify,
            overwrite: cli.overwrite,
            import_aws_managed: cli.import_aws_managed,
            prepend_id: cli.prepend_id,
            clone_prefix,
            clone,
            assume_yes: cli.yes,
        })
    }

    pub fn clone_directive(&self) -> Option<&CloneDirective> {
        self.clone.as_ref()
    }

    pub fn is_skipped(&self, family: Family) -> bool {
        self.skipped.contains(&family)
    }

    /// Families to process, in order
    pub fn active_families(&self) -> impl Iterator<Item = Family> + '_ {
        Family::ALL.into_iter().filter(|f| !self.is_skipped(*f))
    }

    /// Whether a name already carries the clone prefix
    pub fn has_clone_prefix(&self, name: &str) -> bool {
        !self.clone_prefix.is_empty() && name.starts_with(&self.clone_prefix)
    }
}

fn trim_trailing_slash(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
impl ImportConfig {
    /// Configuration for tests: everything enabled, no cloning
    pub fn for_tests(import_dir: &str) -> Self {
        Self {
            kion_url: "https://kion.test".to_string(),
            api_key: "key".to_string(),
            import_dir: PathBuf::from(import_dir),
            skipped: BTreeSet::new(),
            verify_tls: true,
            overwrite: false,
            import_aws_managed: false,
            prepend_id: false,
            clone_prefix: String::new(),
            clone: None,
            assume_yes: true,
        }
    }

    pub fn with_clone(mut self, prefix: &str, users: Vec<i64>, groups: Vec<i64>) -> Self {
        self.clone_prefix = prefix.to_string();
        self.clone = Some(CloneDirective::new(prefix, users, groups).unwrap());
        self
    }
}
