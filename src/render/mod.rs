pub mod hcl;
pub mod templates;

use handlebars::Handlebars;
use serde_json::{Value, json};

use crate::error::{ImportError, ImportResult};
use crate::family::Family;
use crate::reconcile::OwnerSet;

pub use hcl::{build_filename, hcl_bool, hcl_string, heredoc, id_blocks, normalize_name};

/// Renders resolved records as Terraform files
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> ImportResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        for family in Family::ALL {
            register(&mut handlebars, family.module_dir(), template_for(family))?;
        }
        register(&mut handlebars, "main", templates::MAIN)?;

        Ok(Self { handlebars })
    }

    /// Render one resource file. Empty `attr { }` blocks are dropped.
    pub fn render_resource(&self, family: Family, data: &Value) -> ImportResult<String> {
        let mut data = data.clone();
        if let Some(map) = data.as_object_mut() {
            map.entry("resource_type")
                .or_insert_with(|| json!(family.terraform_type()));
        }

        let content = self.handlebars.render(family.module_dir(), &data)?;
        Ok(hcl::strip_empty_blocks(&content))
    }

    /// Root module file: provider requirements plus one block per imported module
    pub fn render_main(&self, modules: &[String]) -> ImportResult<String> {
        let data = json!({
            "provider": templates::PROVIDER,
            "modules": modules,
        });
        Ok(self.handlebars.render("main", &data)?)
    }

    /// Provider requirements written into every module directory
    pub fn provider_file(&self) -> &'static str {
        templates::PROVIDER
    }
}

/// `owner_users` / `owner_user_groups` block lines for a template
pub fn owner_blocks(owners: &OwnerSet) -> (String, String) {
    (
        id_blocks("owner_users", &owners.users),
        id_blocks("owner_user_groups", &owners.groups),
    )
}

fn template_for(family: Family) -> &'static str {
    match family {
        Family::CloudFormationTemplates => templates::CLOUDFORMATION_TEMPLATE,
        Family::IamPolicies => templates::IAM_POLICY,
        Family::AzurePolicies => templates::AZURE_POLICY,
        Family::AzureRoles => templates::AZURE_ROLE,
        Family::ProjectRoles => templates::PROJECT_ROLE,
        Family::OuRoles => templates::OU_ROLE,
        Family::CloudRules => templates::CLOUD_RULE,
        Family::ComplianceChecks => templates::COMPLIANCE_CHECK,
        Family::ComplianceStandards => templates::COMPLIANCE_STANDARD,
    }
}

fn register(handlebars: &mut Handlebars<'static>, name: &str, source: &str) -> ImportResult<()> {
    handlebars
        .register_template_string(name, source)
        .map_err(|e| ImportError::Render(format!("template '{}': {}", name, e)))
}
