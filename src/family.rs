use std::fmt;

/// Object families imported into their own Terraform module, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    CloudFormationTemplates,
    IamPolicies,
    AzurePolicies,
    AzureRoles,
    ProjectRoles,
    OuRoles,
    CloudRules,
    ComplianceChecks,
    ComplianceStandards,
}

impl Family {
    pub const ALL: [Family; 9] = [
        Family::CloudFormationTemplates,
        Family::IamPolicies,
        Family::AzurePolicies,
        Family::AzureRoles,
        Family::ProjectRoles,
        Family::OuRoles,
        Family::CloudRules,
        Family::ComplianceChecks,
        Family::ComplianceStandards,
    ];

    /// Module directory under the import root
    pub fn module_dir(&self) -> &'static str {
        match self {
            Family::CloudFormationTemplates => "aws-cloudformation-template",
            Family::IamPolicies => "aws-iam-policy",
            Family::AzurePolicies => "azure-policy",
            Family::AzureRoles => "azure-role",
            Family::ProjectRoles => "project-cloud-access-role",
            Family::OuRoles => "ou-cloud-access-role",
            Family::CloudRules => "cloud-rule",
            Family::ComplianceChecks => "compliance-check",
            Family::ComplianceStandards => "compliance-standard",
        }
    }

    /// Terraform resource type rendered for this family
    pub fn terraform_type(&self) -> &'static str {
        match self {
            Family::CloudFormationTemplates => "kion_aws_cloudformation_template",
            Family::IamPolicies => "kion_aws_iam_policy",
            Family::AzurePolicies => "kion_azure_policy",
            Family::AzureRoles => "kion_azure_role",
            Family::ProjectRoles => "kion_project_cloud_access_role",
            Family::OuRoles => "kion_ou_cloud_access_role",
            Family::CloudRules => "kion_cloud_rule",
            Family::ComplianceChecks => "kion_compliance_check",
            Family::ComplianceStandards => "kion_compliance_standard",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Family::CloudFormationTemplates => "AWS CloudFormation Templates",
            Family::IamPolicies => "AWS IAM Policies",
            Family::AzurePolicies => "Azure Policies",
            Family::AzureRoles => "Azure Roles",
            Family::ProjectRoles => "Project Cloud Access Roles",
            Family::OuRoles => "OU Cloud Access Roles",
            Family::CloudRules => "Cloud Rules",
            Family::ComplianceChecks => "Compliance Checks",
            Family::ComplianceStandards => "Compliance Standards",
        }
    }

    /// Address of a resource of this family in the root module
    pub fn resource_address(&self, resource_name: &str) -> String {
        format!(
            "module.{}.{}.{}",
            self.module_dir(),
            self.terraform_type(),
            resource_name
        )
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
