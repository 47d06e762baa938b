use std::fmt;

use crate::error::{ImportError, ImportResult};

/// HTTP verbs the importer issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verb::Get => f.write_str("GET"),
            Verb::Post => f.write_str("POST"),
        }
    }
}

/// Object types known to the platform API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    CloudFormationTemplate,
    IamPolicy,
    AzureArmTemplate,
    AzurePolicy,
    AzureRole,
    ComplianceStandard,
    ComplianceCheck,
    InternalAmi,
    InternalPortfolio,
    Ou,
    UserGroup,
    User,
    ServiceControlPolicy,
    CloudRule,
    Project,
    ProjectCloudAccessRole,
    OuCloudAccessRole,
}

impl ResourceType {
    /// Kebab-case identifier, also the path segment used for nested endpoints
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::CloudFormationTemplate => "cft",
            ResourceType::IamPolicy => "iam-policy",
            ResourceType::AzureArmTemplate => "azure-arm-template",
            ResourceType::AzurePolicy => "azure-policy",
            ResourceType::AzureRole => "azure-role",
            ResourceType::ComplianceStandard => "compliance-standard",
            ResourceType::ComplianceCheck => "compliance-check",
            ResourceType::InternalAmi => "ami",
            ResourceType::InternalPortfolio => "service-catalog",
            ResourceType::Ou => "ou",
            ResourceType::UserGroup => "user-group",
            ResourceType::User => "user",
            ResourceType::ServiceControlPolicy => "service-control-policy",
            ResourceType::CloudRule => "cloud-rule",
            ResourceType::Project => "project",
            ResourceType::ProjectCloudAccessRole => "project-cloud-access-role",
            ResourceType::OuCloudAccessRole => "ou-cloud-access-role",
        }
    }

    /// Key under which a composite record embeds objects of this type.
    /// The same name is used for the attribute blocks in rendered output.
    pub fn association_key(&self) -> &'static str {
        match self {
            ResourceType::CloudFormationTemplate => "aws_cloudformation_templates",
            ResourceType::IamPolicy => "aws_iam_policies",
            ResourceType::AzureArmTemplate => "azure_arm_template_definitions",
            ResourceType::AzurePolicy => "azure_policy_definitions",
            ResourceType::AzureRole => "azure_role_definitions",
            ResourceType::ComplianceStandard => "compliance_standards",
            ResourceType::ComplianceCheck => "compliance_checks",
            ResourceType::InternalAmi => "internal_aws_amis",
            ResourceType::InternalPortfolio => "internal_aws_service_catalog_portfolios",
            ResourceType::Ou => "ous",
            ResourceType::UserGroup => "owner_user_groups",
            ResourceType::User => "owner_users",
            ResourceType::ServiceControlPolicy => "service_control_policies",
            ResourceType::CloudRule => "cloud_rules",
            ResourceType::Project => "projects",
            ResourceType::ProjectCloudAccessRole => "project_cloud_access_roles",
            ResourceType::OuCloudAccessRole => "ou_cloud_access_roles",
        }
    }

    /// Type tag the search index reports for this type
    pub fn search_tag(&self) -> Option<&'static str> {
        match self {
            ResourceType::IamPolicy => Some("iam"),
            ResourceType::CloudFormationTemplate => Some("cft"),
            ResourceType::CloudRule => Some("cloud_rule"),
            ResourceType::ComplianceCheck => Some("compliance_check"),
            ResourceType::ComplianceStandard => Some("compliance_standard"),
            ResourceType::AzureRole => Some("azure_role"),
            ResourceType::AzurePolicy => Some("azure_policy"),
            ResourceType::AzureArmTemplate => Some("arm_template"),
            _ => None,
        }
    }

    /// Some collection endpoints wrap their list in an object
    pub fn collection_key(&self) -> Option<&'static str> {
        match self {
            ResourceType::AzureArmTemplate => Some("items"),
            _ => None,
        }
    }

    /// Resolve the API path fragment for this type and verb
    pub fn endpoint(&self, verb: Verb) -> ImportResult<&'static str> {
        resolve(*self, verb)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static endpoint table. Types without a POST row cannot be cloned.
const ENDPOINTS: &[(ResourceType, Verb, &str)] = &[
    (ResourceType::CloudFormationTemplate, Verb::Get, "v3/cft"),
    (ResourceType::CloudFormationTemplate, Verb::Post, "v3/cft"),
    (ResourceType::IamPolicy, Verb::Get, "v3/iam-policy"),
    (ResourceType::IamPolicy, Verb::Post, "v3/iam-policy"),
    (ResourceType::AzureArmTemplate, Verb::Get, "v4/azure-arm-template"),
    (ResourceType::AzureArmTemplate, Verb::Post, "v3/azure-arm-template"),
    (ResourceType::AzurePolicy, Verb::Get, "v3/azure-policy"),
    (ResourceType::AzurePolicy, Verb::Post, "v3/azure-policy"),
    (ResourceType::AzureRole, Verb::Get, "v3/azure-role"),
    (ResourceType::AzureRole, Verb::Post, "v3/azure-role"),
    (ResourceType::ComplianceStandard, Verb::Get, "v3/compliance/standard"),
    (ResourceType::ComplianceStandard, Verb::Post, "v3/compliance/standard"),
    (ResourceType::ComplianceCheck, Verb::Get, "v3/compliance/check"),
    (ResourceType::ComplianceCheck, Verb::Post, "v3/compliance/check"),
    (ResourceType::InternalAmi, Verb::Get, "v3/ami"),
    (ResourceType::InternalAmi, Verb::Post, "v3/ami"),
    (ResourceType::InternalPortfolio, Verb::Get, "v3/service-catalog"),
    (ResourceType::InternalPortfolio, Verb::Post, "v3/service-catalog"),
    (ResourceType::Ou, Verb::Get, "v3/ou"),
    (ResourceType::Ou, Verb::Post, "v3/ou"),
    (ResourceType::UserGroup, Verb::Get, "v3/user-group"),
    (ResourceType::UserGroup, Verb::Post, "v3/user-group"),
    (ResourceType::User, Verb::Get, "v3/user"),
    (ResourceType::User, Verb::Post, "v3/user"),
    (ResourceType::ServiceControlPolicy, Verb::Get, "v3/service-control-policy"),
    (ResourceType::ServiceControlPolicy, Verb::Post, "v3/service-control-policy"),
    (ResourceType::CloudRule, Verb::Get, "v3/cloud-rule"),
    (ResourceType::CloudRule, Verb::Post, "v3/cloud-rule"),
    (ResourceType::Project, Verb::Get, "v3/project"),
    (ResourceType::ProjectCloudAccessRole, Verb::Get, "v3/project-cloud-access-role"),
    (ResourceType::OuCloudAccessRole, Verb::Get, "v3/ou-cloud-access-role"),
];

/// Path of the free-text search endpoint
pub const SEARCH_ENDPOINT: &str = "v1/search";

/// Map (type, verb) to an API path fragment
pub fn resolve(resource_type: ResourceType, verb: Verb) -> ImportResult<&'static str> {
    ENDPOINTS
        .iter()
        .find(|(t, v, _)| *t == resource_type && *v == verb)
        .map(|(_, _, path)| *path)
        .ok_or(ImportError::NotConfigured {
            resource_type,
            verb,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_get_and_post() {
        assert_eq!(resolve(ResourceType::CloudRule, Verb::Get).unwrap(), "v3/cloud-rule");
        assert_eq!(
            resolve(ResourceType::AzureArmTemplate, Verb::Get).unwrap(),
            "v4/azure-arm-template"
        );
        assert_eq!(
            resolve(ResourceType::AzureArmTemplate, Verb::Post).unwrap(),
            "v3/azure-arm-template"
        );
    }

    #[test]
    fn test_resolve_missing_post_is_signaled() {
        let err = resolve(ResourceType::Project, Verb::Post).unwrap_err();
        assert!(matches!(
            err,
            ImportError::NotConfigured {
                resource_type: ResourceType::Project,
                verb: Verb::Post
            }
        ));
    }

    #[test]
    fn test_every_searchable_type_is_cloneable() {
        for (resource_type, _, _) in ENDPOINTS {
            if resource_type.search_tag().is_some() {
                assert!(resolve(*resource_type, Verb::Get).is_ok());
                assert!(resolve(*resource_type, Verb::Post).is_ok());
            }
        }
    }

    #[test]
    fn test_association_keys() {
        assert_eq!(ResourceType::IamPolicy.association_key(), "aws_iam_policies");
        assert_eq!(ResourceType::Project.association_key(), "projects");
        assert_eq!(
            ResourceType::InternalPortfolio.association_key(),
            "internal_aws_service_catalog_portfolios"
        );
    }
}
