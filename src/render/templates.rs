//! Handlebars sources for every rendered file. Values arrive pre-formatted
//! (quoted-string safe, heredoc safe, id blocks expanded).

pub const PROVIDER: &str = r#"terraform {
    required_providers {
        kion = {
            source  = "kionsoftware/kion"
            version = "0.13.12"
        }
    }
}

# provider "kion" {
    # Configuration options
# }
"#;

pub const MAIN: &str = r#"{{provider}}{{#each modules}}
module "{{this}}" {
    source = "./{{this}}"
}
{{/each}}"#;

pub const CLOUDFORMATION_TEMPLATE: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id                      = {{id}}
    name                    = "{{name}}"
    description             = "{{description}}"
    regions                 = {{regions}}
{{#if region}}
    region                  = "{{region}}"
{{/if}}
    sns_arns                = "{{sns_arns}}"
    termination_protection  = {{termination_protection}}
    {{owner_users}}
    {{owner_groups}}
{{#if template_parameters}}

    template_parameters = <<-EOT
{{template_parameters}}
EOT
{{/if}}

    policy = <<-EOT
{{policy}}
EOT
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;

pub const IAM_POLICY: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id            = {{id}}
    name            = "{{name}}"
    description     = "{{description}}"
    aws_iam_path    = "{{aws_iam_path}}"
    {{owner_users}}
    {{owner_groups}}

    policy = <<-EOT
{{policy}}
EOT
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;

pub const AZURE_POLICY: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id                        = {{id}}
    name                        = "{{name}}"
    description                 = "{{description}}"
    azure_managed_policy_def_id = "{{azure_managed_policy_def_id}}"
    {{owner_users}}
    {{owner_groups}}

    policy = <<-EOT
{{policy}}
EOT

    parameters = <<-EOT
{{parameters}}
EOT
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;

pub const AZURE_ROLE: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id                        = {{id}}
    name                        = "{{name}}"
    description                 = "{{description}}"
    {{owner_users}}
    {{owner_groups}}

    role_permissions = <<-EOT
{{role_permissions}}
EOT
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;

pub const PROJECT_ROLE: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id                          = {{id}}
    name                        = "{{name}}"
    project_id                  = {{project_id}}
    aws_iam_role_name           = "{{aws_iam_role_name}}"
    aws_iam_path                = "{{aws_iam_path}}"
    aws_permissions_boundary_id = {{permissions_boundary}}
    short_term_access_keys      = {{short_term_access_keys}}
    long_term_access_keys       = {{long_term_access_keys}}
    web_access                  = {{web_access}}
    future_accounts             = {{future_accounts}}
    {{aws_iam_policies}}
    {{accounts}}
    {{users}}
    {{user_groups}}
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;

pub const OU_ROLE: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id                          = {{id}}
    name                        = "{{name}}"
    ou_id                       = {{ou_id}}
    aws_iam_role_name           = "{{aws_iam_role_name}}"
    aws_iam_path                = "{{aws_iam_path}}"
    aws_permissions_boundary_id = {{permissions_boundary}}
    short_term_access_keys      = {{short_term_access_keys}}
    long_term_access_keys       = {{long_term_access_keys}}
    web_access                  = {{web_access}}
    {{aws_iam_policies}}
    {{users}}
    {{user_groups}}
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;

pub const CLOUD_RULE: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id                                    = {{id}}
    name                                    = "{{name}}"
    description                             = "{{description}}"
    pre_webhook_id                          = {{pre_webhook_id}}
    post_webhook_id                         = {{post_webhook_id}}
{{#each associations}}
    {{this}}
{{/each}}
    {{owner_users}}
    {{owner_groups}}
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;

pub const COMPLIANCE_CHECK: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id                        = {{id}}
    name                        = "{{name}}"
    description                 = "{{description}}"
    created_by_user_id          = {{created_by_user_id}}
    regions                     = {{regions}}
{{#if azure_policy_id}}
    azure_policy_id             = {{azure_policy_id}}
{{/if}}
    cloud_provider_id           = {{cloud_provider_id}} # 1 = AWS, 2 = Azure, 3 = GCP
    compliance_check_type_id    = {{compliance_check_type_id}} # 1 = external, 2 = c7n, 3 = azure, 4 = tenable
    severity_type_id            = {{severity_type_id}} # 5 = critical, 4 = high, 3 = medium, 2 = low, 1 = info
    frequency_minutes           = {{frequency_minutes}}
    frequency_type_id           = {{frequency_type_id}} # 2 = minutes, 3 = hours, 4 = days
    is_all_regions              = {{is_all_regions}}
    is_auto_archived            = {{is_auto_archived}}
    {{owner_users}}
    {{owner_groups}}
{{#if body}}

    body = <<-EOT
{{body}}
EOT
{{/if}}
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;

pub const COMPLIANCE_STANDARD: &str = r#"resource "{{resource_type}}" "{{resource_id}}" {
    # id                        = {{id}}
    name                        = "{{name}}"
    description                 = "{{description}}"
    created_by_user_id          = {{created_by_user_id}}
    {{owner_users}}
    {{owner_groups}}
    {{compliance_checks}}
}

output "{{resource_id}}" {
    value = {{resource_type}}.{{resource_id}}.id
}
"#;
