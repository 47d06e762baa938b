//! Cross-type associations of cloud rules.
//!
//! A cloud rule embeds most of its associations as sub-lists of the rule
//! detail record. Projects are the exception: the embedded project list mixes
//! projects that inherit the rule from a parent OU with projects the rule is
//! applied to directly, so membership is established per project by reading
//! that project's locally applied rules.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::debug;

use crate::api::{ObjectFetcher, ResourceType, extract_ids, ids_of_associated};
use crate::error::{ImportError, ImportResult};

/// Every type a cloud rule can be associated with
pub const RULE_ASSOCIATIONS: &[ResourceType] = &[
    ResourceType::IamPolicy,
    ResourceType::CloudFormationTemplate,
    ResourceType::AzureArmTemplate,
    ResourceType::AzurePolicy,
    ResourceType::AzureRole,
    ResourceType::ComplianceStandard,
    ResourceType::InternalAmi,
    ResourceType::InternalPortfolio,
    ResourceType::ServiceControlPolicy,
    ResourceType::Ou,
    ResourceType::Project,
];

/// Associated ids per type. Every type in [`RULE_ASSOCIATIONS`] has an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationGraph {
    ids: BTreeMap<ResourceType, Vec<i64>>,
}

impl AssociationGraph {
    pub fn new() -> Self {
        Self {
            ids: RULE_ASSOCIATIONS
                .iter()
                .map(|t| (*t, Vec::new()))
                .collect(),
        }
    }

    pub fn ids(&self, resource_type: ResourceType) -> &[i64] {
        self.ids
            .get(&resource_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set(&mut self, resource_type: ResourceType, ids: Vec<i64>) {
        self.ids.insert(resource_type, ids);
    }

    pub fn contains_type(&self, resource_type: ResourceType) -> bool {
        self.ids.contains_key(&resource_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, &[i64])> {
        self.ids.iter().map(|(t, ids)| (*t, ids.as_slice()))
    }
}

impl Default for AssociationGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved graph plus the types that could not be (fully) resolved
#[derive(Debug)]
pub struct AssociationResolution {
    pub graph: AssociationGraph,
    pub failures: Vec<(ResourceType, ImportError)>,
}

impl AssociationResolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn missing_types(&self) -> Vec<ResourceType> {
        self.failures.iter().map(|(t, _)| *t).collect()
    }
}

/// Builds association graphs for cloud rules
pub struct GraphResolver<'a> {
    fetcher: ObjectFetcher<'a>,
    project_ids: RefCell<Option<Vec<i64>>>,
}

impl<'a> GraphResolver<'a> {
    pub fn new(fetcher: ObjectFetcher<'a>) -> Self {
        Self {
            fetcher,
            project_ids: RefCell::new(None),
        }
    }

    /// Resolve every association type of one rule. A failure for one type is
    /// recorded and does not stop the others.
    pub fn resolve_associations(&self, rule_id: i64, rule: &Value) -> AssociationResolution {
        let mut graph = AssociationGraph::new();
        let mut failures = Vec::new();

        for resource_type in RULE_ASSOCIATIONS {
            let resolved = match resource_type {
                ResourceType::Project => self.projects_applying(rule_id),
                other => ids_of_associated(*other, rule).map(|ids| (ids, None)),
            };

            match resolved {
                Ok((ids, None)) => graph.set(*resource_type, ids),
                Ok((ids, Some(err))) => {
                    graph.set(*resource_type, ids);
                    failures.push((*resource_type, err));
                }
                Err(err) => failures.push((*resource_type, err)),
            }
        }

        AssociationResolution { graph, failures }
    }

    /// Projects the rule is applied to directly. Returns the ids found plus the
    /// first per-project failure, if any; only a failure to list projects at
    /// all is returned as `Err`.
    fn projects_applying(&self, rule_id: i64) -> ImportResult<(Vec<i64>, Option<ImportError>)> {
        let mut applying = Vec::new();
        let mut first_failure = None;

        for project_id in self.all_project_ids()? {
            match self.fetcher.locally_applied_rule_ids(project_id) {
                Ok(rule_ids) if rule_ids.contains(&rule_id) => applying.push(project_id),
                Ok(_) => {}
                Err(err) => {
                    debug!(project_id, error = %err, "could not read project cloud rules");
                    first_failure.get_or_insert(err);
                }
            }
        }

        Ok((applying, first_failure))
    }

    fn all_project_ids(&self) -> ImportResult<Vec<i64>> {
        if let Some(ids) = self.project_ids.borrow().as_ref() {
            return Ok(ids.clone());
        }

        let projects = self.fetcher.fetch_all(ResourceType::Project)?;
        let ids = extract_ids(&Value::Array(projects));
        *self.project_ids.borrow_mut() = Some(ids.clone());
        Ok(ids)
    }
}
