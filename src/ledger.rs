/// Run-scoped record of which module directories were processed and which
/// resources were materialized, consumed once at the end to emit `main.tf`
/// and the state import script.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportLedger {
    modules: Vec<String>,
    resources: Vec<LedgerEntry>,
}

/// One `terraform import` target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Fully-qualified resource address, e.g. `module.cloud-rule.kion_cloud_rule.My_Rule`
    pub address: String,
    /// Platform id the address should be bound to
    pub id: i64,
}

impl ImportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a module directory was processed. Repeats are ignored.
    pub fn record_module(&mut self, module: &str) {
        if !self.modules.iter().any(|m| m == module) {
            self.modules.push(module.to_string());
        }
    }

    pub fn record_resource(&mut self, address: impl Into<String>, id: i64) {
        self.resources.push(LedgerEntry {
            address: address.into(),
            id,
        });
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn resources(&self) -> &[LedgerEntry] {
        &self.resources
    }

    /// Bash script that imports every recorded resource into Terraform state
    pub fn import_script(&self) -> String {
        let mut script = String::from("#!/bin/bash\n");
        for entry in &self.resources {
            script.push_str(&format!("terraform import {} {}\n", entry.address, entry.id));
        }
        script
    }
}
