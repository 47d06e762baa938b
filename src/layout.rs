use anyhow::{Result, bail};

use crate::config::ImportConfig;
use crate::context::Context;
use crate::family::Family;

/// Check the import directory and the module directory of every family that
/// will run. Missing module directories are created after confirmation, or
/// straight away when `assume_yes` is set.
pub fn ensure_layout(ctx: &Context, config: &ImportConfig) -> Result<()> {
    let root = &config.import_dir;
    if !ctx.fs.is_dir(root) {
        bail!("Did not find import directory: {}", root.display());
    }

    let missing: Vec<Family> = config
        .active_families()
        .filter(|family| !ctx.fs.is_dir(&root.join(family.module_dir())))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    ctx.output.warning(&format!(
        "{} is missing the following sub-directories:",
        root.display()
    ));
    for family in &missing {
        ctx.output.dimmed(&format!("  - {}", family.module_dir()));
    }

    let create = config.assume_yes || ctx.input.confirm("Create them?", false)?;
    if !create {
        bail!("Import directory is missing module directories; nothing was imported");
    }

    for family in &missing {
        ctx.fs.create_dir_all(&root.join(family.module_dir()))?;
    }
    ctx.output.success(&format!("Created {} module directories", missing.len()));

    Ok(())
}
