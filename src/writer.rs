use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::ImportResult;
use crate::ledger::ImportLedger;
use crate::traits::FileSystem;

/// File name of the generated state import script
pub const IMPORT_SCRIPT: &str = "import_resource_state.sh";

/// What happened to a resource file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// The file exists and overwriting is off
    Kept(PathBuf),
}

/// Writes generated files below the import root
pub struct ImportWriter {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    overwrite: bool,
}

impl ImportWriter {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            fs,
            root: root.into(),
            overwrite,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a resource file unless it exists and overwriting is off
    pub fn write_resource(&self, relative: impl AsRef<Path>, content: &str) -> ImportResult<WriteOutcome> {
        let path = self.root.join(relative);
        if self.fs.exists(&path) && !self.overwrite {
            debug!(path = %path.display(), "keeping existing file");
            return Ok(WriteOutcome::Kept(path));
        }

        self.fs.write(&path, content)?;
        Ok(WriteOutcome::Written(path))
    }

    /// Write a scaffold file (`provider.tf`, `main.tf`). An existing file is
    /// never replaced; the content goes to `<name>.example` next to it instead.
    pub fn write_scaffold(&self, relative: impl AsRef<Path>, content: &str) -> ImportResult<PathBuf> {
        let mut path = self.root.join(relative);
        if self.fs.exists(&path) {
            let mut name = path.as_os_str().to_os_string();
            name.push(".example");
            path = PathBuf::from(name);
        }

        self.fs.write(&path, content)?;
        Ok(path)
    }

    /// Write the state import script, replacing any previous one
    pub fn write_import_script(&self, ledger: &ImportLedger) -> ImportResult<PathBuf> {
        let path = self.root.join(IMPORT_SCRIPT);
        self.fs.write(&path, &ledger.import_script())?;
        Ok(path)
    }
}
