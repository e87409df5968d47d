// JSON state file: router statuses and client names between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{MacAddress, RouterId, RouterStatus};

const STATE_VERSION: u32 = 1;

fn state_version() -> u32 {
    STATE_VERSION
}

/// Everything that survives a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetState {
    #[serde(default = "state_version")]
    pub version: u32,
    #[serde(default)]
    pub routers: BTreeMap<RouterId, RouterStatus>,
    #[serde(default)]
    pub names: BTreeMap<MacAddress, String>,
}

impl Default for FleetState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            routers: BTreeMap::new(),
            names: BTreeMap::new(),
        }
    }
}

/// Location of the state file on disk.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved state. A missing file is an empty state.
    pub fn load(&self) -> Result<FleetState, CoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file yet");
                Ok(FleetState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write state atomically (temp file + rename).
    pub fn save(&self, state: &FleetState) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), routers = state.routers.len(), "state saved");
        Ok(())
    }
}
