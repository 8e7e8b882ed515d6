//! Desired-state loader.
//!
//! Decodes a YAML descriptor into a validated [`Gatekeeper`].

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::LoadError;
use crate::types::Gatekeeper;

/// Location of the sample descriptor, relative to the workspace root.
pub const SAMPLE_PATH: &str = "config/samples/operator_v1alpha1_gatekeeper.yaml";

/// Load a descriptor from a file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Gatekeeper, LoadError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let gatekeeper = load_from_str(&contents)?;
    debug!(path = %path.display(), name = %gatekeeper.name(), "Loaded Gatekeeper descriptor");
    Ok(gatekeeper)
}

/// Load a descriptor from any reader.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Gatekeeper, LoadError> {
    let gatekeeper: Gatekeeper = serde_yaml::from_reader(reader)?;
    gatekeeper.validate()?;
    Ok(gatekeeper)
}

/// Load a descriptor from a string.
pub fn load_from_str(contents: &str) -> Result<Gatekeeper, LoadError> {
    let gatekeeper: Gatekeeper = serde_yaml::from_str(contents)?;
    gatekeeper.validate()?;
    Ok(gatekeeper)
}
