//! Staging Configuration
//!
//! Names and conventions shared by the staging components. Every field has
//! a default, so an empty YAML document is a valid configuration.
//!
//! ```yaml
//! workflow_type: cwl
//! workflow_source_key: cwl_wf_url
//! provenance_archive: execution_create.zip
//! provenance_outputs:
//!   - cwl_metadata
//! ```

use std::error::Error;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Type tag of CWL workflows.
pub const DEFAULT_WORKFLOW_TYPE: &str = "cwl";

/// Reserved argument naming the workflow's own source URL.
pub const DEFAULT_WORKFLOW_SOURCE_KEY: &str = "cwl_wf_url";

/// Archive filename inside the provenance directory.
pub const DEFAULT_PROVENANCE_ARCHIVE: &str = "execution_create.zip";

/// Provenance pseudo-output recognised by default.
pub const DEFAULT_PROVENANCE_OUTPUT: &str = "cwl_metadata";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StagingConfig {
    /// Type tag passed to the crate builder
    #[serde(default = "default_workflow_type")]
    pub workflow_type: String,

    /// Argument name excluded from the binding document
    #[serde(default = "default_workflow_source_key")]
    pub workflow_source_key: String,

    /// Filename of the provenance archive
    #[serde(default = "default_provenance_archive")]
    pub provenance_archive: String,

    /// Outputs synthesized from the provenance archive when the engine
    /// does not report them
    #[serde(default = "default_provenance_outputs")]
    pub provenance_outputs: Vec<String>,
}

fn default_workflow_type() -> String {
    DEFAULT_WORKFLOW_TYPE.to_string()
}

fn default_workflow_source_key() -> String {
    DEFAULT_WORKFLOW_SOURCE_KEY.to_string()
}

fn default_provenance_archive() -> String {
    DEFAULT_PROVENANCE_ARCHIVE.to_string()
}

fn default_provenance_outputs() -> Vec<String> {
    vec![DEFAULT_PROVENANCE_OUTPUT.to_string()]
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            workflow_type: default_workflow_type(),
            workflow_source_key: default_workflow_source_key(),
            provenance_archive: default_provenance_archive(),
            provenance_outputs: default_provenance_outputs(),
        }
    }
}

/// Loads a staging configuration from a YAML file.
///
/// # Arguments
///
/// * `path` - Path to the configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<StagingConfig, Box<dyn Error>> {
    let path = path.as_ref();
    info!("Loading staging configuration from: {}", path.display());

    let yaml_content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read configuration file '{}': {}. Check that the file exists and is readable.",
            path.display(),
            e
        )
    })?;

    debug!("Configuration loaded ({} bytes)", yaml_content.len());

    // An empty document deserializes as null, not as an empty mapping
    if yaml_content.trim().is_empty() {
        return Ok(StagingConfig::default());
    }

    let config: StagingConfig = serde_yaml::from_str(&yaml_content).map_err(|e| {
        format!(
            "Failed to parse configuration YAML '{}': {}. Check the file format.",
            path.display(),
            e
        )
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = StagingConfig::default();
        assert_eq!(config.workflow_type, "cwl");
        assert_eq!(config.workflow_source_key, "cwl_wf_url");
        assert_eq!(config.provenance_archive, "execution_create.zip");
        assert_eq!(config.provenance_outputs, vec!["cwl_metadata".to_string()]);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: StagingConfig =
            serde_yaml::from_str("provenance_archive: prov.zip\n").unwrap();
        assert_eq!(config.provenance_archive, "prov.zip");
        assert_eq!(config.workflow_type, "cwl");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<StagingConfig, _> = serde_yaml::from_str("archive: x.zip\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("staging.yaml");
        fs::write(
            &path,
            "workflow_type: cwl\nprovenance_outputs:\n  - cwl_metadata\n  - run_log\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.provenance_outputs.len(), 2);
    }

    #[test]
    fn test_load_empty_config_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("empty.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(load_config(&path).unwrap(), StagingConfig::default());
    }

    #[test]
    fn test_load_config_not_found() {
        let result = load_config("/nonexistent/path/staging.yaml");
        assert!(result.is_err());
    }
}
