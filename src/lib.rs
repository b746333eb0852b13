//! cwlstage - Workflow Execution Staging
//!
//! Stages the inputs and outputs of a single CWL workflow execution and
//! packages what it produced, so results consumers get an engine-agnostic
//! view of which files came out of which output.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`staging`]: Input-binding documents and output resolution
//! - [`provenance`]: Provenance archives and RO-Crate export
//! - [`monitoring`]: The reporter passed into every component
//! - [`config`]: Staging conventions loaded from YAML
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use cwlstage::monitoring::LogReporter;
//! use cwlstage::staging::ExecutionResults;
//! use cwlstage::{OutputSpec, StagingConfig, Workflow};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = Workflow::new("/data/run1", StagingConfig::default(), LogReporter::shared());
//!
//!     let prov = Path::new("/data/run1/prov");
//!     workflow.compress_provenance(&workflow.provenance_archive_path(prov), prov)?;
//!
//!     let results = ExecutionResults::from_json(r#"{"counts": {"class": "File", "path": "/out/c.tsv"}}"#)?;
//!     let specs = vec![OutputSpec::new("counts", false), OutputSpec::new("cwl_metadata", false)];
//!     let outputs = workflow.resolve_outputs(&specs, &results, prov)?;
//!     println!("{:?}", outputs);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod monitoring;
pub mod provenance;
pub mod staging;
pub mod workflow;

// Re-export commonly used types
pub use config::{load_config, StagingConfig};
pub use provenance::{CrateExporter, ProvenanceArchiver, RoCrateBuilder};
pub use staging::{InputBindingBuilder, OutputResolver, OutputSpec};
pub use workflow::Workflow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "cwlstage";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "cwlstage");
    }

    #[test]
    fn test_module_exports_output_spec() {
        let spec = OutputSpec::new("counts", true);
        assert_eq!(spec.name, "counts");
        assert!(spec.allow_multiple);
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
