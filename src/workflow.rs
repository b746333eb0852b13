//! Workflow Staging Facade
//!
//! Holds what the staging components share for one workflow: its absolute
//! base path, the staging configuration and the reporter. Each operation
//! builds the matching component on demand; components never call each
//! other.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use cwlstage::{StagingConfig, Workflow};
//! use cwlstage::monitoring::LogReporter;
//! use cwlstage::staging::StagingRequest;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = Workflow::new("/data/run1", StagingConfig::default(), LogReporter::shared());
//!
//!     let request: StagingRequest = serde_yaml::from_str("files:\n  reads: reads.fastq\n")?;
//!     workflow.create_bindings(&request, Path::new("/data/run1/inputs.yml"))?;
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::StagingConfig;
use crate::monitoring::Reporter;
use crate::provenance::{CrateBuilder, CrateExporter, ProvenanceArchiver};
use crate::staging::{
    ArchiveError, BindingDocument, BindingError, CrateExportError, ExecutionResults,
    InputBindingBuilder, OutputResolutionError, OutputResolver, OutputSpec, ResolvedOutputs,
    StagingRequest,
};

/// Staging context for one workflow.
pub struct Workflow {
    base_path: PathBuf,
    config: StagingConfig,
    reporter: Arc<dyn Reporter>,
}

impl Workflow {
    /// Creates the staging context. `base_path` is fixed for its lifetime.
    pub fn new(
        base_path: impl Into<PathBuf>,
        config: StagingConfig,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            config,
            reporter,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Writes the input-binding document for `request` to `target`.
    pub fn create_bindings(
        &self,
        request: &StagingRequest,
        target: &Path,
    ) -> Result<BindingDocument, BindingError> {
        InputBindingBuilder::new(&self.base_path, self.reporter.clone())
            .with_source_key(&self.config.workflow_source_key)
            .build(&request.files, &request.arguments, target)
    }

    /// Parses the engine's results document, reporting malformed input fatal.
    pub fn parse_results(&self, text: &str) -> Result<ExecutionResults, OutputResolutionError> {
        self.output_resolver().parse_results(text)
    }

    /// Resolves declared outputs against the engine's results.
    pub fn resolve_outputs(
        &self,
        specs: &[OutputSpec],
        results: &ExecutionResults,
        provenance_path: &Path,
    ) -> Result<ResolvedOutputs, OutputResolutionError> {
        self.output_resolver().resolve(specs, results, provenance_path)
    }

    fn output_resolver(&self) -> OutputResolver {
        OutputResolver::new(self.reporter.clone())
            .with_provenance_outputs(self.config.provenance_outputs.clone())
            .with_archive_name(&self.config.provenance_archive)
    }

    /// Archives `provenance_dir` into `target`.
    pub fn compress_provenance(&self, target: &Path, provenance_dir: &Path) -> Result<(), ArchiveError> {
        ProvenanceArchiver::new(self.reporter.clone()).archive(target, provenance_dir)
    }

    /// Location of the provenance archive inside `provenance_dir`.
    pub fn provenance_archive_path(&self, provenance_dir: &Path) -> PathBuf {
        provenance_dir.join(&self.config.provenance_archive)
    }

    /// Exports the workflow crate through `builder`.
    pub fn create_crate<B: CrateBuilder>(
        &self,
        builder: B,
        workflow_source_url: &str,
        input_files: &BindingDocument,
        target_dir: &Path,
    ) -> Result<(), CrateExportError> {
        CrateExporter::new(builder, self.reporter.clone())
            .with_workflow_type(&self.config.workflow_type)
            .export(workflow_source_url, input_files, target_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::{RecordingReporter, Severity};
    use crate::provenance::RoCrateBuilder;
    use crate::staging::{ArtifactRecord, BindingValue, FileRecord};
    use std::fs;
    use tempfile::tempdir;

    fn workflow_in(base: &Path) -> (Workflow, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::new());
        let workflow = Workflow::new(base, StagingConfig::default(), reporter.clone());
        (workflow, reporter)
    }

    #[test]
    fn test_full_staging_cycle() {
        let base = tempdir().unwrap();
        let (workflow, reporter) = workflow_in(base.path());

        let request: StagingRequest = serde_yaml::from_str(
            "files:\n  reads: reads.fastq\narguments:\n  cwl_wf_url: https://example.org/wf.cwl\n  threads: 2\n",
        )
        .unwrap();
        let bindings_path = base.path().join("inputs.yml");
        let document = workflow.create_bindings(&request, &bindings_path).unwrap();
        assert_eq!(document.len(), 2);

        let prov_dir = base.path().join("prov");
        fs::create_dir_all(prov_dir.join("metadata")).unwrap();
        fs::write(prov_dir.join("metadata").join("manifest.json"), "{}").unwrap();
        let archive = workflow.provenance_archive_path(&prov_dir);
        workflow.compress_provenance(&archive, &prov_dir).unwrap();
        assert!(archive.is_file());

        let results = ExecutionResults::new()
            .with_output("counts", vec![ArtifactRecord::new("File", "/out/counts.tsv")]);
        let specs = vec![
            OutputSpec::new("counts", false),
            OutputSpec::new("cwl_metadata", false),
        ];
        let resolved = workflow.resolve_outputs(&specs, &results, &prov_dir).unwrap();
        assert_eq!(
            resolved["cwl_metadata"][0].path,
            archive.to_string_lossy().into_owned()
        );

        let crate_dir = base.path().join("ro-crate");
        workflow
            .create_crate(RoCrateBuilder, "https://example.org/wf.cwl", &document, &crate_dir)
            .unwrap();
        assert!(crate_dir.join("ro-crate-metadata.json").is_file());

        assert!(reporter.with_severity(Severity::Fatal).is_empty());
    }

    #[test]
    fn test_bindings_use_configured_source_key() {
        let base = tempdir().unwrap();
        let config = StagingConfig {
            workflow_source_key: "wf".to_string(),
            ..StagingConfig::default()
        };
        let workflow = Workflow::new(base.path(), config, Arc::new(RecordingReporter::new()));

        let request: StagingRequest =
            serde_yaml::from_str("arguments:\n  wf: x\n  cwl_wf_url: y\n").unwrap();
        let document = workflow
            .create_bindings(&request, &base.path().join("inputs.yml"))
            .unwrap();

        assert!(document.contains_key("cwl_wf_url"));
        assert!(!document.contains_key("wf"));
    }

    #[test]
    fn test_bindings_resolve_against_base_path() {
        let base = tempdir().unwrap();
        let (workflow, _) = workflow_in(base.path());

        let request: StagingRequest = serde_yaml::from_str("files:\n  reads: r.fq\n").unwrap();
        let document = workflow
            .create_bindings(&request, &base.path().join("inputs.yml"))
            .unwrap();

        let expected = base.path().join("r.fq").to_string_lossy().into_owned();
        assert_eq!(document["reads"], BindingValue::File(FileRecord::file(expected)));
    }

    #[test]
    fn test_malformed_results_reported_fatal() {
        let (workflow, reporter) = workflow_in(Path::new("/data"));

        let err = workflow
            .parse_results(r#"{"out": [{"class": "File"}]}"#)
            .unwrap_err();

        assert!(matches!(err, OutputResolutionError::Malformed { ref output, .. } if output == "out"));
        assert!(reporter.contains(Severity::Fatal, "out"));
    }

    #[test]
    fn test_parsed_results_feed_resolution() {
        let (workflow, reporter) = workflow_in(Path::new("/data"));

        let results = workflow
            .parse_results(r#"{"counts": {"class": "File", "path": "/out/c.tsv"}}"#)
            .unwrap();
        let resolved = workflow
            .resolve_outputs(&[OutputSpec::new("counts", false)], &results, Path::new("/prov"))
            .unwrap();

        assert_eq!(resolved["counts"][0].path, "/out/c.tsv");
        assert!(reporter.with_severity(Severity::Fatal).is_empty());
    }

    #[test]
    fn test_configured_archive_name() {
        let config = StagingConfig {
            provenance_archive: "prov.zip".to_string(),
            ..StagingConfig::default()
        };
        let workflow = Workflow::new("/data", config, Arc::new(RecordingReporter::new()));

        assert_eq!(
            workflow.provenance_archive_path(Path::new("/runs/1")),
            PathBuf::from("/runs/1/prov.zip")
        );
        assert_eq!(workflow.base_path(), Path::new("/data"));
        assert_eq!(workflow.config().provenance_archive, "prov.zip");
    }
}
