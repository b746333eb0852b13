//! Output Resolver
//!
//! Maps each declared workflow output onto the concrete artifacts the
//! execution engine reported for it.
//!
//! # Resolution Rules
//!
//! - Reported, single-valued: the first record of the *first* reported
//!   output, whatever its name
//! - Reported, multi-valued: every record under the output's own name, in
//!   engine order
//! - Not reported, provenance pseudo-output: the provenance archive
//! - Not reported otherwise: no artifacts

use std::path::Path;
use std::sync::Arc;

use crate::config::{DEFAULT_PROVENANCE_ARCHIVE, DEFAULT_PROVENANCE_OUTPUT};
use crate::monitoring::{Reporter, Severity};

use super::error::OutputResolutionError;
use super::model::{ExecutionResults, OutputSpec, ResolvedArtifact, ResolvedOutputs};

const OPERATION: &str = "outputs";

/// Type reported for synthesized provenance artifacts.
const PROVENANCE_KIND: &str = "file";

/// Resolves declared outputs against execution results.
pub struct OutputResolver {
    provenance_outputs: Vec<String>,
    archive_name: String,
    reporter: Arc<dyn Reporter>,
}

impl OutputResolver {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            provenance_outputs: vec![DEFAULT_PROVENANCE_OUTPUT.to_string()],
            archive_name: DEFAULT_PROVENANCE_ARCHIVE.to_string(),
            reporter,
        }
    }

    /// Replaces the set of recognised provenance pseudo-outputs.
    pub fn with_provenance_outputs(mut self, names: Vec<String>) -> Self {
        self.provenance_outputs = names;
        self
    }

    /// Sets the archive filename synthesized for provenance pseudo-outputs.
    pub fn with_archive_name(mut self, name: impl Into<String>) -> Self {
        self.archive_name = name.into();
        self
    }

    /// Parses the engine's results document.
    ///
    /// A malformed document is reported fatal, naming the offending output
    /// when the failure is inside one output's records.
    pub fn parse_results(&self, text: &str) -> Result<ExecutionResults, OutputResolutionError> {
        let results = ExecutionResults::from_json(text).map_err(|err| {
            self.reporter.report(
                Severity::Fatal,
                OPERATION,
                &format!("CWL output files not created: {}", err),
            );
            err
        })?;

        if results.is_empty() {
            self.reporter
                .report(Severity::Warn, OPERATION, "engine reported no outputs");
        }

        Ok(results)
    }

    /// Resolves every spec in `specs`.
    ///
    /// Every declared output name appears in the result, possibly with no artifacts.
    /// On error nothing is returned for any output.
    pub fn resolve(
        &self,
        specs: &[OutputSpec],
        results: &ExecutionResults,
        provenance_path: &Path,
    ) -> Result<ResolvedOutputs, OutputResolutionError> {
        let mut resolved = ResolvedOutputs::with_capacity(specs.len());

        for spec in specs {
            let artifacts = self
                .resolve_one(spec, results, provenance_path)
                .map_err(|err| {
                    self.reporter.report(
                        Severity::Fatal,
                        OPERATION,
                        &format!("CWL output files not created: {}", err),
                    );
                    err
                })?;

            self.reporter.report(
                Severity::Debug,
                OPERATION,
                &format!("output '{}' resolved to {} artifact(s)", spec.name, artifacts.len()),
            );
            resolved.insert(spec.name.clone(), artifacts);
        }

        Ok(resolved)
    }

    fn resolve_one(
        &self,
        spec: &OutputSpec,
        results: &ExecutionResults,
        provenance_path: &Path,
    ) -> Result<Vec<ResolvedArtifact>, OutputResolutionError> {
        let Some(records) = results.get(&spec.name) else {
            if self.provenance_outputs.contains(&spec.name) {
                let archive = provenance_path.join(&self.archive_name);
                return Ok(vec![ResolvedArtifact::new(
                    archive.to_string_lossy(),
                    PROVENANCE_KIND,
                )]);
            }
            return Ok(Vec::new());
        };

        if spec.allow_multiple {
            return Ok(records.iter().map(ResolvedArtifact::from).collect());
        }

        // Single-valued outputs read the first reported output, not the
        // output's own entry.
        let (first_key, first_records) = results.first().ok_or_else(|| {
            OutputResolutionError::MissingArtifact {
                output: spec.name.clone(),
                key: spec.name.clone(),
            }
        })?;

        let record = first_records
            .first()
            .ok_or_else(|| OutputResolutionError::MissingArtifact {
                output: spec.name.clone(),
                key: first_key.to_string(),
            })?;

        Ok(vec![ResolvedArtifact::from(record)])
    }
}
