//! Workflow RO-Crate Export
//!
//! Collects the input files of an execution and hands them, together with
//! the workflow location, to a crate builder. The bundled
//! [`RoCrateBuilder`] writes an RO-Crate 1.1 `ro-crate-metadata.json`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::config::DEFAULT_WORKFLOW_TYPE;
use crate::monitoring::{Reporter, Severity};
use crate::staging::error::CollaboratorError;
use crate::staging::{BindingDocument, BindingValue, CrateExportError};

const OPERATION: &str = "crate";

/// Name of the metadata file written into the crate directory.
pub const METADATA_FILE: &str = "ro-crate-metadata.json";

const RO_CRATE_CONTEXT: &str = "https://w3id.org/ro/crate/1.1/context";
const RO_CRATE_SPEC: &str = "https://w3id.org/ro/crate/1.1";

/// A built crate ready to be written.
pub trait WorkflowCrate {
    /// Writes the crate's files into `target_dir`.
    fn write(&self, target_dir: &Path) -> Result<(), CollaboratorError>;
}

/// Builds crates describing a workflow and the files it used.
pub trait CrateBuilder {
    fn build(
        &self,
        workflow_path: &str,
        workflow_type: &str,
        include_files: &[String],
    ) -> Result<Box<dyn WorkflowCrate>, CollaboratorError>;
}

/// Exports a workflow crate through a [`CrateBuilder`].
pub struct CrateExporter<B: CrateBuilder> {
    builder: B,
    workflow_type: String,
    reporter: Arc<dyn Reporter>,
}

impl<B: CrateBuilder> CrateExporter<B> {
    pub fn new(builder: B, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            builder,
            workflow_type: DEFAULT_WORKFLOW_TYPE.to_string(),
            reporter,
        }
    }

    /// Sets the workflow type tag passed to the builder.
    pub fn with_workflow_type(mut self, workflow_type: impl Into<String>) -> Self {
        self.workflow_type = workflow_type.into();
        self
    }

    /// Builds the crate for `workflow_source_url` and writes it to
    /// `target_dir`. A failed attempt is not retried.
    pub fn export(
        &self,
        workflow_source_url: &str,
        input_files: &BindingDocument,
        target_dir: &Path,
    ) -> Result<(), CrateExportError> {
        let include_files = include_files(input_files);
        self.reporter.report(
            Severity::Debug,
            OPERATION,
            &format!("Include files: {:?}", include_files),
        );

        let result = self
            .builder
            .build(workflow_source_url, &self.workflow_type, &include_files)
            .map_err(|source| CrateExportError::Build {
                workflow: workflow_source_url.to_string(),
                source,
            })
            .and_then(|ro_crate| {
                ro_crate
                    .write(target_dir)
                    .map_err(|source| CrateExportError::Write {
                        target: target_dir.to_path_buf(),
                        source,
                    })
            });

        if let Err(ref err) = result {
            self.reporter.report(
                Severity::Fatal,
                OPERATION,
                &format!("Unable to create RO-Crate: {}", err),
            );
        } else {
            self.reporter.report(
                Severity::Info,
                OPERATION,
                &format!("RO-Crate written to {}", target_dir.display()),
            );
        }

        result
    }
}

/// Returns the locations of single `File` entries, in document order.
///
/// Directory records, record lists and argument values are skipped.
pub fn include_files(document: &BindingDocument) -> Vec<String> {
    document
        .values()
        .filter_map(|value| match value {
            BindingValue::File(record) if record.is_file() => Some(record.location.clone()),
            _ => None,
        })
        .collect()
}

/// Builds RO-Crate 1.1 metadata documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoCrateBuilder;

impl CrateBuilder for RoCrateBuilder {
    fn build(
        &self,
        workflow_path: &str,
        workflow_type: &str,
        include_files: &[String],
    ) -> Result<Box<dyn WorkflowCrate>, CollaboratorError> {
        if workflow_path.trim().is_empty() {
            return Err("workflow location is empty".into());
        }

        Ok(Box::new(RoCrate {
            workflow: workflow_path.to_string(),
            workflow_type: workflow_type.to_string(),
            files: include_files.to_vec(),
        }))
    }
}

/// An RO-Crate describing one workflow and its input files.
#[derive(Debug, Clone)]
pub struct RoCrate {
    workflow: String,
    workflow_type: String,
    files: Vec<String>,
}

impl RoCrate {
    /// Renders the JSON-LD metadata document.
    pub fn metadata(&self) -> Value {
        let language_id = format!("#{}", self.workflow_type.to_lowercase());

        let mut has_part = vec![json!({ "@id": self.workflow })];
        has_part.extend(self.files.iter().map(|file| json!({ "@id": file })));

        let mut graph = vec![
            json!({
                "@id": METADATA_FILE,
                "@type": "CreativeWork",
                "conformsTo": { "@id": RO_CRATE_SPEC },
                "about": { "@id": "./" }
            }),
            json!({
                "@id": "./",
                "@type": "Dataset",
                "datePublished": Utc::now().to_rfc3339(),
                "hasPart": has_part,
                "mainEntity": { "@id": self.workflow }
            }),
            json!({
                "@id": self.workflow,
                "@type": ["File", "SoftwareSourceCode", "ComputationalWorkflow"],
                "programmingLanguage": { "@id": language_id }
            }),
            self.language_entity(&language_id),
        ];

        graph.extend(
            self.files
                .iter()
                .map(|file| json!({ "@id": file, "@type": "File" })),
        );

        json!({
            "@context": RO_CRATE_CONTEXT,
            "@graph": graph
        })
    }

    fn language_entity(&self, language_id: &str) -> Value {
        if self.workflow_type.eq_ignore_ascii_case("cwl") {
            json!({
                "@id": language_id,
                "@type": "ComputerLanguage",
                "name": "Common Workflow Language",
                "alternateName": "CWL",
                "identifier": { "@id": "https://w3id.org/cwl/" },
                "url": { "@id": "https://www.commonwl.org/" }
            })
        } else {
            json!({
                "@id": language_id,
                "@type": "ComputerLanguage",
                "name": self.workflow_type
            })
        }
    }
}

impl WorkflowCrate for RoCrate {
    fn write(&self, target_dir: &Path) -> Result<(), CollaboratorError> {
        fs::create_dir_all(target_dir)?;
        let content = serde_json::to_string_pretty(&self.metadata())?;
        fs::write(target_dir.join(METADATA_FILE), content)?;
        Ok(())
    }
}
