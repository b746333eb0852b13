//! Input Binding Builder
//!
//! Turns the caller's input files and argument values into the binding
//! document consumed by the execution engine, and writes it as YAML.
//!
//! - File entries become `{class: File, location}` records (or lists of them)
//! - Relative paths are resolved against the workflow base directory
//! - Argument values are copied verbatim, except the workflow source key

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::DEFAULT_WORKFLOW_SOURCE_KEY;
use crate::monitoring::{Reporter, Severity};

use super::error::BindingError;
use super::model::{BindingDocument, BindingValue, FileRecord, InputFile};

const OPERATION: &str = "bindings";

/// Builds input-binding documents for one workflow.
pub struct InputBindingBuilder {
    base_dir: PathBuf,
    source_key: String,
    reporter: Arc<dyn Reporter>,
}

impl InputBindingBuilder {
    /// Creates a builder resolving relative paths against `base_dir`.
    ///
    /// A relative base directory is made absolute against the current
    /// directory.
    pub fn new(base_dir: impl Into<PathBuf>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            base_dir: absolutize(base_dir.into()),
            source_key: DEFAULT_WORKFLOW_SOURCE_KEY.to_string(),
            reporter,
        }
    }

    /// Overrides the reserved argument name excluded from the document.
    pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = key.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Builds the binding document and writes it to `target`.
    ///
    /// Any existing file at `target` is overwritten.
    ///
    /// # Returns
    ///
    /// * `Ok(BindingDocument)` - The document that was written
    /// * `Err(BindingError::Empty)` - No inputs remained to bind
    /// * `Err(BindingError::Serialization | BindingError::Write)` - The
    ///   document could not be written
    pub fn build(
        &self,
        input_files: &IndexMap<String, InputFile>,
        arguments: &IndexMap<String, serde_yaml::Value>,
        target: &Path,
    ) -> Result<BindingDocument, BindingError> {
        let document = self.assemble(input_files, arguments);

        if document.is_empty() {
            let err = BindingError::Empty {
                target: target.to_path_buf(),
            };
            self.reporter
                .report(Severity::Error, OPERATION, &err.to_string());
            return Err(err);
        }

        self.write(&document, target)?;
        Ok(document)
    }

    /// Assembles the binding document without touching the filesystem.
    ///
    /// File entries come first, then arguments. An argument sharing a name
    /// with a file entry replaces it in place.
    pub fn assemble(
        &self,
        input_files: &IndexMap<String, InputFile>,
        arguments: &IndexMap<String, serde_yaml::Value>,
    ) -> BindingDocument {
        let mut document = BindingDocument::with_capacity(input_files.len() + arguments.len());

        for (name, input) in input_files {
            let value = match input {
                InputFile::SinglePath(path) => {
                    BindingValue::File(FileRecord::file(self.resolve_location(path)))
                }
                InputFile::PathSequence(paths) => BindingValue::Files(
                    paths
                        .iter()
                        .map(|path| FileRecord::file(self.resolve_location(path)))
                        .collect(),
                ),
            };
            document.insert(name.clone(), value);
        }

        for (name, value) in arguments {
            if *name == self.source_key {
                continue;
            }
            if document.contains_key(name) {
                self.reporter.report(
                    Severity::Warn,
                    OPERATION,
                    &format!("argument '{}' overrides the file input of the same name", name),
                );
            }
            document.insert(name.clone(), BindingValue::from_value(value.clone()));
        }

        self.reporter.report(
            Severity::Debug,
            OPERATION,
            &format!("assembled {} execution inputs", document.len()),
        );

        document
    }

    /// Serializes `document` as block-style YAML and writes it to `target`.
    pub fn write(&self, document: &BindingDocument, target: &Path) -> Result<(), BindingError> {
        let yaml_content = serde_yaml::to_string(document).map_err(|source| {
            let err = BindingError::Serialization {
                target: target.to_path_buf(),
                source,
            };
            self.reporter
                .report(Severity::Error, OPERATION, &err.to_string());
            err
        })?;

        fs::write(target, yaml_content).map_err(|source| {
            let err = BindingError::Write {
                target: target.to_path_buf(),
                source,
            };
            self.reporter
                .report(Severity::Error, OPERATION, &err.to_string());
            err
        })?;

        self.reporter.report(
            Severity::Info,
            OPERATION,
            &format!("binding document written to {}", target.display()),
        );
        Ok(())
    }

    /// Returns `path` as an absolute location string.
    fn resolve_location(&self, path: &str) -> String {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            path.to_string()
        } else {
            self.base_dir.join(candidate).to_string_lossy().into_owned()
        }
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}
