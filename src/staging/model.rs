//! Staging Data Model
//!
//! Types exchanged between the orchestrator, the execution engine and the
//! staging components.
//!
//! # Example Binding Document
//!
//! ```yaml
//! reads:
//!   class: File
//!   location: /data/run1/reads.fastq
//! references:
//! - class: File
//!   location: /data/run1/ref_a.fa
//! - class: File
//!   location: /data/run1/ref_b.fa
//! threads: 4
//! ```

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::OutputResolutionError;

/// Location(s) supplied by the caller for one logical input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum InputFile {
    SinglePath(String),
    PathSequence(Vec<String>),
}

impl From<&str> for InputFile {
    fn from(path: &str) -> Self {
        Self::SinglePath(path.to_string())
    }
}

/// Class tag carried by file-like records.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordClass {
    File,
    Directory,
}

/// A `{class, location}` record in the binding document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub class: RecordClass,
    pub location: String,
}

impl FileRecord {
    /// Creates a `File` record for an absolute location.
    pub fn file(location: impl Into<String>) -> Self {
        Self {
            class: RecordClass::File,
            location: location.into(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.class == RecordClass::File
    }
}

/// One entry of the binding document.
///
/// The shape of a value decides its variant, both when arguments are
/// assembled and when a written document is read back:
///
/// - a mapping with exactly `class` and `location` is a [`FileRecord`]
/// - a non-empty sequence of such mappings is a record list
/// - anything else, including an empty sequence, is an argument value
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BindingValue {
    File(FileRecord),
    Files(Vec<FileRecord>),
    Argument(serde_yaml::Value),
}

impl BindingValue {
    /// Classifies a raw document value by its shape.
    pub fn from_value(value: serde_yaml::Value) -> Self {
        if let Some(record) = file_record(&value) {
            return Self::File(record);
        }

        if let serde_yaml::Value::Sequence(items) = &value {
            if !items.is_empty() {
                let records: Option<Vec<FileRecord>> = items.iter().map(file_record).collect();
                if let Some(records) = records {
                    return Self::Files(records);
                }
            }
        }

        Self::Argument(value)
    }
}

impl<'de> Deserialize<'de> for BindingValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_yaml::Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Reads `value` as a record only if it has exactly the record's two keys.
fn file_record(value: &serde_yaml::Value) -> Option<FileRecord> {
    let mapping = value.as_mapping()?;
    if mapping.len() != 2 {
        return None;
    }
    serde_yaml::from_value(value.clone()).ok()
}

/// Mapping from logical input name to its binding, in insertion order.
pub type BindingDocument = IndexMap<String, BindingValue>;

/// Inputs for one execution as supplied by the orchestrator.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StagingRequest {
    #[serde(default)]
    pub files: IndexMap<String, InputFile>,

    #[serde(default)]
    pub arguments: IndexMap<String, serde_yaml::Value>,
}

/// Declared logical output of the workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub name: String,

    #[serde(default)]
    pub allow_multiple: bool,
}

impl OutputSpec {
    pub fn new(name: impl Into<String>, allow_multiple: bool) -> Self {
        Self {
            name: name.into(),
            allow_multiple,
        }
    }
}

/// Artifact reported by the execution engine.
///
/// Engines report more fields (`location`, `checksum`, `size`, ...);
/// only `class` and `path` are kept.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub class: String,
    pub path: String,
}

impl ArtifactRecord {
    pub fn new(class: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            path: path.into(),
        }
    }
}

/// Produced artifacts per logical output, in the engine's key order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ExecutionResults {
    outputs: IndexMap<String, Vec<ArtifactRecord>>,
}

impl ExecutionResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, keeps the order of calls.
    pub fn with_output(mut self, name: impl Into<String>, records: Vec<ArtifactRecord>) -> Self {
        self.outputs.insert(name.into(), records);
        self
    }

    /// Parses the engine's JSON results.
    ///
    /// Each output may be a single record, a list of records, or `null`
    /// when an optional output was not produced.
    pub fn from_json(text: &str) -> Result<Self, OutputResolutionError> {
        let raw: IndexMap<String, Value> =
            serde_json::from_str(text).map_err(OutputResolutionError::InvalidRecord)?;

        let mut outputs = IndexMap::with_capacity(raw.len());
        for (name, value) in raw {
            let records = one_or_many(value).map_err(|source| OutputResolutionError::Malformed {
                output: name.clone(),
                source,
            })?;
            outputs.insert(name, records);
        }

        Ok(Self { outputs })
    }

    pub fn get(&self, name: &str) -> Option<&[ArtifactRecord]> {
        self.outputs.get(name).map(Vec::as_slice)
    }

    /// The first output the engine reported.
    pub fn first(&self) -> Option<(&str, &[ArtifactRecord])> {
        self.outputs
            .first()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Deserializes a single record, an array of records or null into a Vec.
fn one_or_many(value: Value) -> Result<Vec<ArtifactRecord>, serde_json::Error> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value::<ArtifactRecord>)
            .collect(),
        Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        other => Err(de::Error::custom(format!(
            "expected artifact record or list of records, found {}",
            other
        ))),
    }
}

/// A resolved `(path, lowercased type)` pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResolvedArtifact {
    pub fn new(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }
}

impl From<&ArtifactRecord> for ResolvedArtifact {
    fn from(record: &ArtifactRecord) -> Self {
        Self::new(record.path.clone(), record.class.to_lowercase())
    }
}

/// Resolved artifacts keyed by output name.
pub type ResolvedOutputs = IndexMap<String, Vec<ResolvedArtifact>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_file_untagged_yaml() {
        let single: InputFile = serde_yaml::from_str("reads.fastq").unwrap();
        assert_eq!(single, InputFile::SinglePath("reads.fastq".to_string()));

        let many: InputFile = serde_yaml::from_str("[a.fa, b.fa]").unwrap();
        assert_eq!(
            many,
            InputFile::PathSequence(vec!["a.fa".to_string(), "b.fa".to_string()])
        );
    }

    #[test]
    fn test_file_record_serializes_class_first() {
        let yaml = serde_yaml::to_string(&FileRecord::file("/data/x.txt")).unwrap();
        assert_eq!(yaml, "class: File\nlocation: /data/x.txt\n");
    }

    #[test]
    fn test_binding_value_prefers_records() {
        let value: BindingValue =
            serde_yaml::from_str("class: Directory\nlocation: /data/dir\n").unwrap();
        assert_eq!(
            value,
            BindingValue::File(FileRecord {
                class: RecordClass::Directory,
                location: "/data/dir".to_string()
            })
        );

        let value: BindingValue = serde_yaml::from_str("42").unwrap();
        assert!(matches!(value, BindingValue::Argument(_)));
    }

    #[test]
    fn test_empty_sequence_is_argument() {
        let value: BindingValue = serde_yaml::from_str("[]").unwrap();
        assert_eq!(
            value,
            BindingValue::Argument(serde_yaml::Value::Sequence(Vec::new()))
        );
    }

    #[test]
    fn test_record_sequence_is_files() {
        let value: BindingValue = serde_yaml::from_str(
            "- class: File\n  location: /a.fa\n- class: File\n  location: /b.fa\n",
        )
        .unwrap();
        assert_eq!(
            value,
            BindingValue::Files(vec![FileRecord::file("/a.fa"), FileRecord::file("/b.fa")])
        );
    }

    #[test]
    fn test_mixed_sequence_is_argument() {
        let value: BindingValue =
            serde_yaml::from_str("- class: File\n  location: /a.fa\n- plain\n").unwrap();
        assert!(matches!(value, BindingValue::Argument(serde_yaml::Value::Sequence(_))));
    }

    #[test]
    fn test_mapping_with_extra_keys_is_argument() {
        let value: BindingValue =
            serde_yaml::from_str("class: File\nlocation: /a.fa\nformat: fasta\n").unwrap();
        assert!(matches!(value, BindingValue::Argument(serde_yaml::Value::Mapping(_))));

        let value: BindingValue =
            serde_yaml::from_str("class: Socket\nlocation: /tmp/s\n").unwrap();
        assert!(matches!(value, BindingValue::Argument(_)));
    }

    #[test]
    fn test_execution_results_from_json_mixed_shapes() {
        let json = r#"{
            "aligned": {"class": "File", "path": "/out/aligned.bam", "size": 10},
            "reports": [
                {"class": "File", "path": "/out/r1.html"},
                {"class": "Directory", "path": "/out/extra"}
            ],
            "optional": null
        }"#;

        let results = ExecutionResults::from_json(json).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results.get("aligned").unwrap().len(), 1);
        assert_eq!(results.get("reports").unwrap()[1].class, "Directory");
        assert!(results.get("optional").unwrap().is_empty());

        let (first_key, first_records) = results.first().unwrap();
        assert_eq!(first_key, "aligned");
        assert_eq!(first_records[0].path, "/out/aligned.bam");
    }

    #[test]
    fn test_execution_results_missing_path_is_malformed() {
        let json = r#"{"aligned": [{"class": "File"}]}"#;
        let err = ExecutionResults::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            OutputResolutionError::Malformed { ref output, .. } if output == "aligned"
        ));
    }

    #[test]
    fn test_execution_results_scalar_value_is_malformed() {
        let err = ExecutionResults::from_json(r#"{"count": 3}"#).unwrap_err();
        assert!(matches!(err, OutputResolutionError::Malformed { .. }));
    }

    #[test]
    fn test_execution_results_not_a_mapping() {
        let err = ExecutionResults::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, OutputResolutionError::InvalidRecord(_)));
    }

    #[test]
    fn test_resolved_artifact_lowercases_type() {
        let record = ArtifactRecord::new("Directory", "/out/dir");
        let resolved = ResolvedArtifact::from(&record);
        assert_eq!(resolved, ResolvedArtifact::new("/out/dir", "directory"));
    }

    #[test]
    fn test_output_spec_defaults_to_single() {
        let spec: OutputSpec = serde_yaml::from_str("name: report").unwrap();
        assert!(!spec.allow_multiple);
    }

    #[test]
    fn test_staging_request_defaults() {
        let request: StagingRequest = serde_yaml::from_str("files:\n  reads: r.fq\n").unwrap();
        assert_eq!(request.files.len(), 1);
        assert!(request.arguments.is_empty());
    }
}
