//! Execution Staging Module
//!
//! Prepares the inputs of a workflow execution and interprets what the
//! execution produced.
//!
//! # Structure
//!
//! - [`model`]: Binding documents, output specs and execution results
//! - [`bindings`]: Input-binding document construction
//! - [`outputs`]: Output resolution against execution results
//! - [`error`]: Error kinds per component

pub mod bindings;
pub mod error;
pub mod model;
pub mod outputs;

pub use bindings::InputBindingBuilder;
pub use error::{ArchiveError, BindingError, CrateExportError, OutputResolutionError};
pub use model::{
    ArtifactRecord, BindingDocument, BindingValue, ExecutionResults, FileRecord, InputFile,
    OutputSpec, RecordClass, ResolvedArtifact, ResolvedOutputs, StagingRequest,
};
pub use outputs::OutputResolver;
