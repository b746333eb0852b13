//! Provenance Packaging Module
//!
//! Packages what an execution leaves behind into portable forms.
//!
//! - [`archive`]: Provenance directory to ZIP archive
//! - [`rocrate`]: Workflow RO-Crate export

pub mod archive;
pub mod rocrate;

pub use archive::{verify_archive, ProvenanceArchiver};
pub use rocrate::{include_files, CrateBuilder, CrateExporter, RoCrate, RoCrateBuilder, WorkflowCrate};
