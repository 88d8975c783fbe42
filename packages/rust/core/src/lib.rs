//! Workflow orchestration for CourseCraft.
//!
//! Ties the prompt builder, the generation and search clients, the document
//! renderers and the package assembler into the user-facing workflows:
//! ask, analyze a PDF, research, and export.

pub mod delivery;
pub mod export;
pub mod workbench;

pub use delivery::{Delivery, ExportOptions};
pub use export::Exporter;
pub use workbench::{ProgressReporter, SilentProgress, Workbench};
