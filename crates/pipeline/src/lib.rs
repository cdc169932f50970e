//! Batch driver: input files in, store upserts and XML exports out.
//!
//! - [`input`]: reading code lists, scanning the input directory, archiving
//! - [`orchestrator`]: per-code resolve -> fetch -> upsert -> collect, paced

pub mod input;
pub mod orchestrator;

pub use input::{InputError, archive, read_codes, scan_input_dir};
pub use orchestrator::{
    BatchOutcome, BatchSummary, CodeOutcome, FileReport, Pipeline, PipelineError,
};
