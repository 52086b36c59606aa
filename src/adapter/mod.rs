//! Language adapters
//!
//! An adapter parses one source file into a syntax tree and extracts the
//! per-file facts the linker needs: imports, function definitions and calls.
//! Adapters see a single file at a time and share no state, so extraction can
//! run on any number of worker threads.

pub mod framework;
pub mod python;

pub use framework::{FileExtraction, LanguageAdapter};
pub use python::PythonAdapter;
