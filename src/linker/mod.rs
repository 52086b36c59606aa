//! Linkers - the global second pass
//!
//! Both linkers need the complete output of per-file extraction:
//! - `ModuleLinker` needs every module name to tell local imports from external ones
//! - `CallLinker` needs every function to decide whether a callee is known

pub mod call_linker;
pub mod module_linker;

pub use call_linker::{CallLinker, CallLinkerStats, ResolutionStrategy};
pub use module_linker::ModuleLinker;
