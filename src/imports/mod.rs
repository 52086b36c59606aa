//! Imports - declarations and per-file alias maps
//!
//! Import statements are extracted once per file as `ImportDeclaration`s.
//! The same list feeds both the module graph and the `AliasMap` that the call
//! resolver consults.

pub mod alias_map;
pub mod declaration;

pub use alias_map::AliasMap;
pub use declaration::{ImportDeclaration, ImportedName};
