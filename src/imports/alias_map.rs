//! Per-file alias maps
//!
//! Two lookup tables per file:
//! - `module_aliases`: local name → module path
//!   (`import pkg.parser as p` ⇒ `p → pkg.parser`, `import pkg.parser` ⇒ `parser → pkg.parser`)
//! - `symbol_aliases`: imported symbol → module that defines it
//!   (`from .parser import parse` inside `pkg.cli` ⇒ `parse → pkg.parser`)

use super::declaration::ImportDeclaration;
use crate::module_name::ModuleName;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AliasMap {
    pub module_aliases: BTreeMap<String, String>,
    pub symbol_aliases: BTreeMap<String, String>,
}

impl AliasMap {
    /// Build the alias map of a file from its imports, in source order.
    ///
    /// Later bindings of the same local name overwrite earlier ones. A
    /// from-style import whose relative base climbs past the naming root is
    /// skipped entirely.
    pub fn build(imports: &[ImportDeclaration], own_module: &ModuleName) -> Self {
        let mut map = Self::default();

        for decl in imports {
            match decl {
                ImportDeclaration::Direct { module, alias, .. } => {
                    if module.is_empty() {
                        continue;
                    }
                    let local = alias
                        .clone()
                        .unwrap_or_else(|| module.rsplit('.').next().unwrap_or(module).to_string());
                    map.module_aliases.insert(local, module.clone());
                }
                ImportDeclaration::From { base, level, names, .. } => {
                    let Some(resolved) = own_module.resolve_relative(base.as_deref(), *level) else {
                        trace!("Unresolvable import in {}: {}", own_module, decl.raw());
                        continue;
                    };
                    for name in names.iter().filter(|n| !n.name.is_empty() && !n.is_wildcard()) {
                        map.symbol_aliases
                            .insert(name.local_name().to_string(), resolved.as_str().to_string());
                    }
                }
            }
        }

        map
    }

    pub fn module_for_alias(&self, alias: &str) -> Option<&str> {
        self.module_aliases.get(alias).map(String::as_str)
    }

    pub fn module_for_symbol(&self, symbol: &str) -> Option<&str> {
        self.symbol_aliases.get(symbol).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.module_aliases.is_empty() && self.symbol_aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::declaration::ImportedName;

    fn own(s: &str) -> ModuleName {
        ModuleName::parse(s).unwrap()
    }

    #[test]
    fn test_direct_import_uses_last_segment() {
        let imports = vec![ImportDeclaration::direct("dpylens.analyzer.parser", None, 1)];
        let map = AliasMap::build(&imports, &own("dpylens.cli"));
        assert_eq!(map.module_for_alias("parser"), Some("dpylens.analyzer.parser"));
    }

    #[test]
    fn test_direct_import_with_alias() {
        let imports = vec![ImportDeclaration::direct("pkg.a", Some("p".to_string()), 1)];
        let map = AliasMap::build(&imports, &own("pkg.b"));
        assert_eq!(map.module_for_alias("p"), Some("pkg.a"));
        assert_eq!(map.module_for_alias("a"), None);
    }

    #[test]
    fn test_relative_from_import() {
        let imports = vec![ImportDeclaration::from_import(
            Some("parser".to_string()),
            1,
            vec![ImportedName::new("parse_file_to_ast")],
            1,
        )];
        let map = AliasMap::build(&imports, &own("dpylens.analyzer.cli"));
        assert_eq!(
            map.module_for_symbol("parse_file_to_ast"),
            Some("dpylens.analyzer.parser")
        );
    }

    #[test]
    fn test_from_import_alias_is_the_key() {
        let imports = vec![ImportDeclaration::from_import(
            Some("pkg.a".to_string()),
            0,
            vec![ImportedName::aliased("f", "g")],
            1,
        )];
        let map = AliasMap::build(&imports, &own("pkg.b"));
        assert_eq!(map.module_for_symbol("g"), Some("pkg.a"));
        assert_eq!(map.module_for_symbol("f"), None);
    }

    #[test]
    fn test_escaping_relative_import_is_skipped() {
        let imports = vec![ImportDeclaration::from_import(
            Some("x".to_string()),
            5,
            vec![ImportedName::new("y")],
            1,
        )];
        let map = AliasMap::build(&imports, &own("pkg.b"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let imports = vec![
            ImportDeclaration::from_import(Some("pkg.a".to_string()), 0, vec![ImportedName::new("f")], 1),
            ImportDeclaration::from_import(Some("pkg.c".to_string()), 0, vec![ImportedName::new("f")], 2),
            ImportDeclaration::direct("pkg.one", Some("m".to_string()), 3),
            ImportDeclaration::direct("pkg.two", Some("m".to_string()), 4),
        ];
        let map = AliasMap::build(&imports, &own("pkg.b"));
        assert_eq!(map.module_for_symbol("f"), Some("pkg.c"));
        assert_eq!(map.module_for_alias("m"), Some("pkg.two"));
    }

    #[test]
    fn test_wildcard_not_registered() {
        let imports = vec![ImportDeclaration::from_import(
            Some("os".to_string()),
            0,
            vec![ImportedName::new("*")],
            1,
        )];
        let map = AliasMap::build(&imports, &own("pkg.b"));
        assert!(map.symbol_aliases.is_empty());
    }
}
