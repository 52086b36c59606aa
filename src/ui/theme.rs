use crate::edge::EdgeKind;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal styles for CLI output.
///
/// Generic message styles plus the graph vocabulary: module and function
/// names, local vs external edges, resolved vs unresolved call targets.
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub module: Style,
    pub function: Style,
    pub local: Style,
    pub external: Style,
    pub resolved: Style,
    pub unresolved: Style,
}

impl Theme {
    /// Colored on a terminal unless `NO_COLOR` is set.
    pub fn detect() -> Self {
        if std::env::var_os("NO_COLOR").is_some() || !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            module: Style::new().blue().bold(),
            function: Style::new().cyan(),
            local: Style::new().green(),
            external: Style::new().bright_black(),
            resolved: Style::new().green(),
            unresolved: Style::new().yellow().dimmed(),
        }
    }

    pub fn plain() -> Self {
        let s = Style::new();
        Self {
            header: s,
            success: s,
            error: s,
            warn: s,
            info: s,
            dim: s,
            module: s,
            function: s,
            local: s,
            external: s,
            resolved: s,
            unresolved: s,
        }
    }

    pub fn edge_kind(&self, kind: EdgeKind) -> Style {
        match kind {
            EdgeKind::Local => self.local,
            EdgeKind::External => self.external,
        }
    }

    pub fn call_target(&self, resolved: bool) -> Style {
        if resolved { self.resolved } else { self.unresolved }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_theme_adds_no_escapes() {
        let t = Theme::plain();
        assert_eq!("pkg.a".style(t.edge_kind(EdgeKind::Local)).to_string(), "pkg.a");
        assert_eq!("os".style(t.call_target(false)).to_string(), "os");
    }

    #[test]
    fn test_colored_theme_separates_edge_kinds() {
        let t = Theme::colored();
        let local = "x".style(t.edge_kind(EdgeKind::Local)).to_string();
        let external = "x".style(t.edge_kind(EdgeKind::External)).to_string();
        assert_ne!(local, external);
        assert!(local.contains('\u{1b}'));
    }
}
