/// Glyphs used in human-mode output.
pub struct Icons;

impl Icons {
    pub const ANALYZE: &str = "🔍";
    pub const DONE: &str = "✅";
    pub const FAILED: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const STATS: &str = "📊";
    pub const ROOT: &str = "📁";
    pub const ARTIFACTS: &str = "📦";
    pub const FILE: &str = "📄";
    pub const FUNCTION: &str = "ƒ";
    pub const EDGE: &str = "🔗";
    pub const CALL: &str = "📞";
    pub const HOP_DIRECT: &str = "🔴";
    pub const HOP_TRANSITIVE: &str = "🟠";
    pub const NONE: &str = "∅";
}
