//! Terminal presentation: colors, icons, tables and progress bars

pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, section, status, success, warn};
pub use progress::ProgressManager;
pub use progress_message::{ProgressMessage, ProgressPhase};
pub use table::{TableBuilder, render, stats_table};
pub use theme::{Theme, theme};
