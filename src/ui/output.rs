use crate::output::is_quiet;
use crate::ui::{Icons, theme};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::ANALYZE, text.style(theme().header));
}

pub fn status(icon: &str, label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}: {}", icon, label.style(theme().dim), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::DONE, label.style(theme().success));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::FAILED, label.style(theme().error));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn));
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim).to_string()
}
