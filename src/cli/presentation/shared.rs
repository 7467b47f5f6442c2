//! Shared presentation helpers.

use owo_colors::OwoColorize;

/// Format a heading with bold and underline ANSI styling. Always styled.
pub fn format_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Shorten `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
