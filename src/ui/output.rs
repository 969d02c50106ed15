//! Step lines for command results
//!
//! Terminals get glyphs, batch logs get bracketed tags that grep well.

use super::context::UiContext;
use console::{style, StyledObject};

#[derive(Clone, Copy)]
enum Mark {
    Ok,
    Warn,
    Fail,
}

impl Mark {
    fn render(self, ctx: &UiContext) -> StyledObject<&'static str> {
        let fancy = ctx.use_fancy_output();
        match self {
            Self::Ok => style(if fancy { "✓" } else { "[OK]" }).green(),
            Self::Warn => style(if fancy { "!" } else { "[WARN]" }).yellow(),
            Self::Fail => style(if fancy { "✗" } else { "[FAIL]" }).red(),
        }
    }
}

fn step(ctx: &UiContext, mark: Mark, line: &str) {
    println!("{} {}", mark.render(ctx), line);
}

/// Successful operation
pub fn step_ok(ctx: &UiContext, message: &str) {
    step(ctx, Mark::Ok, message);
}

/// Successful operation, with the path or value it produced
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    step(ctx, Mark::Ok, &format!("{} ({})", message, style(detail).dim()));
}

pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    step(ctx, Mark::Warn, &format!("{} - {}", message, style(hint).dim()));
}

/// Failed operation
pub fn step_error(ctx: &UiContext, message: &str) {
    step(ctx, Mark::Fail, message);
}

pub fn step_error_detail(ctx: &UiContext, message: &str, detail: &str) {
    step(ctx, Mark::Fail, &format!("{}: {}", message, style(detail).red()));
}

/// Indented key/value line
pub fn key_value(key: &str, value: &str) {
    println!("  {:<10} {}", style(key).dim(), value);
}
