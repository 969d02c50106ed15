//! Terminal output helpers
//!
//! Spinners and colour only when attached to an interactive terminal;
//! plain `[OK]`/`[FAIL]` prefixes otherwise so CI logs stay greppable.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{key_value, step_error, step_error_detail, step_ok, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
