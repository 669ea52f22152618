//! Terminal output for command results
//!
//! Uses `cliclack` log lines on an interactive terminal and plain
//! `[OK]`/`[WARN]` prefixed lines everywhere else.

mod context;
mod output;

pub use context::UiContext;
pub use output::{
    key_value, key_value_status, remark, step_error_detail, step_ok, step_ok_detail, step_warn,
    step_warn_hint,
};
