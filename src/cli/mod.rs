//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `show` | Render the dependency-column layout of a deployment file |
//! | `validate` | Structural checks: duplicate IDs, dangling references, cycles |
//! | `stages` | Tabular stage listing with status and requirements |
//!
//! All commands support `--format text|json` and `--verbose`.
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod show;
mod stages;
mod validate;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
