//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `analyze <ITEM>` | Bill of materials, optionally with a Mermaid diagram |
//! | `recipe <ITEM>` | Candidate recipes in preference order |
//! | `tag <TAG>` | Flattened tag members |
//! | `check` | Dataset load report |
//! | `items search/rebuild/status` | Item id lookup through the SQLite index |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! craftcost --verbose analyze minecraft:stick -n 4
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod analyze;
mod app;
mod inspect;
mod items_cmd;
mod output;
mod settings;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
pub use settings::Settings;
