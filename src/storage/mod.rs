//! # Storage Layer
//!
//! Everything that touches the filesystem: discovering recipe and tag
//! documents, loading them into a [`Dataset`], the SQLite [`ItemIndex`], and
//! configuration.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Recipes | JSON | `<root>/**/<ns>/recipes/**/*.json`, also inside `.jar`/`.zip` |
//! | Tags | JSON | `<root>/**/<ns>/tags/items/**/*.json`, also inside archives |
//! | Item index | SQLite | `<index_dir>/items_index_<hash>.sqlite` |
//! | Config | TOML | `<config_dir>/craftcost/config.toml` |
//!
//! ## Key Types
//!
//! - [`DocumentSource`] - Produces raw documents ([`DatapackSource`], [`MemorySource`])
//! - [`Dataset`] - Recipe index and tag table built from one source
//! - [`ItemIndex`] - Full-text item id search
//! - [`Config`] - User configuration

mod config;
mod dataset;
mod item_index;
mod source;

pub use config::{Config, ConfigError, OutputFormat, DEFAULT_DATAPACK_PATH, DEFAULT_SEARCH_LIMIT};
pub use dataset::{Dataset, LoadReport};
pub use item_index::{IndexStatus, IndexedItem, ItemIndex, ItemIndexError};
pub use source::{DatapackSource, DocumentSource, Discovery, MemorySource, SourceError};
