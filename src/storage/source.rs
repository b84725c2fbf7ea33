//! Document discovery
//!
//! A [`DocumentSource`] hands raw recipe and tag documents to the loader.
//! [`DatapackSource`] reads a game instance or datapack directory, including
//! any `.jar`/`.zip` archives inside it; [`MemorySource`] serves documents
//! built in code.
//!
//! Document locations follow the datapack layout:
//!
//! | Kind | Location | Id |
//! |------|----------|----|
//! | Recipe | `<ns>/recipes/<path>.json` (or `recipe/`) | `<ns>:<path>` |
//! | Tag | `<ns>/tags/items/<path>.json` (or `tags/item/`) | `<ns>:<path>` |

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::domain::{DocumentKind, ParseWarning, ParseWarningKind, Provenance, RawDocument};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Dataset root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Dataset root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Documents found by a source, plus the files that could not be read
#[derive(Debug, Default)]
pub struct Discovery {
    pub documents: Vec<RawDocument>,
    pub warnings: Vec<ParseWarning>,
}

/// Anything that can produce raw recipe and tag documents
pub trait DocumentSource {
    fn discover(&self) -> Result<Discovery, SourceError>;
}

/// Documents held in memory, discovered in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: Vec<RawDocument>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an on-disk recipe document
    pub fn recipe(mut self, id: &str, body: serde_json::Value) -> Self {
        let provenance = Provenance::disk(self.next_order(), format!("memory:recipe/{}", id));
        self.documents.push(RawDocument::recipe(id, provenance, body));
        self
    }

    /// Adds an on-disk tag document
    pub fn tag(mut self, id: &str, body: serde_json::Value) -> Self {
        let provenance = Provenance::disk(self.next_order(), format!("memory:tag/{}", id));
        self.documents.push(RawDocument::tag(id, provenance, body));
        self
    }

    fn next_order(&self) -> u64 {
        self.documents.len() as u64
    }
}

impl DocumentSource for MemorySource {
    fn discover(&self) -> Result<Discovery, SourceError> {
        Ok(Discovery {
            documents: self.documents.clone(),
            warnings: Vec::new(),
        })
    }
}

/// A directory tree of datapack files and mod archives
#[derive(Debug, Clone)]
pub struct DatapackSource {
    root: PathBuf,
}

impl DatapackSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn read_file(&self, path: &Path, kind: DocumentKind, id: String, order: u64, found: &mut Discovery) {
        let source = self.relative(path);
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                found
                    .warnings
                    .push(ParseWarning::new(source, ParseWarningKind::Io(e.to_string())));
                return;
            }
        };
        push_document(kind, id, Provenance::disk(order, source), &text, found);
    }

    fn scan_archive(&self, path: &Path, order: &mut u64, found: &mut Discovery) {
        let archive_name = self.relative(path);
        let mut archive = match File::open(path)
            .map_err(|e| e.to_string())
            .and_then(|file| ZipArchive::new(file).map_err(|e| e.to_string()))
        {
            Ok(archive) => archive,
            Err(reason) => {
                found
                    .warnings
                    .push(ParseWarning::new(archive_name, ParseWarningKind::Io(reason)));
                return;
            }
        };

        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        tracing::debug!(archive = %archive_name, entries = names.len(), "scanning archive");

        for name in names {
            let Some((kind, id)) = classify(&name) else {
                continue;
            };
            let source = format!("{}!/{}", archive_name, name);
            let mut text = String::new();
            let read = archive
                .by_name(&name)
                .map_err(|e| e.to_string())
                .and_then(|mut entry| entry.read_to_string(&mut text).map_err(|e| e.to_string()));
            if let Err(reason) = read {
                found
                    .warnings
                    .push(ParseWarning::new(source, ParseWarningKind::Io(reason)));
                continue;
            }
            push_document(kind, id, Provenance::archive(*order, source), &text, found);
            *order += 1;
        }
    }
}

impl DocumentSource for DatapackSource {
    fn discover(&self) -> Result<Discovery, SourceError> {
        if !self.root.exists() {
            return Err(SourceError::RootNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(SourceError::NotADirectory(self.root.clone()));
        }

        let mut found = Discovery::default();
        let mut order: u64 = 0;

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let source = e
                        .path()
                        .map(|p| self.relative(p))
                        .unwrap_or_else(|| self.relative(&self.root));
                    found
                        .warnings
                        .push(ParseWarning::new(source, ParseWarningKind::Io(e.to_string())));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase());
            match extension.as_deref() {
                Some("json") => {
                    if let Some((kind, id)) = classify(&self.relative(path)) {
                        self.read_file(path, kind, id, order, &mut found);
                        order += 1;
                    }
                }
                Some("jar") | Some("zip") => self.scan_archive(path, &mut order, &mut found),
                _ => {}
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            documents = found.documents.len(),
            warnings = found.warnings.len(),
            "discovery finished"
        );
        Ok(found)
    }
}

fn push_document(
    kind: DocumentKind,
    id: String,
    provenance: Provenance,
    text: &str,
    found: &mut Discovery,
) {
    match serde_json::from_str(text) {
        Ok(body) => found.documents.push(RawDocument {
            kind,
            id,
            provenance,
            body,
        }),
        Err(e) => found.warnings.push(ParseWarning::new(
            provenance.source,
            ParseWarningKind::InvalidJson(e.to_string()),
        )),
    }
}

/// Works out what a `/`-separated path defines, if anything
///
/// Advancement trees reuse the `recipes/` directory name and are skipped.
fn classify(path: &str) -> Option<(DocumentKind, String)> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let (last, _) = parts.split_last()?;
    let stem = last.strip_suffix(".json")?;

    for i in 1..parts.len() {
        let namespace = parts[i - 1];
        if matches!(namespace, "advancements" | "advancement" | "data") {
            continue;
        }

        let rest = match parts[i] {
            "recipes" | "recipe" => &parts[i + 1..],
            "tags" if matches!(parts.get(i + 1), Some(&"items") | Some(&"item")) => &parts[i + 2..],
            _ => continue,
        };
        let kind = if parts[i] == "tags" {
            DocumentKind::Tag
        } else {
            DocumentKind::Recipe
        };
        if rest.is_empty() {
            continue;
        }

        let mut segments: Vec<&str> = rest[..rest.len() - 1].to_vec();
        segments.push(stem);
        return Some((kind, format!("{}:{}", namespace, segments.join("/"))));
    }

    None
}
