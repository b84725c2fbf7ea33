//! Namespaced identifiers for items, tags and recipes
//!
//! ID Format:
//! - Item IDs: `{namespace}:{path}` (e.g., `minecraft:oak_log`)
//! - Tag IDs: same shape, written with a leading `#` in ingredient position
//!   (e.g., `#minecraft:planks`)
//! - Recipe IDs: derived from the document location (e.g., `minecraft:stick`)
//!
//! An ID written without a namespace is read in the `minecraft` namespace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace assumed when an id has none
pub const DEFAULT_NAMESPACE: &str = "minecraft";

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Empty identifier")]
    Empty,

    #[error("Invalid identifier '{0}': expected '{{namespace}}:{{path}}'")]
    Invalid(String),
}

/// Characters that are markup in diagram labels and never appear in game ids
const RESERVED_CHARS: &[char] = &['"', '[', ']', '|', '<', '>', '#'];

/// Splits and validates `namespace:path`, filling in the default namespace
fn parse_location(s: &str) -> Result<(String, String), IdError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(IdError::Empty);
    }

    let (namespace, path) = match s.split_once(':') {
        Some((ns, path)) => (ns, path),
        None => (DEFAULT_NAMESPACE, s),
    };

    if namespace.is_empty()
        || path.is_empty()
        || path.contains(':')
        || s.chars().any(|c| c.is_whitespace() || RESERVED_CHARS.contains(&c))
    {
        return Err(IdError::Invalid(s.to_string()));
    }

    Ok((namespace.to_string(), path.to_string()))
}

macro_rules! location_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            namespace: String,
            path: String,
        }

        impl $name {
            /// Returns the namespace portion (before the colon)
            pub fn namespace(&self) -> &str {
                &self.namespace
            }

            /// Returns the path portion (after the colon)
            pub fn path(&self) -> &str {
                &self.path
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", self.namespace, self.path)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (namespace, path) = parse_location(s)?;
                Ok(Self { namespace, path })
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

location_id!(
    /// A concrete item, e.g. `minecraft:stick`
    ItemId
);

location_id!(
    /// An item tag (ingredient group), e.g. `minecraft:planks`
    TagId
);

location_id!(
    /// A recipe, identified by where it was defined
    RecipeId
);

/// A reference that may name either a concrete item or a tag
///
/// Tag references are spelled with a leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemRef {
    Item(ItemId),
    Tag(TagId),
}

impl ItemRef {
    /// Parses `"id"` or `"#tag"`
    pub fn parse(s: &str) -> Result<Self, IdError> {
        match s.trim().strip_prefix('#') {
            Some(tag) => Ok(ItemRef::Tag(tag.parse()?)),
            None => Ok(ItemRef::Item(s.parse()?)),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Item(id) => write!(f, "{}", id),
            ItemRef::Tag(id) => write!(f, "#{}", id),
        }
    }
}

/// Converts an item id into a human-readable name
///
/// `minecraft:oak_log` becomes `Oak Log`.
pub fn humanize(id: &ItemId) -> String {
    id.path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
