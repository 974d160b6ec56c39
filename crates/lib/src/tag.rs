//! Image tag parsing and validation.
//!
//! A tag names the build artifact every pipeline stage is keyed on. It has
//! the form `namespace/name:version` (e.g. `funkelab/lsd:v0.8`) and is
//! validated once when parsed; after that it is immutable for the whole
//! invocation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a tag string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
  /// No `:` separator, so no version component.
  #[error("tag '{0}' has no version (expected namespace/name:version)")]
  MissingVersion(String),

  /// No `/` separator, so no namespace component.
  #[error("tag '{0}' has no namespace (expected namespace/name:version)")]
  MissingNamespace(String),

  /// One of the components is empty.
  #[error("tag '{raw}' has an empty {component}")]
  EmptyComponent { raw: String, component: &'static str },

  /// A component contains whitespace.
  #[error("tag '{0}' contains whitespace")]
  Whitespace(String),
}

/// A well-formed `namespace/name:version` image tag.
///
/// Tags are mutable pointers in the artifact store: building twice under the
/// same tag overwrites what the tag points at. That is accepted behavior,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag {
  namespace: String,
  name: String,
  version: String,
}

impl Tag {
  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  /// Directory name for this tag's build context under the workspace root.
  ///
  /// `/` and `:` are path separators or reserved on common filesystems, so
  /// they are flattened to `-`.
  pub fn context_dirname(&self) -> String {
    format!("{}-{}-{}", self.namespace, self.name, self.version)
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}:{}", self.namespace, self.name, self.version)
  }
}

impl FromStr for Tag {
  type Err = TagError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    if raw.chars().any(char::is_whitespace) {
      return Err(TagError::Whitespace(raw.to_string()));
    }

    // Split the version off the last ':' so the namespace may contain a
    // registry host with a port in a later revision.
    let (reference, version) = raw
      .rsplit_once(':')
      .ok_or_else(|| TagError::MissingVersion(raw.to_string()))?;

    let (namespace, name) = reference
      .split_once('/')
      .ok_or_else(|| TagError::MissingNamespace(raw.to_string()))?;

    for (component, value) in [("namespace", namespace), ("name", name), ("version", version)] {
      if value.is_empty() {
        return Err(TagError::EmptyComponent {
          raw: raw.to_string(),
          component,
        });
      }
    }

    Ok(Tag {
      namespace: namespace.to_string(),
      name: name.to_string(),
      version: version.to_string(),
    })
  }
}

impl TryFrom<String> for Tag {
  type Error = TagError;

  fn try_from(raw: String) -> Result<Self, Self::Error> {
    raw.parse()
  }
}

impl From<Tag> for String {
  fn from(tag: Tag) -> String {
    tag.to_string()
  }
}
