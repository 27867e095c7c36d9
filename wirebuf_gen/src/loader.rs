/* Schema document loading and structural validation */

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use wirebuf_types::{Document, Kind, TypeDescriptor};

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to read schema from {source_name}: {source}")]
  Io {
    source_name: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to decode JSON schema document: {0}")]
  Json(#[from] serde_json::Error),

  #[error("failed to decode YAML schema document: {0}")]
  Yaml(#[from] serde_yml::Error),

  #[error("malformed schema at '{location}': {reason}")]
  Malformed { location: String, reason: String },
}

/* Encoding of the schema document on disk or stdin */
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum SchemaFormat {
  #[default]
  Json,
  Yaml,
}

impl SchemaFormat {
  /* Pick the format from a file extension, defaulting to JSON */
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("yaml") | Some("yml") => SchemaFormat::Yaml,
      _ => SchemaFormat::Json,
    }
  }
}

/* Decode and validate a document from its full text */
pub fn load_document(text: &str, format: SchemaFormat) -> Result<Document, LoadError> {
  let document: Document = match format {
    SchemaFormat::Json => serde_json::from_str(text)?,
    SchemaFormat::Yaml => serde_yml::from_str(text)?,
  };
  validate_document(&document)?;
  debug!(
    package = %document.package,
    structs = document.structs.len(),
    "loaded schema document"
  );
  Ok(document)
}

/* Read a whole document from a reader (stdin in the default CLI mode) */
pub fn load_from_reader<R: Read>(
  mut reader: R,
  source_name: &str,
  format: SchemaFormat,
) -> Result<Document, LoadError> {
  let mut text = String::new();
  reader.read_to_string(&mut text).map_err(|source| LoadError::Io {
    source_name: source_name.to_string(),
    source,
  })?;
  load_document(&text, format)
}

pub fn load_file(path: &Path, format: Option<SchemaFormat>) -> Result<Document, LoadError> {
  let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
    source_name: path.display().to_string(),
    source,
  })?;
  load_document(&text, format.unwrap_or_else(|| SchemaFormat::from_path(path)))
}

/* Structural checks only; protocol-level issues are left to `analyze` */
pub fn validate_document(document: &Document) -> Result<(), LoadError> {
  if document.package.trim().is_empty() {
    return Err(malformed("package", "package name is empty"));
  }

  for s in &document.structs {
    if s.name.trim().is_empty() {
      return Err(malformed(&document.package, "struct with an empty name"));
    }

    let mut seen = HashSet::new();
    for field in &s.fields {
      let location = format!("{}.{}", s.name, field.name);
      if field.name.trim().is_empty() {
        return Err(malformed(&s.name, "field with an empty name"));
      }
      if !seen.insert(field.name.as_str()) {
        return Err(malformed(&location, "duplicate field name"));
      }
      validate_descriptor(&field.ty, &location)?;
    }
  }

  Ok(())
}

fn validate_descriptor(ty: &TypeDescriptor, location: &str) -> Result<(), LoadError> {
  match (ty.kind.requires_elem(), ty.elem()) {
    (true, None) => return Err(malformed(location, &format!("{:?} requires an elem type", ty.kind))),
    (false, Some(_)) => {
      return Err(malformed(location, &format!("{:?} must not carry an elem type", ty.kind)));
    }
    _ => {}
  }

  match (ty.kind.requires_key(), ty.key()) {
    (true, None) => return Err(malformed(location, "map requires a key type")),
    (false, Some(_)) => {
      return Err(malformed(location, &format!("{:?} must not carry a key type", ty.kind)));
    }
    _ => {}
  }

  if ty.kind == Kind::Struct && ty.name().is_none() {
    return Err(malformed(location, "struct reference without a name"));
  }

  if let Some(key) = ty.key() {
    validate_descriptor(key, &format!("{}.key", location))?;
  }
  if let Some(elem) = ty.elem() {
    validate_descriptor(elem, &format!("{}.elem", location))?;
  }
  Ok(())
}

fn malformed(location: &str, reason: &str) -> LoadError {
  LoadError::Malformed {
    location: location.to_string(),
    reason: reason.to_string(),
  }
}
