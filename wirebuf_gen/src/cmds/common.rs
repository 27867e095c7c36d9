/* Common utilities shared between analyze and codegen commands */

use crate::loader::{SchemaFormat, load_file, load_from_reader};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wirebuf_types::Document;

/* Name used in diagnostics for the stdin document */
pub const STDIN_SOURCE: &str = "<stdin>";

/* A decoded document together with where it came from */
#[derive(Debug, Clone)]
pub struct LoadedDocument {
  pub source: String,
  pub document: Document,
}

/* Install the stderr subscriber; RUST_LOG wins over the verbosity flag */
pub fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  /* A second init (tests driving `run` twice) keeps the first subscriber */
  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(filter)
    .try_init();
}

/* Load every file, or the whole of stdin when no file is given */
pub fn load_documents(
  files: &[PathBuf],
  format: Option<SchemaFormat>,
) -> anyhow::Result<Vec<LoadedDocument>> {
  if files.is_empty() {
    let document = load_from_reader(std::io::stdin().lock(), STDIN_SOURCE, format.unwrap_or_default())
      .context("failed to load schema document from stdin")?;
    return Ok(vec![LoadedDocument {
      source: STDIN_SOURCE.to_string(),
      document,
    }]);
  }

  files
    .iter()
    .map(|path| {
      debug!(path = %path.display(), "loading schema file");
      let document = load_file(path, format)
        .with_context(|| format!("failed to load schema file {}", path.display()))?;
      Ok(LoadedDocument {
        source: path.display().to_string(),
        document,
      })
    })
    .collect()
}

/* `<dir>/<package>.<ext>` */
pub fn output_path(dir: &Path, package: &str, extension: &str) -> PathBuf {
  dir.join(format!("{}.{}", package, extension))
}
