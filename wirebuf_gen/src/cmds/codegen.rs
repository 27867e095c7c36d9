/* Codegen command - generate codec and dispatch code from schema documents */

use super::common::{LoadedDocument, load_documents, output_path};
use crate::codegen::csharp::{CSharpCodeGenerator, CSharpCodeGeneratorOptions};
use crate::codegen::rust::{RustCodeGenerator, RustCodeGeneratorOptions};
use crate::codegen::CodeGenerator;
use crate::loader::SchemaFormat;
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum Language {
  #[default]
  CSharp,
  Rust,
}

/* Back-end knobs exposed on the command line */
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
  pub namespace: Option<String>,
  pub client_type: Option<String>,
  pub transport_path: Option<String>,
}

pub fn generator_for(language: Language, config: &GeneratorConfig) -> Box<dyn CodeGenerator> {
  match language {
    Language::CSharp => {
      let mut options = CSharpCodeGeneratorOptions::default();
      if let Some(namespace) = &config.namespace {
        options.namespace = namespace.clone();
      }
      if let Some(client_type) = &config.client_type {
        options.client_type = client_type.clone();
      }
      Box::new(CSharpCodeGenerator::new(options))
    }
    Language::Rust => Box::new(RustCodeGenerator::new(RustCodeGeneratorOptions {
      transport_path: config.transport_path.clone(),
    })),
  }
}

/* Execute the codegen command */
pub fn run(
  files: Vec<PathBuf>,
  format: Option<SchemaFormat>,
  language: Language,
  output_dir: Option<PathBuf>,
  config: GeneratorConfig,
) -> anyhow::Result<()> {
  let documents = load_documents(&files, format)?;
  let generator = generator_for(language, &config);

  /* Everything is generated before anything is written */
  let outputs = generate_all(generator.as_ref(), &documents)?;

  match output_dir {
    Some(dir) => write_files(&dir, generator.file_extension(), &documents, &outputs),
    None => {
      let stdout = std::io::stdout();
      let mut out = stdout.lock();
      for text in &outputs {
        out.write_all(text.as_bytes()).context("failed to write generated code to stdout")?;
      }
      out.flush()?;
      Ok(())
    }
  }
}

/* One output per document; each document gets its own message ID numbering */
pub fn generate_all(
  generator: &dyn CodeGenerator,
  documents: &[LoadedDocument],
) -> anyhow::Result<Vec<String>> {
  documents
    .iter()
    .map(|loaded| {
      generator
        .generate(&loaded.document)
        .with_context(|| format!("code generation failed for {}", loaded.source))
    })
    .collect()
}

fn write_files(
  dir: &Path,
  extension: &str,
  documents: &[LoadedDocument],
  outputs: &[String],
) -> anyhow::Result<()> {
  std::fs::create_dir_all(dir)
    .with_context(|| format!("failed to create output directory {}", dir.display()))?;

  for (loaded, text) in documents.iter().zip(outputs) {
    let path = output_path(dir, &loaded.document.package, extension);
    std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote generated file");
  }
  Ok(())
}
