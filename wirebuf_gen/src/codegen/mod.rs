pub mod csharp;
pub mod csharp_gen;
pub mod rust;
pub mod rust_gen;
pub mod shared;

use thiserror::Error;
use wirebuf_types::Document;

use crate::codegen::shared::builder::IrBuildError;
use crate::codegen::shared::layout::LayoutError;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("layout classification failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("codec IR build failed: {0}")]
    IrBuild(#[from] IrBuildError),
    #[error("failed to render generated code: {0}")]
    Render(#[from] std::fmt::Error),
    #[error("'{location}' cannot be generated for this target: {reason}")]
    Unsupported { location: String, reason: String },
}

/// A target-language back-end rendering one document into source text.
pub trait CodeGenerator {
    /// File extension used when the output is written to a directory.
    fn file_extension(&self) -> &'static str;

    fn generate(&self, document: &Document) -> Result<String, CodegenError>;
}
