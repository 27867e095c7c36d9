use crate::codegen::rust_gen::helpers::module_name;
use crate::codegen::rust_gen::{
  check_supported, emit_client, emit_codec_impl, emit_handlers, emit_message_enum, emit_runtime,
  emit_service_id, emit_struct, emit_transport,
};
use crate::codegen::shared::builder::IrBuilder;
use crate::codegen::shared::code::{CodeNode, render, separated};
use crate::codegen::shared::messages::{MessageCatalog, MessageIdAllocator};
use crate::codegen::{CodeGenerator, CodegenError};
use tracing::info;
use wirebuf_types::Document;

pub struct RustCodeGenerator {
  options: RustCodeGeneratorOptions,
}

#[derive(Default)]
pub struct RustCodeGeneratorOptions {
  /* Path of an existing Transport trait; a local one is emitted when absent */
  pub transport_path: Option<String>,
}

impl RustCodeGenerator {
  pub fn new(options: RustCodeGeneratorOptions) -> Self {
    Self { options }
  }

  pub fn emit_tree(&self, document: &Document) -> Result<Vec<CodeNode>, CodegenError> {
    for def in document.message_structs() {
      check_supported(def)?;
    }
    let codecs = IrBuilder::new(document).build_all()?;
    let catalog = MessageCatalog::build(document, &mut MessageIdAllocator::new());

    let mut groups = vec![
      vec![
        CodeNode::line("use std::cell::RefCell;"),
        CodeNode::line("use std::rc::Rc;"),
      ],
      emit_runtime(),
      emit_message_enum(&catalog),
      vec![emit_service_id(&catalog)],
      emit_transport(self.options.transport_path.as_deref()),
      emit_handlers(&catalog),
      emit_client(&catalog),
    ];

    for (def, codec) in document.message_structs().zip(&codecs.types) {
      let mut group = emit_struct(def);
      group.push(CodeNode::Blank);
      group.push(emit_codec_impl(codec));
      groups.push(group);
    }

    Ok(vec![
      CodeNode::line(format!("/* Generated by wirebuf-gen from package '{}' */", document.package)),
      CodeNode::Blank,
      CodeNode::line(
        "#[allow(dead_code, unused_imports, unused_mut, unused_variables, unused_assignments, non_camel_case_types, non_snake_case, clippy::all)]",
      ),
      CodeNode::block(format!("pub mod {}", module_name(&document.package)), separated(groups)),
    ])
  }
}

impl CodeGenerator for RustCodeGenerator {
  fn file_extension(&self) -> &'static str {
    "rs"
  }

  fn generate(&self, document: &Document) -> Result<String, CodegenError> {
    let tree = self.emit_tree(document)?;
    let text = render(&tree, "    ")?;
    info!(package = %document.package, bytes = text.len(), "generated Rust source");
    Ok(text)
  }
}
