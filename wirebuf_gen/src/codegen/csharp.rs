use crate::codegen::csharp_gen::{
  emit_class, emit_constructor, emit_handler_slots, emit_handlers, emit_message_enum,
  emit_runtime_helpers, emit_senders,
};
use crate::codegen::shared::builder::IrBuilder;
use crate::codegen::shared::code::{CodeNode, render, separated};
use crate::codegen::shared::messages::{MessageCatalog, MessageIdAllocator};
use crate::codegen::shared::naming::title;
use crate::codegen::{CodeGenerator, CodegenError};
use tracing::info;
use wirebuf_types::Document;

pub struct CSharpCodeGenerator {
  options: CSharpCodeGeneratorOptions,
}

pub struct CSharpCodeGeneratorOptions {
  pub namespace: String,
  pub client_type: String,
  pub register_method: String,
  pub send_method: String,
}

impl Default for CSharpCodeGeneratorOptions {
  fn default() -> Self {
    Self {
      namespace: "FastNet".to_string(),
      client_type: "FastClient".to_string(),
      register_method: "registHandle".to_string(),
      send_method: "Send".to_string(),
    }
  }
}

impl CSharpCodeGenerator {
  pub fn new(options: CSharpCodeGeneratorOptions) -> Self {
    Self { options }
  }

  /* Build the full code tree of one document */
  pub fn emit_tree(&self, document: &Document) -> Result<Vec<CodeNode>, CodegenError> {
    let codecs = IrBuilder::new(document).build_all()?;
    let catalog = MessageCatalog::build(document, &mut MessageIdAllocator::new());

    let classes = document
      .message_structs()
      .zip(&codecs.types)
      .map(|(def, codec)| vec![emit_class(def, codec)])
      .collect::<Vec<_>>();

    let mut groups = vec![
      vec![CodeNode::line(format!("private {} client;", self.options.client_type))],
      vec![emit_message_enum(&catalog)],
      emit_handler_slots(&catalog),
      vec![emit_constructor(&catalog, &self.options)],
    ];
    groups.extend(emit_handlers(&catalog).into_iter().map(|h| vec![h]));
    groups.extend(emit_senders(&catalog, &self.options).into_iter().map(|s| vec![s]));
    groups.push(emit_runtime_helpers());
    groups.extend(classes);

    let class = CodeNode::block(format!("class {}", title(&document.package)), separated(groups));

    Ok(vec![
      CodeNode::line("using System;"),
      CodeNode::line("using System.Collections.Generic;"),
      CodeNode::line("using System.Text;"),
      CodeNode::Blank,
      CodeNode::block(format!("namespace {}", self.options.namespace), vec![class]),
    ])
  }
}

impl CodeGenerator for CSharpCodeGenerator {
  fn file_extension(&self) -> &'static str {
    "cs"
  }

  fn generate(&self, document: &Document) -> Result<String, CodegenError> {
    let tree = self.emit_tree(document)?;
    let text = render(&tree, "\t")?;
    info!(package = %document.package, bytes = text.len(), "generated C# source");
    Ok(text)
  }
}
