/* Analyze command - report message layout and protocol-level schema issues */

use super::common::{LoadedDocument, load_documents};
use crate::codegen::shared::builder::IrBuilder;
use crate::codegen::shared::layout::DocumentLayout;
use crate::codegen::shared::messages::{MessageCatalog, MessageIdAllocator};
use crate::codegen::shared::serialization::{
  codec_ir_to_json, layout_ir_to_json, layout_ir_to_protobuf, layout_ir_to_yaml,
};
use crate::loader::SchemaFormat;
use clap::ValueEnum;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;
use wirebuf_types::{Document, Kind, Role, TypeDescriptor};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum IrOutputFormat {
  Json,
  Yaml,
  Protobuf,
}

/* Findings that never stop generation */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
  RequestWithoutResponse { struct_name: String },
  ResponseWithoutRequest { struct_name: String },
  DuplicateEndpoint { logical_name: String, role: Role },
  PackageMarker { struct_name: String },
  UnknownStruct { location: String, type_name: String },
}

impl fmt::Display for SchemaIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SchemaIssue::RequestWithoutResponse { struct_name } => {
        write!(f, "request '{}' has no matching response", struct_name)
      }
      SchemaIssue::ResponseWithoutRequest { struct_name } => {
        write!(f, "response '{}' has no matching request", struct_name)
      }
      SchemaIssue::DuplicateEndpoint { logical_name, role } => {
        write!(f, "message '{}' declares more than one {:?} struct", logical_name, role)
      }
      SchemaIssue::PackageMarker { struct_name } => {
        write!(f, "struct '{}' shares the package name and is excluded from generation", struct_name)
      }
      SchemaIssue::UnknownStruct { location, type_name } => {
        write!(f, "'{}' embeds unknown struct '{}'", location, type_name)
      }
    }
  }
}

/* Protocol-level checks over one document */
pub fn find_issues(document: &Document) -> Vec<SchemaIssue> {
  let mut issues = Vec::new();

  for s in &document.structs {
    if s.is_package_marker(&document.package) {
      issues.push(SchemaIssue::PackageMarker {
        struct_name: s.name.clone(),
      });
    }
  }

  /* role -> logical names, counting duplicates */
  let mut seen: HashMap<(Role, &str), usize> = HashMap::new();
  for s in document.message_structs() {
    if let Some(logical_name) = s.logical_name() {
      *seen.entry((s.role(), logical_name)).or_default() += 1;
    }
  }

  let mut reported = HashSet::new();
  for s in document.message_structs() {
    let Some(logical_name) = s.logical_name() else {
      continue;
    };
    let role = s.role();
    if seen.get(&(role, logical_name)).copied().unwrap_or(0) > 1 && reported.insert((role, logical_name)) {
      issues.push(SchemaIssue::DuplicateEndpoint {
        logical_name: logical_name.to_string(),
        role,
      });
    }
    let counterpart = match role {
      Role::Request => Role::Response,
      Role::Response => Role::Request,
      Role::Plain => continue,
    };
    if !seen.contains_key(&(counterpart, logical_name)) {
      issues.push(match role {
        Role::Request => SchemaIssue::RequestWithoutResponse {
          struct_name: s.name.clone(),
        },
        _ => SchemaIssue::ResponseWithoutRequest {
          struct_name: s.name.clone(),
        },
      });
    }
  }

  let known: HashSet<&str> = document.message_structs().map(|s| s.name.as_str()).collect();
  for s in document.message_structs() {
    for field in &s.fields {
      collect_unknown_refs(&field.ty, &format!("{}.{}", s.name, field.name), &known, &mut issues);
    }
  }

  issues
}

fn collect_unknown_refs(
  ty: &TypeDescriptor,
  location: &str,
  known: &HashSet<&str>,
  issues: &mut Vec<SchemaIssue>,
) {
  match (ty.kind, ty.name()) {
    (Kind::Struct, Some(name)) if !known.contains(name) => {
      issues.push(SchemaIssue::UnknownStruct {
        location: location.to_string(),
        type_name: name.to_string(),
      });
    }
    _ => {}
  }
  if let Some(key) = ty.key() {
    collect_unknown_refs(key, location, known, issues);
  }
  if let Some(elem) = ty.elem() {
    collect_unknown_refs(elem, location, known, issues);
  }
}

/* Execute the analyze command */
pub fn run(
  files: Vec<PathBuf>,
  format: Option<SchemaFormat>,
  print_ir: bool,
  ir_format: IrOutputFormat,
  print_codec_ir: bool,
) -> anyhow::Result<()> {
  let documents = load_documents(&files, format)?;

  println!("wirebuf - Schema Analysis");
  println!("=========================");

  for loaded in &documents {
    analyze_document(loaded, print_ir, ir_format, print_codec_ir)?;
  }

  Ok(())
}

fn analyze_document(
  loaded: &LoadedDocument,
  print_ir: bool,
  ir_format: IrOutputFormat,
  print_codec_ir: bool,
) -> anyhow::Result<()> {
  let document = &loaded.document;
  let layout = DocumentLayout::build(document)?;
  let catalog = MessageCatalog::build(document, &mut MessageIdAllocator::new());

  println!("\n[~] Package '{}' ({})", document.package, loaded.source);
  println!("    Service ID: {}", catalog.service_id_name());

  println!("\n[~] Message IDs:");
  if catalog.ids.is_empty() {
    println!("    (none)");
  }
  for (name, id) in &catalog.ids {
    println!("    {:>3}  {}", id, name);
  }

  println!("\n[~] Structs:");
  for (def, struct_layout) in document.message_structs().zip(&layout.structs) {
    let size = match struct_layout.static_width() {
      Some(width) => format!("{} bytes", width),
      None => "variable".to_string(),
    };
    println!("    [*] {} ({:?}, {}, {} field(s))", def.name, def.role(), size, def.fields.len());
  }

  let issues = find_issues(document);
  if issues.is_empty() {
    println!("\n[+] No issues found");
  } else {
    println!("\n[!] {} issue(s) found", issues.len());
    for issue in &issues {
      warn!(package = %document.package, "{}", issue);
      println!("    - {}", issue);
    }
  }

  if print_ir {
    print_layout_ir(&layout, ir_format)?;
  }
  if print_codec_ir {
    let codec = IrBuilder::new(document).build_all()?;
    println!("\n[~] Codec IR (JSON)");
    println!("==================");
    println!("{}", codec_ir_to_json(&codec)?);
  }

  Ok(())
}

fn print_layout_ir(layout: &DocumentLayout, format: IrOutputFormat) -> anyhow::Result<()> {
  match format {
    IrOutputFormat::Json => {
      println!("\n[~] Layout IR (JSON)");
      println!("===================");
      println!("{}", layout_ir_to_json(layout)?);
    }
    IrOutputFormat::Yaml => {
      println!("\n[~] Layout IR (YAML)");
      println!("===================");
      print!("{}", layout_ir_to_yaml(layout)?);
    }
    IrOutputFormat::Protobuf => {
      println!("\n[~] Layout IR (Protobuf)");
      println!("=======================");
      println!("(hex-encoded bytes, IR schema v{})", layout.version);
      println!("{}", hex::encode(layout_ir_to_protobuf(layout)?));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use wirebuf_types::{Field, Kind, StructDef};

  #[test]
  fn clean_ping_schema_has_no_issues() {
    let doc = Document::new(
      "module1",
      vec![
        StructDef::new("PingReq", vec![Field::new("Seq", Kind::Int32)]),
        StructDef::new("PingRsp", vec![Field::new("Seq", Kind::Int32)]),
        StructDef::new("Item", vec![Field::new("Id", Kind::Uint32)]),
      ],
    );
    assert!(find_issues(&doc).is_empty());
  }

  #[test]
  fn unmatched_and_duplicate_endpoints() {
    let doc = Document::new(
      "p",
      vec![
        StructDef::new("LoginReq", vec![]),
        StructDef::new("ChatRsp", vec![]),
        StructDef::new("Login", vec![]).with_role(Role::Request),
      ],
    );
    let issues = find_issues(&doc);
    assert!(issues.contains(&SchemaIssue::RequestWithoutResponse {
      struct_name: "LoginReq".to_string()
    }));
    assert!(issues.contains(&SchemaIssue::ResponseWithoutRequest {
      struct_name: "ChatRsp".to_string()
    }));
    let duplicates = issues
      .iter()
      .filter(|i| matches!(i, SchemaIssue::DuplicateEndpoint { .. }))
      .count();
    assert_eq!(duplicates, 1);
  }

  #[test]
  fn marker_and_unknown_refs() {
    let doc = Document::new(
      "game",
      vec![
        StructDef::new("Game", vec![]),
        StructDef::new(
          "Inventory",
          vec![Field::new(
            "Slots",
            TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::struct_ref("Slot")),
          )],
        ),
      ],
    );
    let issues = find_issues(&doc);
    assert_eq!(
      issues,
      vec![
        SchemaIssue::PackageMarker {
          struct_name: "Game".to_string()
        },
        SchemaIssue::UnknownStruct {
          location: "Inventory.Slots".to_string(),
          type_name: "Slot".to_string()
        },
      ]
    );
    assert!(issues[1].to_string().contains("unknown struct 'Slot'"));
  }
}
