/* Binary for encoding and decoding messages of a schema without generated code */

use anyhow::Context;
use clap::{Parser as ClapParser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use wirebuf_gen::cmds::common::init_tracing;
use wirebuf_gen::loader::load_file;
use wirebuf_reflect::Codec;

#[derive(ClapParser)]
#[command(name = "wirebuf-reflect")]
#[command(about = "Encode JSON values to wire bytes and decode wire bytes to JSON")]
struct Args {
  #[command(subcommand)]
  command: Command,

  /* Enable debug logging on stderr */
  #[arg(short = 'v', long, global = true)]
  verbose: bool,
}

#[derive(Subcommand)]
enum Command {
  /* Encode a JSON value and print it as hex */
  Encode {
    /* Schema document (JSON or YAML) */
    #[arg(short, long)]
    schema: PathBuf,

    /* Struct to encode */
    #[arg(short, long)]
    type_name: String,

    /* JSON value file; stdin when absent */
    #[arg(short, long)]
    input: Option<PathBuf>,
  },

  /* Decode hex-encoded bytes and print the value as JSON */
  Decode {
    /* Schema document (JSON or YAML) */
    #[arg(short, long)]
    schema: PathBuf,

    /* Struct to decode */
    #[arg(short, long)]
    type_name: String,

    /* Hex payload; stdin when absent */
    #[arg(short = 'x', long)]
    hex: Option<String>,

    /* Pretty print JSON output */
    #[arg(short, long)]
    pretty: bool,
  },
}

fn load_codec(schema: &Path) -> anyhow::Result<Codec> {
  let document =
    load_file(schema, None).with_context(|| format!("failed to load schema {}", schema.display()))?;
  Ok(Codec::new(&document)?)
}

fn read_stdin() -> anyhow::Result<String> {
  let mut text = String::new();
  std::io::stdin().read_to_string(&mut text).context("failed to read stdin")?;
  Ok(text)
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();
  init_tracing(args.verbose);

  match args.command {
    Command::Encode { schema, type_name, input } => {
      let codec = load_codec(&schema)?;
      let text = match input {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?,
        None => read_stdin()?,
      };
      let json: serde_json::Value = serde_json::from_str(&text).context("input is not valid JSON")?;
      let value = codec.value_from_json(&type_name, &json)?;
      let bytes = codec.encode(&type_name, &value)?;
      println!("{}", hex::encode(bytes));
    }

    Command::Decode { schema, type_name, hex: payload, pretty } => {
      let codec = load_codec(&schema)?;
      let text = match payload {
        Some(text) => text,
        None => read_stdin()?,
      };
      let trimmed = text.trim();
      let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed)).context("payload is not valid hex")?;
      let value = codec.decode(&type_name, &bytes)?;
      let json = if pretty {
        serde_json::to_string_pretty(&value)?
      } else {
        serde_json::to_string(&value)?
      };
      println!("{}", json);
    }
  }

  Ok(())
}
