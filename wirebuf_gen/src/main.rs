use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use wirebuf_gen::cmds;
use wirebuf_gen::cmds::analyze::IrOutputFormat;
use wirebuf_gen::cmds::codegen::GeneratorConfig;
use wirebuf_gen::loader::SchemaFormat;

#[derive(Parser)]
#[command(name = "wirebuf-gen")]
#[command(about = "Message schema to codec code generator", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /* Without a subcommand the tool generates code */
    #[command(flatten)]
    codegen: CodegenArgs,
}

#[derive(Subcommand)]
enum Commands {
    /* Generate codec and dispatch code from schema documents */
    Codegen(CodegenArgs),

    /* Report message IDs, struct sizes and protocol issues */
    Analyze {
        /* Input schema documents; stdin when absent */
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        files: Vec<PathBuf>,

        /* Schema encoding; taken from the file extension when absent */
        #[arg(long = "format", value_enum)]
        format: Option<InputFormat>,

        /* Print the layout IR after analysis */
        #[arg(long = "print-ir")]
        print_ir: bool,

        /* Format to use when printing the layout IR */
        #[arg(long = "ir-format", value_enum, default_value = "json")]
        ir_format: IrOutputFormat,

        /* Print the size/marshal/unmarshal programs of every struct */
        #[arg(long = "print-codec-ir")]
        print_codec_ir: bool,

        /* Enable debug logging on stderr */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
}

#[derive(Args, Default)]
struct CodegenArgs {
    /* Input schema documents; stdin when absent */
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    files: Vec<PathBuf>,

    /* Schema encoding; taken from the file extension when absent */
    #[arg(long = "format", value_enum)]
    format: Option<InputFormat>,

    /* Target language for code generation */
    #[arg(short = 'l', long = "language", value_enum, default_value = "csharp")]
    language: Language,

    /* Output directory; generated code goes to stdout when absent */
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /* C# namespace wrapping the generated module */
    #[arg(long = "namespace")]
    namespace: Option<String>,

    /* C# type of the network client field */
    #[arg(long = "client-type")]
    client_type: Option<String>,

    /* Path of an existing Rust Transport trait to use instead of a generated one */
    #[arg(long = "transport-path")]
    transport_path: Option<String>,

    /* Enable debug logging on stderr */
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
enum Language {
    /* Generate C# code (.cs files) */
    #[default]
    #[value(name = "csharp")]
    CSharp,
    /* Generate Rust code (.rs files) */
    Rust,
}

impl From<Language> for cmds::codegen::Language {
    fn from(lang: Language) -> Self {
        match lang {
            Language::CSharp => cmds::codegen::Language::CSharp,
            Language::Rust => cmds::codegen::Language::Rust,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum InputFormat {
    Json,
    Yaml,
}

impl From<InputFormat> for SchemaFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Json => SchemaFormat::Json,
            InputFormat::Yaml => SchemaFormat::Yaml,
        }
    }
}

fn run_codegen(args: CodegenArgs) -> anyhow::Result<()> {
    cmds::common::init_tracing(args.verbose);
    cmds::codegen::run(
        args.files,
        args.format.map(Into::into),
        args.language.into(),
        args.output_dir,
        GeneratorConfig {
            namespace: args.namespace,
            client_type: args.client_type,
            transport_path: args.transport_path,
        },
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => run_codegen(cli.codegen)?,
        Some(Commands::Codegen(args)) => run_codegen(args)?,
        Some(Commands::Analyze {
            files,
            format,
            print_ir,
            ir_format,
            print_codec_ir,
            verbose,
        }) => {
            cmds::common::init_tracing(verbose);
            cmds::analyze::run(files, format.map(Into::into), print_ir, ir_format, print_codec_ir)?;
        }
    }

    Ok(())
}
