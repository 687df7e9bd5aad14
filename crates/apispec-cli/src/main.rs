//! apispec command line tool.
//!
//! Converts API descriptions between dialects and prints a summary of a
//! normalized document.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use apispec::codec::{self, CONTENT_TYPE_JSON, CONTENT_TYPE_YAML};
use apispec::DialectRegistry;

#[derive(Parser, Debug)]
#[command(name = "apispec", about = "API description normalizer", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an API description to another dialect.
    Convert {
        /// Input description file (YAML or JSON).
        input: String,

        /// Target dialect.
        #[arg(long, default_value = "openapi3")]
        to: String,

        /// Content type of the input; inferred from the file extension
        /// when omitted.
        #[arg(long)]
        content_type: Option<String>,

        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Normalize an API description and print a summary of it.
    Inspect {
        /// Input description file (YAML or JSON).
        input: String,

        /// Content type of the input; inferred from the file extension
        /// when omitted.
        #[arg(long)]
        content_type: Option<String>,
    },
}

fn content_type_for(path: &str, explicit: Option<String>) -> String {
    explicit.unwrap_or_else(|| {
        if Path::new(path).extension().is_some_and(|ext| ext == "json") {
            CONTENT_TYPE_JSON.to_string()
        } else {
            CONTENT_TYPE_YAML.to_string()
        }
    })
}

/// Run the convert command.
fn run_convert(
    input: &str,
    to: &str,
    content_type: Option<String>,
    output: Option<String>,
) -> ExitCode {
    let registry = DialectRegistry::with_default_dialects();
    let content_type = content_type_for(input, content_type);

    let text = match fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", input, e);
            return ExitCode::from(1);
        }
    };

    let spec = match codec::specification_from_str(&registry, &content_type, &text) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    // The output format follows the output file's extension, falling back
    // to the input's content type for stdout.
    let target_content_type = match &output {
        Some(path) => content_type_for(path, None),
        None => content_type,
    };

    let emitted = match codec::specification_to_string(&registry, &target_content_type, to, &spec) {
        Ok(emitted) => emitted,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, emitted) {
                eprintln!("error: failed to write {}: {}", path, e);
                return ExitCode::from(1);
            }
            eprintln!("converted {} to {} ({})", input, path, to);
        }
        None => println!("{}", emitted),
    }

    ExitCode::SUCCESS
}

/// Run the inspect command.
fn run_inspect(input: &str, content_type: Option<String>) -> ExitCode {
    let registry = DialectRegistry::with_default_dialects();
    let content_type = content_type_for(input, content_type);

    let text = match fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", input, e);
            return ExitCode::from(1);
        }
    };

    let root = match codec::decode_document(&content_type, &text) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let dialect = match registry.select(&root) {
        Ok(dialect) => dialect,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let spec = match dialect.build(&root) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    println!("{} {} ({})", spec.title, spec.version, dialect.name());
    if !spec.base_url.is_empty() {
        println!("base url: {}", spec.base_url);
    }
    for endpoint in &spec.endpoints {
        let verbs: Vec<&str> = endpoint
            .methods
            .iter()
            .map(|method| method.verb.as_str())
            .collect();
        println!("  {} [{}]", endpoint.url, verbs.join(", "));
    }
    println!(
        "{} endpoint(s), {} schema node(s), {} security scheme(s)",
        spec.endpoints.len(),
        spec.schemas.len(),
        spec.security_schemes.len()
    );

    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            to,
            content_type,
            output,
        } => run_convert(&input, &to, content_type, output),
        Commands::Inspect {
            input,
            content_type,
        } => run_inspect(&input, content_type),
    }
}
