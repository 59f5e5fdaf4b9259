mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use formlogic_core::{
    build_type_environment, infer_expression_text, parse_expression,
    topological_sort_logic_keys, validate_logic_value, Artifact, FieldMap, LogicSection,
    ValidationIssue,
};
use tracing::debug;

/// Exit code for input that could not be read or understood.
const EXIT_BAD_INPUT: i32 = 2;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Type checker for form and bundle logic expressions.
#[derive(Parser)]
#[command(
    name = "formlogic",
    version,
    about = "Type checker for form and bundle logic expressions"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every expression in an artifact
    Check {
        /// Path to the artifact JSON file
        artifact: PathBuf,
        /// TOML file with a [validate] table
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop at the first issue
        #[arg(long)]
        first_error: bool,
    },

    /// Parse a single expression and print its AST and variables
    Parse {
        /// Expression text
        expression: String,
    },

    /// Print the evaluation order of an artifact's logic keys
    Order {
        /// Path to the artifact JSON file
        artifact: PathBuf,
    },

    /// Infer the type of an expression against an artifact's environment
    Infer {
        /// Path to the artifact JSON file
        artifact: PathBuf,
        /// Expression text
        expression: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            artifact,
            config,
            first_error,
        } => cmd_check(
            &artifact,
            config.as_deref(),
            first_error,
            cli.output,
            cli.quiet,
        ),
        Commands::Parse { expression } => cmd_parse(&expression, cli.output, cli.quiet),
        Commands::Order { artifact } => cmd_order(&artifact, cli.output, cli.quiet),
        Commands::Infer {
            artifact,
            expression,
        } => cmd_infer(&artifact, &expression, cli.output, cli.quiet),
    }
}

fn cmd_check(
    artifact_path: &Path,
    config: Option<&Path>,
    first_error: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let options = match config::load_options(config, first_error) {
        Ok(o) => o,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(EXIT_BAD_INPUT);
        }
    };
    let value = read_json(artifact_path, output, quiet);
    debug!(artifact = %artifact_path.display(), ?options, "checking artifact");

    let report = match validate_logic_value(&value, &options) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("error in '{}': {}", artifact_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(EXIT_BAD_INPUT);
        }
    };

    if !report.is_valid() {
        report_issues(report.issues(), output, quiet);
        process::exit(1);
    }
    if !quiet {
        match output {
            OutputFormat::Text => println!("valid"),
            OutputFormat::Json => println!("{}", serde_json::json!({ "valid": true })),
        }
    }
}

fn report_issues(issues: &[ValidationIssue], output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            eprintln!("invalid: {} issue(s)", issues.len());
            for issue in issues {
                eprintln!("  - {} [{}]", issue, issue.code.as_str());
                if let Some(expr) = &issue.expression {
                    eprintln!("      in: {}", expr);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": false,
                "issues": issues,
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
}

fn cmd_parse(expression: &str, output: OutputFormat, quiet: bool) {
    match parse_expression(expression) {
        Ok(parsed) => match output {
            OutputFormat::Text => {
                println!("ast: {}", parsed.ast);
                let vars: Vec<&str> = parsed.variables.iter().map(String::as_str).collect();
                println!("variables: {}", vars.join(", "));
            }
            OutputFormat::Json => {
                let pretty = serde_json::to_string_pretty(&parsed)
                    .unwrap_or_else(|e| format!("serialization error: {}", e));
                println!("{}", pretty);
            }
        },
        Err(e) => {
            match output {
                _ if quiet => {}
                OutputFormat::Text => {
                    eprintln!("syntax error: {}", e);
                    eprintln!("  {}", expression);
                    eprintln!("  {}^", " ".repeat(e.offset));
                }
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "error": e.message,
                        "offset": e.offset,
                    });
                    eprintln!(
                        "{}",
                        serde_json::to_string_pretty(&json).unwrap_or_default()
                    );
                }
            }
            process::exit(1);
        }
    }
}

fn cmd_order(artifact_path: &Path, output: OutputFormat, quiet: bool) {
    let artifact = load_artifact(artifact_path, output, quiet);
    let empty = LogicSection::new();
    let order = topological_sort_logic_keys(artifact.logic().unwrap_or(&empty));

    match output {
        OutputFormat::Text => {
            println!("sorted: {}", order.sorted.join(", "));
            if !order.cyclic_keys.is_empty() {
                println!("cyclic: {}", order.cyclic_keys.join(", "));
            }
        }
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&order)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
    }
}

fn cmd_infer(artifact_path: &Path, expression: &str, output: OutputFormat, quiet: bool) {
    let artifact = load_artifact(artifact_path, output, quiet);
    let no_fields = FieldMap::new();
    let no_logic = LogicSection::new();
    let env = build_type_environment(
        artifact.fields().unwrap_or(&no_fields),
        artifact.logic().unwrap_or(&no_logic),
    );
    let inferred = match infer_expression_text(expression, &env) {
        Ok(t) => t,
        Err(e) => {
            report_error(&format!("syntax error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Text => {
            println!("type: {}", inferred.ty);
            println!("confidence: {}", inferred.confidence);
        }
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&inferred)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
    }
}

/// Read a JSON file, exiting with [`EXIT_BAD_INPUT`] on failure.
fn read_json(path: &Path, output: OutputFormat, quiet: bool) -> serde_json::Value {
    let src = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(EXIT_BAD_INPUT);
        }
    };
    match serde_json::from_str(&src) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(EXIT_BAD_INPUT);
        }
    }
}

/// Read and deserialize an artifact, exiting with [`EXIT_BAD_INPUT`] on
/// failure.
fn load_artifact(path: &Path, output: OutputFormat, quiet: bool) -> Artifact {
    let value = read_json(path, output, quiet);
    match Artifact::from_json(&value) {
        Ok(a) => a,
        Err(e) => {
            let msg = format!("error in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(EXIT_BAD_INPUT);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
