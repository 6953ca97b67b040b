//! formgen CLI
//!
//! Command-line interface for generating fillable PDF forms from schema sets.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use formgen::{
    default_excluded_keys, lint, load_schema, validate, Coordinator, FileStatus, FormCatalog,
    FormSource, JsonParser, SchemaRegistry, Severity, ValidateError,
};

#[derive(Parser)]
#[command(name = "formgen")]
#[command(about = "Generate fillable PDF forms from JSON Schema sets")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a PDF form into an output directory
    Generate {
        /// Form id
        form: String,

        /// Directory containing schema files
        #[arg(long)]
        schemas: PathBuf,

        /// Output directory
        #[arg(long, short, default_value = ".")]
        output: PathBuf,

        /// Form configuration catalog (JSON), merged over the built-in forms
        #[arg(long)]
        config: Option<PathBuf>,

        /// Report missing pointer targets instead of treating them as empty
        #[arg(long)]
        strict_pointers: bool,
    },

    /// Print the resolved, flattened and cleaned property tree of a form
    Resolve {
        /// Form or schema id
        form: String,

        /// Directory containing schema files
        #[arg(long)]
        schemas: PathBuf,

        /// Form configuration catalog (JSON), merged over the built-in forms
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keys to remove (default: $schema, $id, required, additionalProperties)
        #[arg(long)]
        exclude: Vec<String>,

        /// Only dereference $refs; skip flattening and cleaning
        #[arg(long)]
        refs_only: bool,

        /// Report missing pointer targets instead of treating them as empty
        #[arg(long)]
        strict_pointers: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List schema ids and whether a form configuration exists for them
    List {
        /// Directory containing schema files
        #[arg(long)]
        schemas: PathBuf,

        /// Form configuration catalog (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Lint schema files for errors (syntax, broken refs, ids, cycles)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Validate filled-in form data against a form's schema
    Validate {
        /// Payload file to validate
        payload: PathBuf,

        /// Form or schema id to validate against
        #[arg(long)]
        form: String,

        /// Directory containing schema files
        #[arg(long)]
        schemas: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            form,
            schemas,
            output,
            config,
            strict_pointers,
        } => run_generate(&form, &schemas, &output, config.as_deref(), strict_pointers),

        Commands::Resolve {
            form,
            schemas,
            config,
            exclude,
            refs_only,
            strict_pointers,
            output,
            pretty,
        } => run_resolve(ResolveArgs {
            form,
            schemas,
            config,
            exclude,
            refs_only,
            strict_pointers,
            output,
            pretty,
        }),

        Commands::List { schemas, config } => run_list(&schemas, config.as_deref()),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),

        Commands::Validate {
            payload,
            form,
            schemas,
            json,
        } => run_validate(&payload, &form, &schemas, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_registry(dir: &Path, strict_pointers: bool) -> Result<SchemaRegistry, u8> {
    SchemaRegistry::load_dir(dir)
        .map(|registry| registry.tolerant_pointers(!strict_pointers))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })
}

fn load_catalog(config: Option<&Path>) -> Result<FormCatalog, u8> {
    let mut catalog = FormCatalog::builtin();
    if let Some(path) = config {
        let extra = FormCatalog::from_file(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        catalog.extend(extra);
    }
    Ok(catalog)
}

fn run_generate(
    form: &str,
    schemas: &Path,
    output: &Path,
    config: Option<&Path>,
    strict_pointers: bool,
) -> Result<(), u8> {
    let registry = load_registry(schemas, strict_pointers)?;
    let catalog = load_catalog(config)?;

    let path = Coordinator::new(registry, catalog)
        .generate(form, output)
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    println!("{}", path.display());
    Ok(())
}

struct ResolveArgs {
    form: String,
    schemas: PathBuf,
    config: Option<PathBuf>,
    exclude: Vec<String>,
    refs_only: bool,
    strict_pointers: bool,
    output: Option<PathBuf>,
    pretty: bool,
}

fn run_resolve(args: ResolveArgs) -> Result<(), u8> {
    let registry = load_registry(&args.schemas, args.strict_pointers)?;
    let schema_id = load_catalog(args.config.as_deref())?
        .config(&args.form)
        .schema
        .unwrap_or_else(|| args.form.clone());

    let excluded: BTreeSet<String> = if args.exclude.is_empty() {
        default_excluded_keys()
    } else {
        args.exclude.into_iter().collect()
    };
    let parser = JsonParser::new(&registry).excluded_keys(excluded);
    let tree = if args.refs_only {
        parser.resolve(&schema_id)
    } else {
        parser.parse(&schema_id)
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let value = tree.to_value();
    let json_output = if args.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_list(schemas: &Path, config: Option<&Path>) -> Result<(), u8> {
    let registry = load_registry(schemas, false)?;
    let catalog = load_catalog(config)?;

    for doc in registry.documents() {
        match catalog.get(&doc.id).and_then(|c| c.title.as_deref()) {
            Some(title) => println!("{}\t{}", doc.id, title),
            None => println!("{}\t(unconfigured)", doc.id),
        }
    }
    for (path, reason) in registry.failures() {
        eprintln!("skipped {}: {}", path.display(), reason);
    }
    Ok(())
}

fn run_validate(payload_path: &Path, form: &str, schemas: &Path, json_output: bool) -> Result<(), u8> {
    let payload = load_schema(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;
    let registry = SchemaRegistry::load_dir(schemas).map_err(|e| {
        report_error(json_output, &format!("loading schemas: {}", e));
        e.exit_code() as u8
    })?;

    match validate(&registry, form, &payload) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let json = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
