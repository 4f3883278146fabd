//! qedit CLI
//!
//! Command-line driver for the qedit questionnaire engine

mod commands;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use qedit_core::{QeditError, Result, init_tracing};
use std::io;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "qedit")]
#[command(about = "qedit: FHIR Questionnaire editing engine")]
#[command(version = qedit_core::VERSION)]
#[command(
    long_about = "qedit edits, validates and generates FHIR Questionnaire resources.\n\
\n\
Examples:\n  \
qedit validate form.json other.json    # Report orphaned references and missing translations\n  \
qedit generate form.json -o out.json   # Normalize a Questionnaire\n  \
qedit lookup asthma                    # Suggest codings from Bioportal\n  \
qedit lookup --service ucum kilo       # Suggest UCUM units\n  \
qedit bridge                           # Speak the host message protocol on stdio\n  \
qedit config init                      # Create a configuration file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.qeditrc.json/.qeditrc.toml/qedit.yaml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a Questionnaire: orphaned references and missing translations
    #[command(alias = "check")]
    Validate {
        /// Questionnaire JSON files
        #[arg(required = true, help = "Questionnaire resources to validate")]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format for violations")]
        format: OutputFormat,

        /// Skip the translation pass
        #[arg(long, help = "Do not report missing translations")]
        no_translations: bool,
    },

    /// Import a Questionnaire and generate it again
    Generate {
        /// Questionnaire JSON file
        #[arg(help = "Questionnaire resource to read")]
        file: PathBuf,

        /// Output file
        #[arg(short, long, help = "Write the result here instead of stdout")]
        output: Option<PathBuf>,

        /// Add a translation language before generating
        #[arg(long = "add-language", help = "Additional language to add (repeatable)")]
        add_language: Vec<String>,

        /// Single-line JSON
        #[arg(long, help = "Emit compact JSON")]
        compact: bool,
    },

    /// Look up coding suggestions from a terminology service
    Lookup {
        /// Search text
        #[arg(help = "Text to search for")]
        query: String,

        /// Terminology service
        #[arg(short, long, default_value = "bioportal", help = "Service to query")]
        service: Service,

        /// Restrict Bioportal to these ontologies
        #[arg(long = "ontology", help = "Bioportal ontology acronym (repeatable)")]
        ontologies: Vec<String>,

        /// Match labels and synonyms instead of listing concept descendants
        #[arg(long, help = "Text search instead of concept search")]
        text: bool,

        /// Restrict text search to these UMLS semantic types
        #[arg(long = "semantic-type", help = "Semantic type id such as T047 (repeatable)")]
        semantic_types: Vec<String>,

        /// Only exact label matches
        #[arg(long, help = "Require an exact match")]
        exact: bool,

        /// Bioportal API key
        #[arg(long, env = "QEDIT_BIOPORTAL_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format for suggestions")]
        format: OutputFormat,
    },

    /// Run an editor session over newline-delimited JSON on stdin/stdout
    Bridge,

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize a new configuration file
    Init {
        /// Configuration file format
        #[arg(long, default_value = "json", help = "Configuration file format")]
        format: ConfigFormat,

        /// Overwrite existing configuration file
        #[arg(long, help = "Overwrite existing configuration file")]
        force: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(help = "Path to configuration file (default: search for .qeditrc)")]
        path: Option<PathBuf>,
    },

    /// Show the resolved configuration
    Show,

    /// Print the configuration JSON Schema
    Schema,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// One line per entry
    Compact,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Service {
    /// Bioportal ontology search
    Bioportal,
    /// UCUM units via the Clinical Table Search Service
    Ucum,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// TOML configuration format
    Toml,
    /// YAML configuration format
    Yaml,
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| QeditError::internal_error(format!("Failed to create Tokio runtime: {e}")))?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return Ok(());
    }

    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    let log_level = match cli.verbose {
        0 => "qedit=error",
        1 => "qedit=warn",
        2 => "qedit=info",
        3 => "qedit=debug",
        _ => "qedit=trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    match run_command(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("qedit failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

async fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Validate {
            files,
            format,
            no_translations,
        }) => commands::validate_command(files, format, no_translations, cli.config).await,

        Some(Commands::Generate {
            file,
            output,
            add_language,
            compact,
        }) => commands::generate_command(file, output, add_language, compact, cli.config).await,

        Some(Commands::Lookup {
            query,
            service,
            ontologies,
            text,
            semantic_types,
            exact,
            api_key,
            format,
        }) => {
            let request = commands::lookup::LookupRequest {
                query,
                service,
                ontologies,
                semantic_types,
                text,
                exact,
                api_key,
            };
            commands::lookup::lookup_command(request, format, cli.config).await
        }

        Some(Commands::Bridge) => commands::bridge::bridge_command(cli.config).await,

        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { format, force } => {
                commands::config_init_command(format, force).await
            }
            ConfigAction::Validate { path } => commands::config_validate_command(path).await,
            ConfigAction::Show => commands::config_show_command(cli.config).await,
            ConfigAction::Schema => commands::config_schema_command().await,
        },

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("qedit {}", qedit_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                if let Ok(profile) = std::env::var("PROFILE") {
                    println!("  Profile: {profile}");
                }
            } else {
                println!("{}", qedit_core::VERSION);
            }
            Ok(())
        }

        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
