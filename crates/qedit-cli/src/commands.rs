//! CLI command implementations
//!
//! Document commands (validate, generate) and config management live here;
//! commands that talk to services or streams have their own modules:
//! - commands/lookup.rs - terminology suggestions
//! - commands/bridge.rs - host messaging over stdio

pub mod bridge;
pub mod lookup;

use qedit_core::{
    Action, ConfigLoader, Dispatcher, EditorConfig, Outcome, QeditError, Result, ResultExt,
    Tree, UuidGenerator, generate_json, import_questionnaire, validate,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::output::OutputFormatter;
use crate::{ConfigFormat, OutputFormat};

/// Resolve config: explicit path, or discovery starting next to `near`
pub(crate) fn load_config(config_path: Option<PathBuf>, near: Option<&Path>) -> Result<EditorConfig> {
    let start_dir = near.and_then(|p| match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Some(parent),
        _ => None,
    });
    ConfigLoader::load(config_path.as_deref(), start_dir)
}

fn read_questionnaire(path: &Path) -> Result<Tree> {
    let text = std::fs::read_to_string(path).map_err(|e| QeditError::io_error(path, e))?;
    import_questionnaire(&text, &mut UuidGenerator).map_err(|e| {
        QeditError::import_error(format!("{}: {}", path.display(), e))
    })
}

/// Validate command implementation
///
/// Files that fail to import are reported and skipped; I/O errors abort.
pub async fn validate_command(
    files: Vec<PathBuf>,
    format: OutputFormat,
    no_translations: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    debug!("Validating {} file(s)", files.len());

    let mut config = load_config(config_path, files.first().map(PathBuf::as_path))?;
    if no_translations {
        config.validation.translations = false;
    }

    let formatter = OutputFormatter::new(format);
    let mut failed = false;
    for file in &files {
        let Some(tree) = read_questionnaire(file).recoverable()? else {
            failed = true;
            continue;
        };
        let report = validate(&tree, &config.validation);
        info!(
            items = tree.len(),
            violations = report.len(),
            "Validated {}",
            file.display()
        );
        formatter.print_report(file, &report)?;
        failed |= !report.is_clean();
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Generate command implementation
pub async fn generate_command(
    file: PathBuf,
    output: Option<PathBuf>,
    add_language: Vec<String>,
    compact: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    debug!("Generating from {}", file.display());

    let config = load_config(config_path, Some(&file))?;
    let tree = read_questionnaire(&file)?;

    let mut dispatcher = Dispatcher::new(tree);
    let outcomes = dispatcher.dispatch_all(add_language.iter().map(|language| {
        Action::AddLanguage {
            language: language.clone(),
        }
    }));
    for (language, outcome) in add_language.iter().zip(outcomes) {
        if let Outcome::Rejected(rejection) = outcome {
            warn!("Skipping language '{}': {}", language, rejection);
        }
    }

    let pretty = config.generator.pretty && !compact;
    let json = generate_json(dispatcher.tree(), pretty)?;

    match output {
        Some(path) => {
            std::fs::write(&path, format!("{json}\n")).map_err(|e| QeditError::io_error(&path, e))?;
            println!("✅ Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Config init command implementation
pub async fn config_init_command(format: ConfigFormat, force: bool) -> Result<()> {
    debug!("Initializing configuration file with format: {:?}", format);

    let filename = match format {
        ConfigFormat::Json => ".qeditrc.json",
        ConfigFormat::Toml => ".qeditrc.toml",
        ConfigFormat::Yaml => "qedit.yaml",
    };
    let config_path = PathBuf::from(filename);

    if config_path.exists() && !force {
        error!(
            "Configuration file '{}' already exists. Use --force to overwrite.",
            filename
        );
        return Err(QeditError::config_error(format!(
            "Configuration file '{filename}' already exists"
        )));
    }

    let config = EditorConfig::default();
    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&config)
            .map_err(|e| QeditError::config_error(format!("Failed to serialize JSON: {e}")))?,
        ConfigFormat::Toml => toml::to_string_pretty(&config)
            .map_err(|e| QeditError::config_error(format!("Failed to serialize TOML: {e}")))?,
        ConfigFormat::Yaml => serde_yaml::to_string(&config)
            .map_err(|e| QeditError::config_error(format!("Failed to serialize YAML: {e}")))?,
    };

    std::fs::write(&config_path, content).map_err(|e| QeditError::io_error(&config_path, e))?;

    println!("✅ Created configuration file: {filename}");
    println!("   Edit the file to customize validation and terminology settings.");
    Ok(())
}

/// Config validate command implementation
pub async fn config_validate_command(path: Option<PathBuf>) -> Result<()> {
    debug!("Validating configuration file: {:?}", path);

    match ConfigLoader::load(path.as_deref(), None) {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("   Default language: {}", config.editor.default_language);
            println!("   Default item type: {}", config.editor.default_item_type);
            println!(
                "   Translation checks: {}",
                if config.validation.translations { "on" } else { "off" }
            );
            Ok(())
        }
        Err(e) => {
            error!("❌ Configuration validation failed: {}", e);
            Err(e)
        }
    }
}

/// Config show command implementation
pub async fn config_show_command(config_path: Option<PathBuf>) -> Result<()> {
    let mut config = ConfigLoader::load(config_path.as_deref(), None)?;
    // never echo secrets
    if config.terminology.bioportal.api_key.is_some() {
        config.terminology.bioportal.api_key = Some("***".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Config schema command implementation
pub async fn config_schema_command() -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&EditorConfig::json_schema())?
    );
    Ok(())
}
