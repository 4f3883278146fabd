//! Output formatting
//!
//! Renders validation reports and coding suggestions in the requested format

use colored::*;
use qedit_core::{Coding, ErrorCode, Result, ValidationError, ValidationReport};
use std::path::Path;

use crate::OutputFormat;

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print both validation passes for one file
    pub fn print_report(&self, file: &Path, report: &ValidationReport) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                self.print_report_human(file, report);
                Ok(())
            }
            OutputFormat::Json => self.print_report_json(file, report),
            OutputFormat::Compact => {
                for violation in report.iter() {
                    println!("{}:{}", file.display(), violation);
                }
                Ok(())
            }
        }
    }

    fn print_report_human(&self, file: &Path, report: &ValidationReport) {
        println!("{} {}", "Validating".bold(), file.display());

        if report.is_clean() {
            println!("{} No issues found", "✅".green());
            return;
        }

        print_section("Orphaned references", &report.orphans);
        print_section("Missing translations", &report.translations);

        println!("\n{}", "Summary:".bold());
        println!(
            "  Orphaned references: {}",
            count(report.orphans.len())
        );
        println!(
            "  Missing translations: {}",
            count(report.translations.len())
        );
    }

    fn print_report_json(&self, file: &Path, report: &ValidationReport) -> Result<()> {
        let result = serde_json::json!({
            "file": file.display().to_string(),
            "orphans": report.orphans,
            "translations": report.translations,
            "summary": {
                "orphans": report.orphans.len(),
                "translations": report.translations.len(),
                "total": report.len()
            }
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }

    /// Print terminology suggestions
    pub fn print_codings(&self, codings: &[Coding]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(codings)?);
            }
            OutputFormat::Compact => {
                for coding in codings {
                    println!(
                        "{}|{}|{}",
                        coding.system.as_deref().unwrap_or_default(),
                        coding.code.as_deref().unwrap_or_default(),
                        coding.display.as_deref().unwrap_or_default()
                    );
                }
            }
            OutputFormat::Human => {
                if codings.is_empty() {
                    println!("{} No suggestions", "∅".dimmed());
                }
                for coding in codings {
                    println!(
                        "  {}  {}  {}",
                        coding.code.as_deref().unwrap_or("?").bold(),
                        coding.display.as_deref().unwrap_or_default(),
                        coding.system.as_deref().unwrap_or_default().dimmed()
                    );
                }
            }
        }
        Ok(())
    }
}

fn print_section(title: &str, violations: &[ValidationError]) {
    if violations.is_empty() {
        return;
    }
    println!("\n{}:", title.bold());
    for violation in violations {
        println!("  {} {}", label(violation.code), violation);
    }
}

fn label(code: ErrorCode) -> ColoredString {
    match code {
        ErrorCode::MissingTranslation => "translation".yellow(),
        ErrorCode::IncompleteCoding | ErrorCode::MissingCompanion => "incomplete".yellow(),
        _ => "error".red().bold(),
    }
}

fn count(n: usize) -> ColoredString {
    if n == 0 {
        n.to_string().green()
    } else {
        n.to_string().red()
    }
}
