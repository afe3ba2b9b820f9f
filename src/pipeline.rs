//! # Workbook Pipeline
//!
//! Opens a workbook, extracts every worksheet, and only then synthesizes and
//! writes policies, so a structurally broken sheet stops the run before any
//! file is written.
use crate::config::Config;
use crate::error::PolicySheetError;
use crate::error::ResultMessage;
use crate::policy::emitter;
use crate::policy::extractor::extract_action_table;
use crate::policy::extractor::extract_binding_table;
use crate::policy::extractor::ActionTable;
use crate::policy::extractor::Binding;
use crate::policy::extractor::ExtractError;
use crate::policy::synthesizer::synthesize_with;
use crate::policy::warning::Warning;
use crate::policy::warning::Warnings;
use crate::policy::Policy;
use crate::spreadsheet;
use crate::spreadsheet::Criteria;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("output directory '{0}' doesn't exist")]
    OutputDirectoryMissing(PathBuf),
}

/// Tables found in one worksheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedSheet {
    pub name: String,
    pub table: ActionTable,
    pub bindings: Vec<Binding>,
}

/// What extraction made of one worksheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetExtraction {
    Extracted(ExtractedSheet),
    /// The sheet cannot be used; the warnings say why
    Skipped { name: String, warnings: Warnings },
}

/// Policies and warnings of one worksheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetReport {
    pub sheet: String,
    pub policies: Vec<Policy>,
    pub warnings: Warnings,
    /// False when the sheet was skipped and produced no output
    pub extracted: bool,
}

/// Outcome of a whole workbook.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub sheets: Vec<SheetReport>,
}

impl Report {
    pub fn policy_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.policies.len()).sum()
    }

    pub fn has_warnings(&self) -> bool {
        self.sheets.iter().any(|sheet| !sheet.warnings.is_empty())
    }

    /// All warnings as `<b>sheet</b>: message<br>` fragments, sheet by sheet
    pub fn warnings_html(&self) -> String {
        self.sheets
            .iter()
            .map(|sheet| sheet.warnings.to_html(&sheet.sheet))
            .collect()
    }
}

/// Extracts the tables of one worksheet.
///
/// A missing header skips the sheet. Since [`Sheet::grid`] pads every row to
/// the sheet width, a row ending early reads as a row of empty cells rather
/// than as a truncated row.
pub fn extract_sheet(sheet: &Sheet, config: &Config) -> Result<SheetExtraction, ExtractError> {
    let rows = sheet.grid();
    let labels = config.labels();
    match extract_action_table(&rows, &labels) {
        Ok(extracted) => {
            let bindings = extract_binding_table(&rows, extracted.boundary, &labels);
            tracing::debug!(sheet = %sheet.name, bindings = bindings.len(), "extracted sheet");
            Ok(SheetExtraction::Extracted(ExtractedSheet {
                name: sheet.name.to_owned(),
                table: extracted.table,
                bindings,
            }))
        }
        Err(ExtractError::HeaderNotFound { resource, name }) => {
            tracing::warn!(sheet = %sheet.name, "header labels not found, skipping sheet");
            let warnings = [Warning::HeadersNotFound { resource, name }].into_iter().collect();
            Ok(SheetExtraction::Skipped {
                name: sheet.name.to_owned(),
                warnings,
            })
        }
        Err(error) => Err(error),
    }
}

/// Extracts every accepted, non-empty worksheet of a workbook.
pub fn extract_workbook(
    spreadsheet: &mut dyn Spreadsheet,
    config: &Config,
    criteria: &Criteria,
) -> Result<Vec<SheetExtraction>, PolicySheetError> {
    let mut extractions = Vec::new();
    for sheet in spreadsheet.read_sheets(criteria)? {
        if sheet.is_empty() {
            tracing::debug!(sheet = %sheet.name, "skipping empty sheet");
            continue;
        }
        let extraction = extract_sheet(&sheet, config)
            .map_err(PolicySheetError::from)
            .with_prefix(&format!("sheet={}", sheet.name))?;
        extractions.push(extraction);
    }
    Ok(extractions)
}

/// Synthesizes policies for every extracted sheet.
pub fn synthesize_workbook(extractions: Vec<SheetExtraction>, config: &Config) -> Report {
    let sheets = extractions
        .into_iter()
        .map(|extraction| match extraction {
            SheetExtraction::Extracted(sheet) => {
                let synthesis = synthesize_with(&sheet.table, &sheet.bindings, config.registry(), config.binding_alignment);
                SheetReport {
                    sheet: sheet.name,
                    policies: synthesis.policies,
                    warnings: synthesis.warnings,
                    extracted: true,
                }
            }
            SheetExtraction::Skipped { name, warnings } => SheetReport {
                sheet: name,
                policies: Vec::new(),
                warnings,
                extracted: false,
            },
        })
        .collect();
    Report { sheets }
}

/// Reads `file_name`, writes one directory of policy files per extracted sheet
/// under `out_dir`, and reports what was produced.
pub fn parse(file_name: &str, out_dir: &Path, config: &Config, criteria: &Criteria) -> Result<Report, PolicySheetError> {
    if !out_dir.is_dir() {
        Err(ParseError::OutputDirectoryMissing(out_dir.to_owned()))?
    }
    let mut spreadsheet = spreadsheet::open(file_name).with_prefix(&format!("cannot open '{}'", file_name))?;
    let extractions = extract_workbook(spreadsheet.as_mut(), config, criteria)
        .with_prefix(&format!("cannot parse '{}'", spreadsheet.name()))?;
    let report = synthesize_workbook(extractions, config);

    let now = chrono::Local::now().naive_local();
    for sheet in report.sheets.iter().filter(|sheet| sheet.extracted) {
        let directory = emitter::output_directory(out_dir, &sheet.sheet, now);
        emitter::create_output_directory(&directory)?;
        let written = emitter::write_policies(&directory, &sheet.policies)?;
        tracing::info!(sheet = %sheet.sheet, policies = written, directory = %directory.display(), "saved policies");
    }
    Ok(report)
}
