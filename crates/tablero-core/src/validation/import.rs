//! Spreadsheet import for attribute definitions.
//!
//! The importable template has the columns Label / Data Type / Filtrable /
//! Requerido. Rows arrive already split into cells (the SPA parses the
//! workbook); this module maps them into `NewAttributeDefinition`s, skipping
//! example placeholder rows and normalizing SI/NO cells to booleans.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::attribute::{AttributeDataType, NewAttributeDefinition};

/// One imported spreadsheet row, cells as submitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportRow {
    pub label: String,
    pub data_type: String,
    #[serde(default)]
    pub filtrable: String,
    #[serde(default)]
    pub requerido: String,
}

/// Result of mapping the rows: definitions ready for bulk insert plus
/// per-row errors for everything malformed. Errors are surfaced, not retried.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ImportOutcome {
    pub definitions: Vec<NewAttributeDefinition>,
    pub skipped_rows: usize,
    pub errors: Vec<String>,
}

/// Labels that are clearly the template's own example rows.
fn is_placeholder(label: &str) -> bool {
    let l = label.trim().to_lowercase();
    l.starts_with("ej:") || l.starts_with("ej.") || l.starts_with("ejemplo")
}

/// Normalize a SI/NO cell. Empty means false.
fn parse_si_no(cell: &str) -> Result<bool, ()> {
    match cell.trim().to_uppercase().as_str() {
        "SI" | "SÍ" | "YES" | "TRUE" | "1" => Ok(true),
        "NO" | "FALSE" | "0" | "" => Ok(false),
        _ => Err(()),
    }
}

/// Map imported rows into the bulk-creation shape.
///
/// Rows whose label looks like an example placeholder are skipped; rows with
/// an empty label, an unknown data type, or a malformed SI/NO cell produce a
/// row-level error. Duplicate derived keys are handled at insert time.
pub fn parse_import_rows(rows: &[ImportRow]) -> Result<ImportOutcome, AppError> {
    if rows.is_empty() {
        return Err(AppError::InvalidInput(
            "The import contains no rows".to_string(),
        ));
    }

    let mut outcome = ImportOutcome::default();
    for (index, row) in rows.iter().enumerate() {
        let line = index + 2; // 1-based, after the header row
        let label = row.label.trim();
        if label.is_empty() {
            outcome.errors.push(format!("Row {}: empty label", line));
            continue;
        }
        if is_placeholder(label) {
            outcome.skipped_rows += 1;
            continue;
        }
        let data_type = match AttributeDataType::parse_import(&row.data_type) {
            Some(dt) => dt,
            None => {
                outcome.errors.push(format!(
                    "Row {}: unknown data type '{}'",
                    line,
                    row.data_type.trim()
                ));
                continue;
            }
        };
        let is_filterable = match parse_si_no(&row.filtrable) {
            Ok(b) => b,
            Err(()) => {
                outcome.errors.push(format!(
                    "Row {}: 'Filtrable' must be SI or NO, got '{}'",
                    line,
                    row.filtrable.trim()
                ));
                continue;
            }
        };
        let is_required = match parse_si_no(&row.requerido) {
            Ok(b) => b,
            Err(()) => {
                outcome.errors.push(format!(
                    "Row {}: 'Requerido' must be SI or NO, got '{}'",
                    line,
                    row.requerido.trim()
                ));
                continue;
            }
        };
        outcome.definitions.push(NewAttributeDefinition {
            label: label.to_string(),
            data_type,
            is_required,
            is_filterable,
            validation_rules: None,
        });
    }

    Ok(outcome)
}

/// Downloadable tabular template matching the importer. The data-type column
/// lists the accepted machine names in an example row.
pub fn template_csv() -> String {
    let mut out = String::new();
    out.push_str("Label,Data Type,Filtrable,Requerido\n");
    out.push_str("Ej: Número de habitaciones,integer,SI,NO\n");
    out.push_str("Ej: Descripción larga,longtext,NO,NO\n");
    out.push_str(
        "# Data Type admite: text | longtext | integer | decimal | boolean | date | text_array | number_array,,,\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, dt: &str, filtrable: &str, requerido: &str) -> ImportRow {
        ImportRow {
            label: label.to_string(),
            data_type: dt.to_string(),
            filtrable: filtrable.to_string(),
            requerido: requerido.to_string(),
        }
    }

    #[test]
    fn test_si_no_normalization() {
        let rows = vec![row("Habitaciones", "integer", "SI", "NO")];
        let out = parse_import_rows(&rows).unwrap();
        assert_eq!(out.definitions.len(), 1);
        assert!(out.definitions[0].is_filterable);
        assert!(!out.definitions[0].is_required);
    }

    #[test]
    fn test_placeholder_rows_skipped() {
        let rows = vec![
            row("Ej: Número de habitaciones", "integer", "SI", "NO"),
            row("Superficie", "decimal", "NO", "SI"),
        ];
        let out = parse_import_rows(&rows).unwrap();
        assert_eq!(out.skipped_rows, 1);
        assert_eq!(out.definitions.len(), 1);
        assert_eq!(out.definitions[0].label, "Superficie");
    }

    #[test]
    fn test_malformed_rows_reported_not_retried() {
        let rows = vec![
            row("", "integer", "SI", "NO"),
            row("Color", "rainbow", "SI", "NO"),
            row("Activo", "boolean", "QUIZAS", "NO"),
        ];
        let out = parse_import_rows(&rows).unwrap();
        assert!(out.definitions.is_empty());
        assert_eq!(out.errors.len(), 3);
    }

    #[test]
    fn test_empty_import_rejected() {
        assert!(parse_import_rows(&[]).is_err());
    }

    #[test]
    fn test_template_matches_importer_columns() {
        let csv = template_csv();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "Label,Data Type,Filtrable,Requerido");
    }
}
