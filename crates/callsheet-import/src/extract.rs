use crate::error::{ImportError, Result};
use crate::sheet::Sheet;
use callsheet_core::domain::{
    is_real_name, CellValue, ColumnRef, RawImportRow, SchemaOrigin, SheetAliases, SheetSchema,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractReport {
    pub sheets_read: usize,
    pub alias_duplicates_skipped: usize,
    pub unbindable_sheets_skipped: usize,
    pub blank_rows: usize,
    pub unreal_name_dropped: usize,
    pub missing_phone_dropped: usize,
    pub rows_out: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub rows: Vec<RawImportRow>,
    pub report: ExtractReport,
    pub warnings: Vec<String>,
}

/// Turns sheets into raw import rows using the configured schemas, falling
/// back to the default header guesses per sheet.
pub struct Extractor<'a> {
    aliases: &'a SheetAliases,
    schemas: &'a [SheetSchema],
}

struct BoundColumns {
    name: Vec<usize>,
    phone: Vec<usize>,
    group: Vec<usize>,
}

impl<'a> Extractor<'a> {
    pub fn new(aliases: &'a SheetAliases, schemas: &'a [SheetSchema]) -> Self {
        Self { aliases, schemas }
    }

    pub fn extract(&self, sheets: &[Sheet]) -> Result<Extraction> {
        let mut extraction = Extraction::default();
        let mut processed: HashSet<&str> = HashSet::new();

        for sheet in sheets {
            let canonical = self.aliases.canonical(&sheet.name);
            if canonical.is_empty() {
                return Err(ImportError::Parse("sheet with an empty name".to_string()));
            }
            if !processed.insert(canonical) {
                extraction.report.alias_duplicates_skipped += 1;
                let message = format!(
                    "sheet {} skipped: same data as already imported sheet {}",
                    sheet.name, canonical
                );
                warn!(sheet = %sheet.name, canonical, "duplicate sheet skipped");
                extraction.warnings.push(message);
                continue;
            }

            let schema = self
                .schemas
                .iter()
                .find(|schema| schema.sheet == canonical)
                .cloned()
                .unwrap_or_else(|| SheetSchema::default_for(canonical));
            let Some(columns) = bind(sheet, &schema)? else {
                extraction.report.unbindable_sheets_skipped += 1;
                warn!(sheet = %sheet.name, "no name or phone column, sheet skipped");
                extraction.warnings.push(format!(
                    "sheet {} skipped: no name or phone column",
                    sheet.name
                ));
                continue;
            };

            extraction.report.sheets_read += 1;
            let before = extraction.rows.len();
            for row in &sheet.rows {
                if row.iter().all(CellValue::is_blank) {
                    extraction.report.blank_rows += 1;
                    continue;
                }
                let Some(name) = first_real_name(row, &columns.name) else {
                    extraction.report.unreal_name_dropped += 1;
                    continue;
                };
                let Some(phone) = first_text(row, &columns.phone) else {
                    extraction.report.missing_phone_dropped += 1;
                    continue;
                };
                extraction.rows.push(RawImportRow {
                    name,
                    phone,
                    group: first_text(row, &columns.group),
                    source_sheet: canonical.to_string(),
                });
            }
            debug!(
                sheet = canonical,
                rows = extraction.rows.len() - before,
                "sheet extracted"
            );
        }

        extraction.report.rows_out = extraction.rows.len();
        Ok(extraction)
    }
}

/// Resolves the schema against the sheet. `Ok(None)` means a default schema
/// found no name or phone column; configured schemas must bind fully.
fn bind(sheet: &Sheet, schema: &SheetSchema) -> Result<Option<BoundColumns>> {
    match schema.origin {
        SchemaOrigin::Configured => {
            let strict = |columns: &[ColumnRef]| -> Result<Vec<usize>> {
                columns
                    .iter()
                    .map(|column| {
                        sheet.resolve(column).ok_or_else(|| {
                            ImportError::Parse(format!(
                                "sheet {}: column {} not found",
                                sheet.name, column
                            ))
                        })
                    })
                    .collect()
            };
            Ok(Some(BoundColumns {
                name: strict(&schema.name)?,
                phone: strict(&schema.phone)?,
                group: strict(&schema.group)?,
            }))
        }
        SchemaOrigin::Default => {
            let lenient = |columns: &[ColumnRef]| -> Vec<usize> {
                columns
                    .iter()
                    .filter_map(|column| sheet.resolve(column))
                    .collect()
            };
            let columns = BoundColumns {
                name: lenient(&schema.name),
                phone: lenient(&schema.phone),
                group: lenient(&schema.group),
            };
            if columns.name.is_empty() || columns.phone.is_empty() {
                return Ok(None);
            }
            Ok(Some(columns))
        }
    }
}

fn first_real_name(row: &[CellValue], columns: &[usize]) -> Option<String> {
    columns
        .iter()
        .filter_map(|index| Sheet::cell(row, *index).to_text())
        .find(|name| is_real_name(name))
}

fn first_text(row: &[CellValue], columns: &[usize]) -> Option<String> {
    columns
        .iter()
        .find_map(|index| Sheet::cell(row, *index).to_text())
}
