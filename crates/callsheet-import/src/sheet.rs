use callsheet_core::domain::{CellValue, ColumnRef};

/// One named table of a tabular input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Position of the referenced column. Header names compare trimmed and
    /// case-insensitively; `#N` must fall inside the known width.
    pub fn resolve(&self, column: &ColumnRef) -> Option<usize> {
        match column {
            ColumnRef::Header(name) => {
                let wanted = name.trim().to_lowercase();
                self.headers
                    .iter()
                    .position(|header| header.trim().to_lowercase() == wanted)
            }
            ColumnRef::Index(index) => (*index < self.width()).then_some(*index),
        }
    }

    /// Widest of the header row and every data row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn cell(row: &[CellValue], index: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        row.get(index).unwrap_or(EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::Sheet;
    use callsheet_core::domain::{CellValue, ColumnRef};

    fn sheet() -> Sheet {
        let mut sheet = Sheet::new("s", vec![" שם ".to_string(), "Phone".to_string()]);
        sheet.rows.push(vec![
            CellValue::from("Ada"),
            CellValue::from("0501234567"),
            CellValue::from("extra"),
        ]);
        sheet
    }

    #[test]
    fn resolves_headers_and_positions() {
        let sheet = sheet();
        assert_eq!(sheet.resolve(&ColumnRef::Header("שם".to_string())), Some(0));
        assert_eq!(sheet.resolve(&ColumnRef::Header("phone".to_string())), Some(1));
        assert_eq!(sheet.resolve(&ColumnRef::Header("group".to_string())), None);
        assert_eq!(sheet.resolve(&ColumnRef::Index(2)), Some(2));
        assert_eq!(sheet.resolve(&ColumnRef::Index(3)), None);
    }

    #[test]
    fn missing_cells_read_as_empty() {
        let sheet = sheet();
        assert_eq!(Sheet::cell(&sheet.rows[0], 7), &CellValue::Empty);
    }
}
