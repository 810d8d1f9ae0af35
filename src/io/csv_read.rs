use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, ToolError};
use crate::headers::disambiguate;
use crate::model::{Cell, Table};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Reads a delimited export with one header row into a [`Table`].
///
/// The file handle lives only for the duration of the call. Rows with more
/// fields than the header are rejected; shorter rows are padded with missing
/// cells.
pub fn read_table(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    read_table_from(file)
}

/// Same as [`read_table`] for any byte source.
pub fn read_table_from<R: Read>(source: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let mut headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix(BYTE_ORDER_MARK) {
            *first = stripped.to_string();
        }
    }
    let headers = disambiguate(headers);
    let expected = headers.len();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > expected {
            return Err(ToolError::RaggedRow {
                line: record.position().map_or(0, |position| position.line()),
                expected,
                found: record.len(),
            });
        }
        rows.push(record.iter().map(Cell::parse).collect());
    }

    Ok(Table::from_rows(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_typed_cells() {
        let table = read_table_from("SYMBOL,OPEN\nTCS,3500.5\nINFY,\n".as_bytes())
            .expect("table read");
        assert_eq!(table.column_names(), vec!["SYMBOL", "OPEN"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell("OPEN", 0), Some(&Cell::Number(3500.5)));
        assert_eq!(table.cell("OPEN", 1), Some(&Cell::Missing));
    }

    #[test]
    fn strips_byte_order_mark_from_first_header() {
        let table = read_table_from("\u{feff}SYMBOL\nTCS\n".as_bytes()).expect("table read");
        assert!(table.has_column("SYMBOL"));
    }

    #[test]
    fn keeps_embedded_control_characters_for_the_normalizer() {
        let table =
            read_table_from("\"SYMBOL \n\",HIGH\nTCS,1\n".as_bytes()).expect("table read");
        assert_eq!(table.column_names(), vec!["SYMBOL \n", "HIGH"]);
    }

    #[test]
    fn repeated_headers_get_numeric_suffixes() {
        let table = read_table_from("A,A,B,A\n1,2,3,4\n".as_bytes()).expect("table read");
        assert_eq!(table.column_names(), vec!["A", "A.1", "B", "A.2"]);
    }

    #[test]
    fn overlong_row_is_a_parse_failure() {
        let result = read_table_from("A,B\n1,2\n1,2,3\n".as_bytes());
        assert!(matches!(
            result,
            Err(ToolError::RaggedRow { line: 3, expected: 2, found: 3 })
        ));
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = read_table_from("".as_bytes()).expect("table read");
        assert!(table.is_empty());
    }
}
