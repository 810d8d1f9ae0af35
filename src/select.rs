use crate::model::{Column, Diagnostics, Stage, Table};

/// Projects `table` onto the requested columns that exist, in request order.
///
/// Every requested column that is absent is reported as a warning, as is a
/// name carried by more than one column (the first is kept). When none
/// are present the result is the empty table, which the merge treats as a
/// neutral operand.
pub fn select(
    table: &Table,
    requested: &[String],
    label: &str,
    diagnostics: &mut Diagnostics,
) -> Table {
    let mut columns: Vec<Column> = Vec::new();
    let mut missing = Vec::new();

    for name in requested {
        if columns.iter().any(|column| &column.name == name) {
            continue;
        }
        match table.column(name) {
            Some(column) => columns.push(column.clone()),
            None => missing.push(name.as_str()),
        }
        let copies = table
            .columns()
            .iter()
            .filter(|column| &column.name == name)
            .count();
        if copies > 1 {
            diagnostics.warning(
                Stage::Select,
                format!("{label}: {copies} columns named '{name}', kept the first"),
            );
        }
    }

    for name in &missing {
        diagnostics.warning(
            Stage::Select,
            format!("{label}: missing column '{name}' skipped"),
        );
    }

    if columns.is_empty() {
        return Table::empty();
    }
    Table::new(columns)
}
