use std::collections::{HashMap, HashSet};

use crate::model::{Column, Table};

/// Removes newline, carriage-return and tab characters anywhere in each column
/// name and trims surrounding whitespace. Names that collide once cleaned are
/// suffixed apart again. Cells are left untouched.
pub fn normalize(table: &Table) -> Table {
    let names = disambiguate(
        table
            .columns()
            .iter()
            .map(|column| clean_header(&column.name))
            .collect(),
    );
    let columns = names
        .into_iter()
        .zip(table.columns())
        .map(|(name, column)| Column::new(name, column.values.clone()))
        .collect();
    Table::new(columns)
}

pub fn clean_header(name: &str) -> String {
    name.replace(['\n', '\r', '\t'], "").trim().to_string()
}

/// Suffixes repeated names with `.1`, `.2`, ... in order of appearance,
/// skipping suffixes already taken by another column.
pub fn disambiguate(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(names.len());
    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            *count = 1;
            unique.push(name);
            continue;
        }
        let mut candidate = format!("{name}.{count}");
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{name}.{count}");
        }
        *count += 1;
        taken.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;

    fn table(names: &[&str]) -> Table {
        Table::new(
            names
                .iter()
                .map(|name| Column::new(*name, vec![Cell::Text(" v\n".into())]))
                .collect(),
        )
    }

    #[test]
    fn strips_control_characters_and_whitespace() {
        let normalized = normalize(&table(&["  SYMBOL\n", "PREV.\r\n CLOSE", "\tOPEN "]));
        assert_eq!(normalized.column_names(), vec!["SYMBOL", "PREV. CLOSE", "OPEN"]);
    }

    #[test]
    fn cells_are_not_altered() {
        let source = table(&["A\n"]);
        let normalized = normalize(&source);
        assert_eq!(normalized.columns()[0].values, source.columns()[0].values);
    }

    #[test]
    fn headers_equal_after_cleaning_stay_distinct() {
        let source = Table::new(vec![
            Column::new("COMPANY", vec![Cell::Missing]),
            Column::new("COMPANY\n", vec![Cell::Text("x".into())]),
        ]);

        let normalized = normalize(&source);

        assert_eq!(normalized.column_names(), vec!["COMPANY", "COMPANY.1"]);
        assert_eq!(normalized.cell("COMPANY.1", 0), Some(&Cell::Text("x".into())));
    }

    #[test]
    fn suffixes_skip_names_already_in_use() {
        let names = ["A", "A.1", "A"].map(String::from).to_vec();
        assert_eq!(disambiguate(names), vec!["A", "A.1", "A.2"]);
    }

    #[test]
    fn normalizing_twice_equals_normalizing_once() {
        for names in [
            vec!["\n\n", " A \t", "B\r"],
            vec!["", "  ", "x\n y"],
            vec!["COMPANY", "NAME OF\tCOMPANY "],
        ] {
            let once = normalize(&table(&names));
            assert_eq!(normalize(&once), once);
        }
    }
}
