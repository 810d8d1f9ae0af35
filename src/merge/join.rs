use std::collections::{HashMap, HashSet};

use crate::model::{Cell, Column, Table};

/// Suffix given to a clashing non-key column from the left operand.
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix given to a clashing non-key column from the right operand.
pub const RIGHT_SUFFIX: &str = "_y";

/// Full outer join of `left` and `right` on `keys`.
///
/// Callers must make sure both operands carry every key column. Left rows
/// come first in their original order, each repeated once per matching right
/// row; right rows that matched nothing follow in their original order with
/// their key values copied into the key columns. Rows whose key has an empty
/// component never match. No deduplication is performed.
pub fn outer_join(left: &Table, right: &Table, keys: &[String]) -> Table {
    let left_keys: Vec<usize> = keys.iter().filter_map(|key| left.position(key)).collect();
    let right_keys: Vec<usize> = keys.iter().filter_map(|key| right.position(key)).collect();

    let left_names: HashSet<&str> = left
        .columns()
        .iter()
        .filter(|column| !keys.contains(&column.name))
        .map(|column| column.name.as_str())
        .collect();
    let right_payload: Vec<usize> = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| !keys.contains(&column.name))
        .map(|(index, _)| index)
        .collect();
    let clashes: HashSet<&str> = right_payload
        .iter()
        .map(|&index| right.columns()[index].name.as_str())
        .filter(|name| left_names.contains(name))
        .collect();

    let mut output: Vec<Column> = left
        .columns()
        .iter()
        .map(|column| {
            let name = if clashes.contains(column.name.as_str()) {
                format!("{}{LEFT_SUFFIX}", column.name)
            } else {
                column.name.clone()
            };
            Column::new(name, Vec::new())
        })
        .collect();
    output.extend(right_payload.iter().map(|&index| {
        let name = &right.columns()[index].name;
        if clashes.contains(name.as_str()) {
            Column::new(format!("{name}{RIGHT_SUFFIX}"), Vec::new())
        } else {
            Column::new(name.clone(), Vec::new())
        }
    }));

    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for row in 0..right.row_count() {
        if let Some(key) = row_key(right, &right_keys, row) {
            index.entry(key).or_default().push(row);
        }
    }

    let left_width = left.column_count();
    let mut matched = vec![false; right.row_count()];

    for row in 0..left.row_count() {
        let partners = row_key(left, &left_keys, row)
            .and_then(|key| index.get(&key))
            .map(Vec::as_slice)
            .unwrap_or_default();

        if partners.is_empty() {
            push_left(&mut output, left, row);
            for column in &mut output[left_width..] {
                column.values.push(Cell::Missing);
            }
            continue;
        }

        for &partner in partners {
            matched[partner] = true;
            push_left(&mut output, left, row);
            push_right(&mut output[left_width..], right, &right_payload, partner);
        }
    }

    for (row, _) in matched.iter().enumerate().filter(|(_, seen)| !**seen) {
        for (column, source) in output[..left_width].iter_mut().zip(left.columns()) {
            let value = match keys.iter().position(|key| *key == source.name) {
                Some(key_index) => right.columns()[right_keys[key_index]].values[row].clone(),
                None => Cell::Missing,
            };
            column.values.push(value);
        }
        push_right(&mut output[left_width..], right, &right_payload, row);
    }

    Table::new(output)
}

fn row_key(table: &Table, positions: &[usize], row: usize) -> Option<Vec<String>> {
    positions
        .iter()
        .map(|&position| table.columns()[position].values[row].key())
        .collect()
}

fn push_left(output: &mut [Column], left: &Table, row: usize) {
    for (column, source) in output.iter_mut().zip(left.columns()) {
        column.values.push(source.values[row].clone());
    }
}

fn push_right(output: &mut [Column], right: &Table, payload: &[usize], row: usize) {
    for (column, &index) in output.iter_mut().zip(payload) {
        column.values.push(right.columns()[index].values[row].clone());
    }
}
