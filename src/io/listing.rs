use std::fs;
use std::path::Path;

use crate::error::{Result, ToolError};

/// Lists the delimited exports in `dir`: regular files with a `.csv`
/// extension in any case, sorted by name.
pub fn csv_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(ToolError::MissingInput(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if has_csv_extension(&name) {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

fn has_csv_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_csv_files_are_listed_in_name_order() {
        let dir = tempfile::tempdir().expect("temporary directory");
        for name in ["b.CSV", "a.csv", "notes.txt", "csv"] {
            fs::write(dir.path().join(name), "x").expect("fixture written");
        }
        fs::create_dir(dir.path().join("nested.csv")).expect("directory created");

        let names = csv_files(dir.path()).expect("listing");
        assert_eq!(names, vec!["a.csv".to_string(), "b.CSV".to_string()]);
    }

    #[test]
    fn missing_folder_is_reported() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let missing = dir.path().join("playground");
        assert!(matches!(csv_files(&missing), Err(ToolError::MissingInput(path)) if path == missing));
    }
}
