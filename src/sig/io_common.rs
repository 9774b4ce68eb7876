use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Collapses surrounding whitespace in a cell. The form exports are full of
/// stray spaces around the real content.
pub fn clean_cell(cell: &str) -> String {
    cell.trim().to_string()
}
