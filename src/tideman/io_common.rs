use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Builds stable ballot ids from the file name and a line number, for
/// sources that do not carry their own identifiers.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let name = simplify_file_name(path);
    move |lineno| format!("{}-{:05}", name, lineno)
}
