//! Filename sanitization for files that must open on Linux and Windows alike.

/// Longest name accepted by common filesystems (Linux NAME_MAX, in bytes).
const NAME_MAX: usize = 255;

/// Makes `name` safe to use as a single path component.
///
/// - Path separators, Windows-reserved punctuation and control characters become `_`
/// - Runs of replaced characters collapse into one `_`
/// - Leading dots, spaces and underscores are dropped (no hidden files)
/// - Trailing dots and spaces are dropped
/// - The result is cut to 255 bytes on a char boundary
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_replacement = false;

    for c in name.chars() {
        if is_forbidden(c) {
            if !in_replacement {
                out.push('_');
            }
            in_replacement = true;
        } else {
            out.push(c);
            in_replacement = false;
        }
    }

    let trimmed = out
        .trim_start_matches(['.', ' ', '_'])
        .trim_end_matches(['.', ' ']);

    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}
