//! Local file naming for URL entries.
//!
//! The URL basename is the key the existence filter matches on. When the
//! server names the file through Content-Disposition, that name wins for the
//! published artifact.

mod content_disposition;
mod path;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use path::url_basename;
pub use sanitize::sanitize_filename;

/// Name used when neither the URL nor the server yields anything usable.
pub const FALLBACK_FILENAME: &str = "download.bin";

/// The expected local name for `url`: its sanitized basename, or
/// [`FALLBACK_FILENAME`] when the URL has no usable trailing segment.
pub fn local_name(url: &str) -> String {
    url_basename(url)
        .map(|raw| sanitize_filename(&raw))
        .filter(|name| usable(name))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Derives the name under which a finished download is published.
///
/// Prefers the Content-Disposition filename, falling back to [`local_name`].
///
/// - `derive_filename("https://portal.example/img/GTEX-1117F-0126", None)` → `"GTEX-1117F-0126"`
/// - `derive_filename("https://portal.example/img/GTEX-1117F-0126", Some("attachment; filename=\"GTEX-1117F-0126.svs\""))` → `"GTEX-1117F-0126.svs"`
pub fn derive_filename(url: &str, content_disposition: Option<&str>) -> String {
    content_disposition
        .and_then(parse_content_disposition_filename)
        .map(|raw| sanitize_filename(&raw))
        .filter(|name| usable(name))
        .unwrap_or_else(|| local_name(url))
}

fn usable(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".."
}
