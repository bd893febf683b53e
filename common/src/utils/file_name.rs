//! Names for uploaded logo files.

/// Builds storage names for uploaded files.
pub struct FileNameGenerator;

/// Fallback when an upload arrives without a usable name.
const UNNAMED_UPLOAD: &str = "upload";

impl FileNameGenerator {
    /// Name for the `attempt`-th try at storing an upload. The first try is
    /// `<millis>-<name>`; retries insert a counter, as in `<millis>-<attempt>-<name>`.
    pub fn upload_name_attempt(millis: i64, attempt: u32, original: &str) -> String {
        match attempt {
            0 => format!("{}-{}", millis, Self::sanitize(original)),
            n => format!("{}-{}-{}", millis, n, Self::sanitize(original)),
        }
    }

    /// Reduces a client-supplied name to a single safe path component.
    ///
    /// Directory parts are dropped and anything outside `[A-Za-z0-9._-]`
    /// becomes `_`. Leading dots are stripped so the result is never hidden
    /// or a parent reference.
    pub fn sanitize(original: &str) -> String {
        let base = original
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();

        let cleaned: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        let cleaned = cleaned.trim_start_matches('.');
        if cleaned.is_empty() {
            UNNAMED_UPLOAD.to_string()
        } else {
            cleaned.to_string()
        }
    }

    /// Whether a stored name can be joined onto the image directory as is.
    pub fn is_plain(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(|c: char| c == '/' || c == '\\')
            && !name.contains("..")
    }
}
