//! MIME type detection module
//!
//! Returns the Content-Type sent with a download. The attachment
//! disposition decides that the file is saved; the type only helps the
//! client pick a handler afterwards.

use std::path::Path;

/// Get MIME Content-Type for a file path
///
/// # Examples
/// ```
/// use lanshare::http::mime::get_content_type;
/// use std::path::Path;
/// assert_eq!(get_content_type(Path::new("a.png")), "image/png");
/// assert_eq!(get_content_type(Path::new("no_extension")), "application/octet-stream");
/// ```
pub fn get_content_type(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(get_content_type(Path::new("x.json")), "application/json");
        assert_eq!(get_content_type(Path::new("x.mp4")), "video/mp4");
        assert_eq!(get_content_type(Path::new("x.txt")), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            get_content_type(Path::new("x.unknownext")),
            "application/octet-stream"
        );
        assert_eq!(get_content_type(Path::new("Makefile")), "application/octet-stream");
    }
}
