//! URL path encoding
//!
//! Builds URL paths from filesystem-relative paths. Each segment is
//! percent-encoded on its own so a `/` inside a name can never introduce
//! a new segment.

use percent_encoding::{percent_encode, AsciiSet, CONTROLS};
use std::ffi::OsStr;
use std::path::{Component, Path};

/// Characters that must be escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Encode one path segment
pub fn encode_segment(name: &OsStr) -> String {
    percent_encode(os_bytes(name).as_ref(), SEGMENT).to_string()
}

/// Encode a root-relative path as `/seg/seg`, or `/` for the empty path
pub fn encode_relative(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if let Component::Normal(name) = component {
            out.push('/');
            out.push_str(&encode_segment(name));
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(unix)]
fn os_bytes(name: &OsStr) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(name.as_bytes())
}

#[cfg(not(unix))]
fn os_bytes(name: &OsStr) -> std::borrow::Cow<'_, [u8]> {
    match name.to_string_lossy() {
        std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
        std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        assert_eq!(encode_relative(Path::new("docs/a.txt")), "/docs/a.txt");
        assert_eq!(encode_relative(Path::new("")), "/");
    }

    #[test]
    fn test_reserved_characters() {
        assert_eq!(
            encode_relative(Path::new("my dir/50%#1?.txt")),
            "/my%20dir/50%25%231%3F.txt"
        );
    }

    #[test]
    fn test_unicode_segment() {
        assert_eq!(encode_segment(OsStr::new("é")), "%C3%A9");
    }

    #[test]
    fn test_decode_round_trip() {
        let encoded = encode_relative(Path::new("a b/c#d"));
        let request = crate::resolver::RequestPath::decode(&encoded).expect("decode");
        assert_eq!(request.display(), "a b/c#d");
    }
}
