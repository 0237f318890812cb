//! Request path resolution
//!
//! Turns an untrusted, client-supplied path into a canonical filesystem path
//! that is guaranteed to stay inside the serving root. Nothing else in the
//! crate is allowed to touch the filesystem with a client string.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors produced while resolving a request path
///
/// All variants end up as a plain 404 at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Canonical target lies outside the serving root
    #[error("path escapes serving root: {}", .0.display())]
    Escape(PathBuf),
    /// Request path cannot name a file (NUL byte, drive prefix, bad encoding)
    #[error("invalid request path: {0}")]
    InvalidPath(String),
    /// Canonicalization failed (missing entry, broken symlink, permission denied)
    #[error("failed to resolve '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    const fn is_escape(&self) -> bool {
        matches!(self, Self::Escape(_))
    }
}

/// Serving root directory
///
/// Built once at startup. If the directory does not exist yet the absolute
/// path is kept as configured and every resolution fails until it appears.
#[derive(Debug, Clone)]
pub struct Root {
    path: PathBuf,
}

impl Root {
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        let path = match std::fs::canonicalize(dir) {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::NotFound => std::path::absolute(dir)?,
            Err(e) => return Err(e),
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dir(&self) -> bool {
        self.path.is_dir()
    }

    /// Canonical form of the root as it exists right now
    async fn canonical(&self) -> Result<PathBuf, ResolveError> {
        fs::canonicalize(&self.path)
            .await
            .map_err(|source| ResolveError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Client-supplied path, split into raw segments
///
/// Empty segments (leading, trailing or repeated `/`) and `.` are dropped.
/// `..` is kept as-is; canonicalization decides where it leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    segments: Vec<OsString>,
    display: String,
}

impl RequestPath {
    /// Decode a percent-encoded URI path
    pub fn decode(raw: &str) -> Result<Self, ResolveError> {
        let bytes: Vec<u8> = percent_encoding::percent_decode_str(raw).collect();
        let display = String::from_utf8_lossy(&bytes).into_owned();
        let mut segments = Vec::new();
        for seg in bytes.split(|b| *b == b'/') {
            if seg.is_empty() || seg == b"." {
                continue;
            }
            if seg.contains(&0) {
                return Err(ResolveError::InvalidPath(display));
            }
            let Some(os) = os_from_bytes(seg.to_vec()) else {
                return Err(ResolveError::InvalidPath(display));
            };
            segments.push(os);
        }
        Ok(Self { segments, display })
    }

    /// Path as the client sent it, decoded for display
    pub fn display(&self) -> &str {
        self.display.trim_matches('/')
    }
}

#[cfg(unix)]
fn os_from_bytes(bytes: Vec<u8>) -> Option<OsString> {
    use std::os::unix::ffi::OsStringExt;
    Some(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn os_from_bytes(bytes: Vec<u8>) -> Option<OsString> {
    String::from_utf8(bytes).ok().map(OsString::from)
}

/// Canonical path proven to be the root or one of its descendants
///
/// Only [`resolve`] constructs this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    root: PathBuf,
}

impl ResolvedPath {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the root, empty for the root itself
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.root).unwrap_or_else(|_| Path::new(""))
    }

    /// Re-check an arbitrary path (e.g. a listed symlink's target) against this root
    pub(crate) fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.root)
    }
}

/// Resolve `request` against `root`, failing closed on anything suspicious
pub async fn resolve(root: &Root, request: &RequestPath) -> Result<ResolvedPath, ResolveError> {
    let canonical_root = root.canonical().await?;

    let mut joined = canonical_root.clone();
    for seg in &request.segments {
        if !is_plain_segment(seg) {
            return Err(ResolveError::InvalidPath(request.display.clone()));
        }
        joined.push(seg);
    }

    let canonical = fs::canonicalize(&joined)
        .await
        .map_err(|source| ResolveError::Io {
            path: joined.clone(),
            source,
        })?;

    // Component-wise comparison: `/srv/files-evil` does not start with `/srv/files`
    if !canonical.starts_with(&canonical_root) {
        return Err(ResolveError::Escape(canonical));
    }

    Ok(ResolvedPath {
        path: canonical,
        root: canonical_root,
    })
}

/// A segment must not be able to replace the path it is pushed onto
fn is_plain_segment(seg: &OsStr) -> bool {
    Path::new(seg)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::ParentDir | Component::CurDir))
}

/// Log a rejected resolution at the right severity
pub fn log_rejection(request: &RequestPath, err: &ResolveError) {
    if err.is_escape() {
        crate::logger::log_warning(&format!(
            "Path traversal attempt blocked: '{}' -> {err}",
            request.display
        ));
    } else {
        crate::logger::log_debug(&format!("Unresolvable path '{}': {err}", request.display));
    }
}
