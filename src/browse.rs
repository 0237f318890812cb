//! Directory browsing core
//!
//! Classifies a resolved path as a downloadable file or a listable
//! directory and builds the ordered listing. Everything here works on
//! [`ResolvedPath`] values only; client strings never reach this module.

use crate::http::url::encode_relative;
use crate::logger;
use crate::resolver::ResolvedPath;
use serde::Serialize;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from classifying or listing a resolved path
///
/// Both map to 404 at the HTTP boundary.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Target is neither a regular file nor a directory
    #[error("not a file or directory: {}", .0.display())]
    NotFound(PathBuf),
    #[error("filesystem error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RouteError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    /// Byte length at enumeration time; absent for directories or when the stat raced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub url: String,
}

impl Entry {
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }
}

/// Immediate children of one directory, sorted byte-wise by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Listing {
    entries: Vec<Entry>,
}

impl Listing {
    /// Sort children by their raw file names and keep the entries
    ///
    /// `OsString` ordering is byte-wise on unix: `C.txt` < `a.txt` < `b.txt`.
    fn from_children(mut children: Vec<(OsString, Entry)>) -> Self {
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            entries: children.into_iter().map(|(_, entry)| entry).collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<Entry>) -> Self {
        Self::from_children(
            entries
                .into_iter()
                .map(|e| (OsString::from(&e.name), e))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

/// Identity of an opened file, used to detect a swap between classify and open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileId {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    len: u64,
    #[cfg(not(unix))]
    modified: Option<std::time::SystemTime>,
}

impl FileId {
    #[cfg(unix)]
    pub fn of(meta: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    #[cfg(not(unix))]
    pub fn of(meta: &std::fs::Metadata) -> Self {
        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

/// A regular file ready to be streamed back as an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Canonical path inside the root
    pub path: PathBuf,
    pub file_name: OsString,
    pub len: u64,
    /// The file that was classified; the download must open this same file
    pub id: FileId,
}

/// Outcome of routing a resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Download(DownloadTarget),
    Listing(Listing),
}

/// Builds the reference URLs handed to the presentation layer
pub trait LinkBuilder {
    /// Link that downloads the file at `relative`
    fn download(&self, relative: &Path) -> String;
    /// Link that lists the directory at `relative`
    fn listing(&self, relative: &Path) -> String;
}

/// Default URL layout: `/download/<rel>` for files, `/<rel>` for directories
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteLinks;

pub const DOWNLOAD_PREFIX: &str = "/download";

impl LinkBuilder for RouteLinks {
    fn download(&self, relative: &Path) -> String {
        format!("{DOWNLOAD_PREFIX}{}", encode_relative(relative))
    }

    fn listing(&self, relative: &Path) -> String {
        encode_relative(relative)
    }
}

/// Classify `resolved` and produce a download target or a listing
pub async fn handle(
    resolved: &ResolvedPath,
    links: &impl LinkBuilder,
) -> Result<Routed, RouteError> {
    let path = resolved.path();
    // The canonical path has no symlinks; one appearing here means it was swapped since resolve
    let metadata = fs::symlink_metadata(path)
        .await
        .map_err(|e| RouteError::io(path, e))?;

    if metadata.is_file() {
        let file_name = path
            .file_name()
            .map_or_else(|| OsString::from("download"), ToOwned::to_owned);
        return Ok(Routed::Download(DownloadTarget {
            path: path.to_path_buf(),
            file_name,
            len: metadata.len(),
            id: FileId::of(&metadata),
        }));
    }

    if metadata.is_dir() {
        return list_directory(resolved, links).await.map(Routed::Listing);
    }

    Err(RouteError::NotFound(path.to_path_buf()))
}

/// Enumerate the immediate children of a resolved directory
///
/// Children that vanish or cannot be stat'd mid-enumeration are dropped;
/// only a failure to read the directory itself is an error.
pub async fn list_directory(
    resolved: &ResolvedPath,
    links: &impl LinkBuilder,
) -> Result<Listing, RouteError> {
    let dir = resolved.path();
    let mut read_dir = fs::read_dir(dir).await.map_err(|e| RouteError::io(dir, e))?;

    let mut children: Vec<(OsString, Entry)> = Vec::new();
    while let Some(child) = read_dir
        .next_entry()
        .await
        .map_err(|e| RouteError::io(dir, e))?
    {
        let name = child.file_name();
        match classify_child(resolved, &child.path()).await {
            Some((kind, size)) => {
                let relative = resolved.relative().join(&name);
                let url = match kind {
                    EntryKind::File => links.download(&relative),
                    EntryKind::Directory => links.listing(&relative),
                };
                children.push((
                    name.clone(),
                    Entry {
                        name: name.to_string_lossy().into_owned(),
                        kind,
                        size,
                        url,
                    },
                ));
            }
            None => logger::log_debug(&format!(
                "Skipping listing entry {}",
                child.path().display()
            )),
        }
    }

    Ok(Listing::from_children(children))
}

/// Kind and size of a child, or `None` if it should not be listed
async fn classify_child(resolved: &ResolvedPath, child: &Path) -> Option<(EntryKind, Option<u64>)> {
    let link_meta = fs::symlink_metadata(child).await.ok()?;

    if link_meta.file_type().is_symlink() {
        // Links are listed by what they point at, and only if that stays under the root
        let target = fs::canonicalize(child).await.ok()?;
        if !resolved.contains(&target) {
            return None;
        }
        let meta = fs::metadata(&target).await.ok()?;
        return kind_of(&meta).map(|kind| (kind, file_size(kind, &meta)));
    }

    let kind = kind_of(&link_meta)?;
    let size = match kind {
        EntryKind::File => fs::metadata(child).await.ok().map(|m| m.len()),
        EntryKind::Directory => None,
    };
    Some((kind, size))
}

fn kind_of(meta: &std::fs::Metadata) -> Option<EntryKind> {
    if meta.is_file() {
        Some(EntryKind::File)
    } else if meta.is_dir() {
        Some(EntryKind::Directory)
    } else {
        None
    }
}

fn file_size(kind: EntryKind, meta: &std::fs::Metadata) -> Option<u64> {
    match kind {
        EntryKind::File => Some(meta.len()),
        EntryKind::Directory => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolve, RequestPath, Root};
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn scenario() -> (TempDir, Root) {
        let tmp = TempDir::new().expect("tempdir");
        let files = tmp.path().join("files");
        stdfs::create_dir_all(files.join("docs")).expect("mkdir");
        stdfs::write(files.join("docs/a.txt"), b"0123456789").expect("write");
        stdfs::write(files.join("readme.md"), b"hello").expect("write");
        let root = Root::new(&files).expect("root");
        (tmp, root)
    }

    async fn route(root: &Root, raw: &str) -> Result<Routed, RouteError> {
        let request = RequestPath::decode(raw).expect("decode");
        let resolved = resolve(root, &request).await.expect("resolve");
        handle(&resolved, &RouteLinks).await
    }

    fn listing(routed: Routed) -> Listing {
        match routed {
            Routed::Listing(l) => l,
            Routed::Download(d) => panic!("expected listing, got download of {:?}", d.path),
        }
    }

    #[tokio::test]
    async fn test_root_listing() {
        let (_tmp, root) = scenario();
        let listing = listing(route(&root, "").await.expect("route"));
        assert_eq!(
            listing.entries(),
            &[
                Entry {
                    name: "docs".to_string(),
                    kind: EntryKind::Directory,
                    size: None,
                    url: "/docs".to_string(),
                },
                Entry {
                    name: "readme.md".to_string(),
                    kind: EntryKind::File,
                    size: Some(5),
                    url: "/download/readme.md".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_nested_listing() {
        let (_tmp, root) = scenario();
        let listing = listing(route(&root, "docs").await.expect("route"));
        assert_eq!(
            listing.entries(),
            &[Entry {
                name: "a.txt".to_string(),
                kind: EntryKind::File,
                size: Some(10),
                url: "/download/docs/a.txt".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_file_routes_to_download() {
        let (_tmp, root) = scenario();
        match route(&root, "readme.md").await.expect("route") {
            Routed::Download(target) => {
                assert_eq!(target.file_name, OsString::from("readme.md"));
                assert_eq!(target.len, 5);
                assert!(target.path.ends_with("readme.md"));
            }
            Routed::Listing(_) => panic!("expected download"),
        }
    }

    #[tokio::test]
    async fn test_case_sensitive_byte_order() {
        let tmp = TempDir::new().expect("tempdir");
        for name in ["b.txt", "a.txt", "C.txt"] {
            stdfs::write(tmp.path().join(name), name).expect("write");
        }
        let root = Root::new(tmp.path()).expect("root");
        let listing = listing(route(&root, "").await.expect("route"));
        assert_eq!(listing.names(), vec!["C.txt", "a.txt", "b.txt"]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_sorts_on_raw_name_bytes() {
        use std::os::unix::ffi::OsStrExt;
        let tmp = TempDir::new().expect("tempdir");
        // Raw 0xF0 sorts after U+FFFE (EF BF BE) although its lossy form U+FFFD sorts before
        stdfs::write(tmp.path().join(std::ffi::OsStr::from_bytes(b"\xf0")), b"x").expect("write");
        stdfs::write(tmp.path().join("\u{fffe}"), b"y").expect("write");
        let root = Root::new(tmp.path()).expect("root");
        let listing = listing(route(&root, "").await.expect("route"));
        assert_eq!(listing.names(), vec!["\u{fffe}", "\u{fffd}"]);
    }

    #[tokio::test]
    async fn test_directories_not_grouped() {
        let tmp = TempDir::new().expect("tempdir");
        stdfs::write(tmp.path().join("a.txt"), b"a").expect("write");
        stdfs::create_dir(tmp.path().join("b")).expect("mkdir");
        stdfs::write(tmp.path().join("c.txt"), b"c").expect("write");
        let root = Root::new(tmp.path()).expect("root");
        let listing = listing(route(&root, "").await.expect("route"));
        assert_eq!(listing.names(), vec!["a.txt", "b", "c.txt"]);
    }

    #[tokio::test]
    async fn test_empty_root_lists_nothing() {
        let tmp = TempDir::new().expect("tempdir");
        let root = Root::new(tmp.path()).expect("root");
        let listing = listing(route(&root, "").await.expect("route"));
        assert!(listing.is_empty());
    }

    #[tokio::test]
    async fn test_urls_are_encoded() {
        let tmp = TempDir::new().expect("tempdir");
        stdfs::create_dir(tmp.path().join("my docs")).expect("mkdir");
        stdfs::write(tmp.path().join("my docs/50% off.txt"), b"x").expect("write");
        let root = Root::new(tmp.path()).expect("root");
        let listing = listing(route(&root, "my%20docs").await.expect("route"));
        assert_eq!(listing.entries()[0].url, "/download/my%20docs/50%25%20off.txt");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_broken_and_escaping_symlinks_are_skipped() {
        let (tmp, root) = scenario();
        stdfs::write(tmp.path().join("outside.txt"), b"nope").expect("write");
        std::os::unix::fs::symlink(tmp.path().join("outside.txt"), root.path().join("leak"))
            .expect("symlink");
        std::os::unix::fs::symlink(root.path().join("missing"), root.path().join("dangling"))
            .expect("symlink");
        std::os::unix::fs::symlink(root.path().join("readme.md"), root.path().join("inner"))
            .expect("symlink");

        let listing = listing(route(&root, "").await.expect("route"));
        assert_eq!(listing.names(), vec!["docs", "inner", "readme.md"]);
        assert_eq!(listing.entries()[1].size, Some(5));
        assert_eq!(listing.entries()[1].url, "/download/inner");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_special_files_are_skipped() {
        let tmp = TempDir::new().expect("tempdir");
        stdfs::write(tmp.path().join("plain"), b"p").expect("write");
        let _sock = std::os::unix::net::UnixListener::bind(tmp.path().join("sock")).expect("bind");
        let root = Root::new(tmp.path()).expect("root");
        let listing = listing(route(&root, "").await.expect("route"));
        assert_eq!(listing.names(), vec!["plain"]);
    }

    #[tokio::test]
    async fn test_directory_removed_mid_request() {
        let (_tmp, root) = scenario();
        let request = RequestPath::decode("docs").expect("decode");
        let resolved = resolve(&root, &request).await.expect("resolve");
        stdfs::remove_dir_all(root.path().join("docs")).expect("rmdir");
        let result = handle(&resolved, &RouteLinks).await;
        assert!(matches!(result, Err(RouteError::Io { .. })));
    }

    #[test]
    fn test_json_shape() {
        let entry = Entry {
            name: "docs".to_string(),
            kind: EntryKind::Directory,
            size: None,
            url: "/docs".to_string(),
        };
        let json = serde_json::to_value(&entry).expect("json");
        assert_eq!(
            json,
            serde_json::json!({"name": "docs", "kind": "directory", "url": "/docs"})
        );
    }
}
