//! File download module
//!
//! Streams a resolved regular file back as an attachment, byte for byte.

use crate::browse::{DownloadTarget, FileId};
use crate::http::{self, mime, Body};
use crate::logger;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::Response;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

/// Serve a download target
///
/// The file is reopened here and must still be the file that was
/// classified, at the same canonical path. A file removed, replaced, or
/// swapped for a symlink since then yields 404.
pub async fn serve_download(target: &DownloadTarget, is_head: bool) -> Response<Body> {
    let (file, len) = match open_verified(target).await {
        Ok(opened) => opened,
        Err(reason) => {
            logger::log_warning(&format!(
                "Refusing download of '{}': {reason}",
                target.path.display()
            ));
            return http::build_404_response(is_head);
        }
    };

    let content_type = mime::get_content_type(&target.path);
    let body = if is_head {
        http::empty()
    } else {
        stream_file(file, len)
    };

    http::build_attachment_response(body, &target.file_name, &content_type, len)
}

/// Open the target and check the handle against what was classified
///
/// Returns the file and the length of what was actually opened.
async fn open_verified(target: &DownloadTarget) -> Result<(File, u64), String> {
    let file = File::open(&target.path)
        .await
        .map_err(|e| format!("open failed: {e}"))?;
    let opened = file
        .metadata()
        .await
        .map_err(|e| format!("stat failed: {e}"))?;
    if !opened.is_file() {
        return Err("no longer a regular file".to_string());
    }
    if FileId::of(&opened) != target.id {
        return Err("file changed since it was resolved".to_string());
    }

    // A symlinked parent swapped in and out around the open shows up here
    let canonical = fs::canonicalize(&target.path)
        .await
        .map_err(|e| format!("canonicalize failed: {e}"))?;
    if canonical != target.path {
        return Err(format!("path now leads to {}", canonical.display()));
    }
    let current = fs::metadata(&canonical)
        .await
        .map_err(|e| format!("stat failed: {e}"))?;
    if FileId::of(&current) != FileId::of(&opened) {
        return Err("opened file is not the file at the path".to_string());
    }

    Ok((file, opened.len()))
}

/// Stream at most `len` bytes so the body never exceeds the announced length
fn stream_file(file: File, len: u64) -> Body {
    let stream = ReaderStream::new(file.take(len)).map_ok(Frame::data);
    StreamBody::new(stream).boxed()
}
