//! Page-initiated downloads.
//!
//! The platform download manager gets the first try; if it refuses, the URL
//! goes to the external handler; if that fails too the user is told.

use portal_platform::{DownloadJob, DownloadService, ExternalHandler, Platform, UiService};
use portal_types::event::DownloadRequest;
use url::Url;

const FALLBACK_STEM: &str = "downloadfile";

pub const MSG_DOWNLOAD_FAILED: &str = "Cannot download file";
pub const MSG_DOWNLOAD_COMPLETE: &str = "Download complete!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Handed to the download manager under this file name.
    Enqueued(String),
    OpenedExternally,
    Failed,
}

/// Best-effort file name for a download.
///
/// `Content-Disposition` wins, then the last URL path segment, then a
/// generic stem. An extension is derived from the MIME type when the name
/// has none.
pub fn guess_file_name(url: &str, content_disposition: Option<&str>, mime: Option<&str>) -> String {
    let name = content_disposition
        .and_then(disposition_file_name)
        .or_else(|| url_file_name(url))
        .map(|n| sanitize(&n))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());

    if name.contains('.') {
        return name;
    }
    match mime.and_then(extension_for_mime) {
        Some(ext) => format!("{name}.{ext}"),
        None if name == FALLBACK_STEM => format!("{name}.bin"),
        None => name,
    }
}

/// Start a download, falling back as needed. Every outcome is reported to
/// the user with a toast.
pub fn start_download(
    platform: &mut dyn Platform,
    request: &DownloadRequest,
    user_agent: &str,
) -> DownloadOutcome {
    let file_name = guess_file_name(
        &request.url,
        request.content_disposition.as_deref(),
        request.mime_type.as_deref(),
    );
    let job = DownloadJob {
        url: request.url.clone(),
        file_name: file_name.clone(),
        mime_type: request.mime_type.clone(),
        user_agent: user_agent.to_string(),
    };

    match platform.enqueue(&job) {
        Ok(()) => {
            log::info!("Download enqueued: {file_name}");
            platform.show_toast(&format!("{}...", job.description()));
            return DownloadOutcome::Enqueued(file_name);
        },
        Err(e) => log::warn!("Download manager refused {}: {e}", request.url),
    }

    match platform.open_external(&request.url) {
        Ok(()) => DownloadOutcome::OpenedExternally,
        Err(e) => {
            log::warn!("External handler failed for {}: {e}", request.url);
            platform.show_toast(MSG_DOWNLOAD_FAILED);
            DownloadOutcome::Failed
        },
    }
}

fn disposition_file_name(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn url_file_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    (!last.is_empty()).then(|| last.to_string())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    Some(match essence.to_ascii_lowercase().as_str() {
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "application/json" => "json",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "text/plain" => "txt",
        "text/html" => "html",
        "text/csv" => "csv",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        _ => return None,
    })
}
