//! Object naming for uploaded media.
//!
//! Uploads land at `videos/{uploaderId}/{timestamp}_{filename}` so one
//! uploader's objects group together and repeated uploads of the same file
//! never collide.

use chrono::{DateTime, Utc};

/// Build the object name for an uploaded video file.
pub fn video_object_name(uploader_id: &str, filename: &str, uploaded_at: DateTime<Utc>) -> String {
    format!(
        "videos/{}/{}_{}",
        uploader_id,
        uploaded_at.timestamp_millis(),
        sanitize_filename(filename)
    )
}

/// Build the object name for a video thumbnail.
pub fn thumbnail_object_name(
    uploader_id: &str,
    filename: &str,
    uploaded_at: DateTime<Utc>,
) -> String {
    format!(
        "thumbnails/{}/{}_{}",
        uploader_id,
        uploaded_at.timestamp_millis(),
        sanitize_filename(filename)
    )
}

/// Strip path separators and control characters from a client-supplied
/// filename; the object name layout must stay flat under the user prefix.
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
