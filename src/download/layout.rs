//! Where a picked item lands on disk and which URL fetches its bytes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};

use crate::picker::MediaItem;

/// Base URL suffix for the original image bytes.
pub const IMAGE_SUFFIX: &str = "=d";
/// Base URL suffix for the original video bytes.
pub const VIDEO_SUFFIX: &str = "=dv";
/// Base URL suffix for a 150px square crop.
pub const THUMBNAIL_SUFFIX: &str = "=w150-h150-c";

/// `root/YYYY/MM/label` for the item's creation time, or `now` when the
/// item carries no parseable timestamp.
pub fn destination_dir(root: &Path, item: &MediaItem, now: DateTime<Utc>, label: &str) -> PathBuf {
    let when = item.created_at().unwrap_or(now);
    root.join(format!("{:04}", when.year()))
        .join(format!("{:02}", when.month()))
        .join(label)
}

pub fn download_url(item: &MediaItem) -> String {
    let suffix = if item.is_video() {
        VIDEO_SUFFIX
    } else {
        IMAGE_SUFFIX
    };
    format!("{}{suffix}", item.base_url())
}

/// Local file name: the item's own name reduced to its final path
/// component, or `<id>.jpg` when that leaves nothing usable.
pub fn target_filename(item: &MediaItem) -> String {
    safe_component(item.filename())
        .or_else(|| safe_component(&format!("{}.jpg", item.id)))
        .unwrap_or_else(|| "unnamed.jpg".to_string())
}

fn safe_component(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        name if name.starts_with('.') && name.trim_start_matches('.').is_empty() => None,
        name => Some(name.to_string()),
    }
}
