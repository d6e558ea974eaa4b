//! Date-partitioned local copies of picked media.

pub mod downloader;
pub mod layout;

pub use downloader::{DownloadSummary, Downloader};
