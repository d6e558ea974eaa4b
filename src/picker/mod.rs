//! Photos Picker sessions: creation, status, item listing and polling.

pub mod client;
pub mod poll;
pub mod types;

pub use client::SessionClient;
pub use poll::{wait_for_selection, PollPolicy, PollStatus};
pub use types::{
    MediaFile, MediaItem, MediaItemsPage, PickerSession, PollingConfig, SessionSnapshot,
    SessionStatus,
};
