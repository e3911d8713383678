//! Event processors.
//!
//! - `NotificationCenter`: receives `NotificationEvent`, delivers
//!   announcements and admin reports

pub mod notification_center;

pub use notification_center::{AnnouncementReport, NotificationCenter, NotifyError};
