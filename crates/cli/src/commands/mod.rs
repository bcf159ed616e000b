pub mod album;
pub mod maintenance;
pub mod photo;
pub mod tree;

use chrono::{DateTime, Utc};

pub(crate) fn format_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "\u{2014}".to_string())
}
