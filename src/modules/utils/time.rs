use chrono::{DateTime, Utc};

/// Function to format timestamp as readable date
pub fn format_timestamp(timestamp: u64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Get current Unix timestamp
pub fn get_current_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Current Unix time in milliseconds, used as the leading part of account ids
pub fn get_current_timestamp_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
