use chrono::{DateTime, SecondsFormat, Utc};

/// 将 UTC 时间转换为 ISO-8601 / RFC3339（毫秒精度，`Z` 结尾）
pub fn to_iso8601_utc_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_iso8601() -> String {
    to_iso8601_utc_string(&Utc::now())
}

// tracing_subscriber 自定义时间格式：与请求记录中的时间戳格式一致
pub struct RecordTimer;

impl tracing_subscriber::fmt::time::FormatTime for RecordTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", now_iso8601())
    }
}
