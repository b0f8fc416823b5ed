use time::{OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description};
use time_tz::{Offset, TimeZone};

/// Date time format for showing when a bill was recorded, e.g. "2025-03-01 09:15".
const LOCAL_DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Format `date_time` in the timezone given by `local_offset`.
pub fn format_local_date_time(date_time: OffsetDateTime, local_offset: UtcOffset) -> String {
    date_time
        .to_offset(local_offset)
        .format(LOCAL_DATE_TIME_FORMAT)
        .unwrap_or_else(|error| {
            tracing::error!("could not format {date_time}: {error}");
            date_time.to_string()
        })
}
