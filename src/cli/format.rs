//! Small display helpers shared by the CLI commands.

use jiff::Timestamp;
use jiff::tz::TimeZone;
use uuid::Uuid;

use crate::model::Coordinates;

/// First eight hex digits of an id — enough to paste back as a prefix.
pub(super) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub(super) fn coords(c: Coordinates) -> String {
    format!("{:.4},{:.4}", c.lat, c.lon)
}

/// Calendar date of a timestamp in the reference timezone.
pub(super) fn local_date(tz: &TimeZone, ts: Timestamp) -> String {
    tz.to_datetime(ts).date().to_string()
}

/// Civil datetime of a timestamp in the reference timezone, to the minute.
pub(super) fn local_datetime(tz: &TimeZone, ts: Timestamp) -> String {
    let dt = tz.to_datetime(ts);
    format!("{} {:02}:{:02}", dt.date(), dt.hour(), dt.minute())
}
