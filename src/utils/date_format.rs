use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Parses the timestamps QuickBooks places in `MetaData` and on response
/// envelopes, e.g. `2015-07-24T10:33:39-07:00` or `2013-04-03T10:36:19.393Z`.
pub fn parse_datetime(datetime_str: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(datetime_str.trim(), &Rfc3339)
        .map_err(|e| format!("Failed to parse datetime '{datetime_str}': {e}"))
}
