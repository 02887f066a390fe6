use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_utc_rfc3339() -> Result<String, time::error::Format> {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn format_rfc3339(moment: OffsetDateTime) -> Result<String, time::error::Format> {
    moment.replace_nanosecond(0).unwrap_or(moment).format(&Rfc3339)
}
