use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag};
use std::io::Cursor;

/// Capture day from the EXIF block of an image, used to pre-fill the media
/// date of an upload. EXIF datetimes carry no zone; the calendar day is taken as-is.
pub fn extract_capture_date(bytes: &[u8]) -> Option<NaiveDate> {
    let reader = Reader::new().read_from_container(&mut Cursor::new(bytes)).ok()?;

    let tags = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

    for tag in &tags {
        if let Some(field) = reader.get_field(*tag, In::PRIMARY) {
            let val = field.display_value().to_string();
            if let Some(dt) = parse_exif_datetime(&val) {
                return Some(dt.date());
            }
        }
    }

    None
}

fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    // display_value() renders "2019-09-19 05:38:57"; raw values use colons
    let cleaned = s.trim().replace(['-', '/'], ":");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    let day = NaiveDate::parse_from_str(cleaned.split(' ').next()?, "%Y:%m:%d").ok()?;
    day.and_hms_opt(0, 0, 0)
}
