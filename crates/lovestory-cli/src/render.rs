use std::fmt::Write;

use chrono::{Datelike, NaiveDate};
use lovestory_core::api::{CoupleSettings, Notification, SpecialDate, UserProfile};
use lovestory_core::{Couple, CoupleRequest, MediaRecord, PairingState, Timeline};

/// One line per record: type, date, label and link.
pub fn record_line(record: &MediaRecord) -> String {
    let date = record
        .effective_date()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    let mut line = format!("[{:>3}] {:<5} {}  {}", record.id, record.media_type.as_str(), date, record.label());
    if !record.tags.is_empty() {
        let _ = write!(line, "  #{}", record.tags.join(" #"));
    }
    if let Some(url) = &record.download_url {
        let _ = write!(line, "  <{}>", url);
    }
    line
}

pub fn timeline(timeline: &Timeline<'_>) -> String {
    if timeline.is_empty() {
        return "No memories yet.\n".to_string();
    }
    let mut out = String::new();
    for section in timeline.by_year() {
        let _ = writeln!(out, "{}", section.year);
        for (key, records) in &section.months {
            let _ = writeln!(out, "  {} ({})", key.month_name(), records.len());
            for record in records {
                let _ = writeln!(out, "    {}", record_line(record));
            }
        }
    }
    let _ = writeln!(
        out,
        "{} items in {} months",
        timeline.total_records(),
        timeline.len()
    );
    out
}

pub fn memories(today: NaiveDate, groups: &[(i32, Vec<&MediaRecord>)]) -> String {
    let mut out = format!("On this day, {}\n", today.format("%B %-d"));
    if groups.is_empty() {
        out.push_str("  Nothing from earlier years.\n");
        return out;
    }
    for (year, records) in groups {
        let ago = today.year() - year;
        let unit = if ago == 1 { "year" } else { "years" };
        let _ = writeln!(out, "  {} {} ago ({})", ago, unit, year);
        for record in records {
            let _ = writeln!(out, "    {}", record_line(record));
        }
    }
    out
}

pub fn records(records: &[&MediaRecord]) -> String {
    if records.is_empty() {
        return "No matching media.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "{}", record_line(record));
    }
    let _ = writeln!(out, "{} found", records.len());
    out
}

fn request_line(request: &CoupleRequest) -> String {
    let from = request
        .from_user_display_name
        .clone()
        .or_else(|| request.from_user_id.map(|id| format!("user #{id}")))
        .unwrap_or_else(|| "?".to_string());
    let to = request
        .to_user_display_name
        .clone()
        .or_else(|| request.to_user_id.map(|id| format!("user #{id}")))
        .unwrap_or_else(|| "?".to_string());
    format!("request {}: {} -> {}", request.id, from, to)
}

fn couple_lines(couple: &Couple, today: NaiveDate) -> String {
    let (a, b) = couple.names();
    let mut out = format!("Connected: {} & {}\n", a, b);
    if let Some(start) = couple.start_date() {
        let _ = writeln!(out, "Together since {}", start.format("%Y-%m-%d"));
    }
    let _ = writeln!(out, "{} days together", couple.days_together(today));
    out
}

pub fn pairing(state: &PairingState, today: NaiveDate) -> String {
    match state {
        PairingState::Unconnected => {
            "Not connected. Share your invite code or send a request with `lovestory couple request <code>`.\n"
                .to_string()
        }
        PairingState::Disconnected => "The couple has been dissolved.\n".to_string(),
        PairingState::RequestSent(request) => {
            format!("Waiting for an answer: {}\n", request_line(request))
        }
        PairingState::RequestReceived { incoming, sent } => {
            let mut out = String::from("Incoming requests:\n");
            for request in incoming {
                let _ = writeln!(out, "  {}", request_line(request));
            }
            if let Some(request) = sent {
                let _ = writeln!(out, "Waiting for an answer: {}", request_line(request));
            }
            out
        }
        PairingState::Connected(couple) => couple_lines(couple, today),
    }
}

pub fn profile(user: &UserProfile) -> String {
    let mut out = format!("{} (@{}, id {})\n", user.name(), user.username, user.id);
    let fields = [
        ("email", user.email.as_deref()),
        ("birthday", user.birthday.as_deref()),
        ("avatar", user.avatar_url.as_deref()),
        ("invite code", user.invite_code.as_deref()),
    ];
    for (name, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            let _ = writeln!(out, "  {}: {}", name, value);
        }
    }
    match user.couple_id {
        Some(id) => {
            let _ = writeln!(out, "  couple: {}", id);
        }
        None => out.push_str("  couple: none\n"),
    }
    out
}

pub fn special_dates(dates: &[SpecialDate]) -> String {
    if dates.is_empty() {
        return "No special dates.\n".to_string();
    }
    let mut out = String::new();
    for d in dates {
        let date = d
            .calendar_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| d.date.clone());
        let _ = writeln!(out, "[{}] {}  {} ({:?})", d.id, date, d.name, d.kind);
    }
    out
}

pub fn notifications(list: &[Notification]) -> String {
    if list.is_empty() {
        return "No notifications.\n".to_string();
    }
    let mut out = String::new();
    for n in list {
        let mark = if n.read { ' ' } else { '*' };
        let _ = writeln!(out, "{} [{}] {}", mark, n.id, n.content);
    }
    out
}

pub fn settings(settings: &CoupleSettings) -> String {
    let mut out = String::new();
    let fields = [
        ("theme", settings.theme.as_deref()),
        ("font", settings.font.as_deref()),
        ("background type", settings.background_type.as_deref()),
        ("background", settings.background.as_deref()),
        ("background image", settings.background_image.as_deref()),
    ];
    for (name, value) in fields {
        let _ = writeln!(out, "{:<17} {}", format!("{name}:"), value.unwrap_or("-"));
    }
    let notify = match settings.notifications_enabled {
        Some(true) => "on",
        Some(false) => "off",
        None => "-",
    };
    let _ = writeln!(out, "{:<17} {}", "notifications:", notify);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lovestory_core::{group_by_year_month, group_memories_by_year, MediaType};

    fn record(id: i64, date: &str, caption: &str) -> MediaRecord {
        let mut m = MediaRecord::new(id, MediaType::Photo);
        m.media_date = Some(date.to_string());
        m.caption = Some(caption.to_string());
        m
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_line() {
        let mut m = record(7, "2024-06-15", "Beach");
        m.tags = vec!["sea".to_string(), "sun".to_string()];
        assert_eq!(record_line(&m), "[  7] PHOTO 2024-06-15  Beach  #sea #sun");

        let undated = MediaRecord::new(8, MediaType::Video);
        assert_eq!(record_line(&undated), "[  8] VIDEO ----------  #8");
    }

    #[test]
    fn test_timeline_newest_year_first() {
        let list = vec![
            record(1, "2023-03-01", "a"),
            record(2, "2024-01-10", "b"),
            record(3, "2024-02-10", "c"),
        ];
        let out = timeline(&group_by_year_month(&list));
        let y2024 = out.find("2024").unwrap();
        let y2023 = out.find("2023\n").unwrap();
        assert!(y2024 < y2023);
        assert!(out.find("January").unwrap() < out.find("February").unwrap());
        assert!(out.ends_with("3 items in 3 months\n"));

        assert_eq!(timeline(&group_by_year_month(&[])), "No memories yet.\n");
    }

    #[test]
    fn test_memories() {
        let list = vec![record(1, "2023-06-15", "last year"), record(2, "2020-06-15", "long ago")];
        let refs: Vec<&MediaRecord> = list.iter().collect();
        let out = memories(day(2024, 6, 15), &group_memories_by_year(&refs));
        assert!(out.starts_with("On this day, June 15\n"));
        assert!(out.contains("1 year ago (2023)"));
        assert!(out.contains("4 years ago (2020)"));

        let empty = memories(day(2024, 6, 15), &[]);
        assert!(empty.contains("Nothing from earlier years."));
    }

    #[test]
    fn test_pairing_lists_both_directions() {
        let request = |id, from: &str, to: &str| CoupleRequest {
            id,
            from_user_id: None,
            from_user_display_name: Some(from.to_string()),
            from_user_avatar: None,
            to_user_id: None,
            to_user_display_name: Some(to.to_string()),
            to_user_avatar: None,
            status: lovestory_core::couple::RequestStatus::Pending,
            created_at: None,
        };
        let state = PairingState::RequestReceived {
            incoming: vec![request(11, "Binh", "An")],
            sent: Some(request(10, "An", "Chi")),
        };
        let out = pairing(&state, day(2024, 6, 15));
        assert!(out.contains("  request 11: Binh -> An\n"));
        assert!(out.contains("Waiting for an answer: request 10: An -> Chi\n"));
    }

    #[test]
    fn test_pairing_unconnected() {
        let out = pairing(&PairingState::Unconnected, day(2024, 6, 15));
        assert!(out.starts_with("Not connected."));
    }
}
