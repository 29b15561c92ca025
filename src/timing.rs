use chrono::{Duration, NaiveTime};
use log::warn;

/// Parses an `HH:MM` start time. Missing minutes count as zero; anything
/// unparseable falls back to 09:00.
pub fn parse_start_time(text: &str) -> NaiveTime {
    let trimmed = text.trim();
    let (hours, minutes) = trimmed.split_once(':').unwrap_or((trimmed, ""));
    let parsed = hours.trim().parse::<u32>().ok().and_then(|h| {
        let m = minutes.trim().parse::<u32>().unwrap_or(0);
        NaiveTime::from_hms_opt(h, m, 0)
    });

    parsed.unwrap_or_else(|| {
        if !trimmed.is_empty() {
            warn!("Unparseable start time {trimmed:?}, using 09:00");
        }
        default_start()
    })
}

fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

/// 12-hour clock, unpadded hour, e.g. `9:05 AM`.
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Builds one `start–end` label per period. After the lunch period the
/// clock additionally skips `lunch_minutes`. The clock wraps at midnight.
pub fn generate_labels(
    start: NaiveTime,
    periods_per_day: u32,
    period_minutes: u32,
    lunch_period: Option<u32>,
    lunch_minutes: u32,
) -> Vec<String> {
    let period = Duration::minutes(i64::from(period_minutes));
    let lunch = Duration::minutes(i64::from(lunch_minutes));
    let lunch_period = lunch_period.filter(|p| (1..=periods_per_day).contains(p));

    let mut cursor = start;
    let mut labels = Vec::with_capacity(periods_per_day as usize);
    for p in 1..=periods_per_day {
        let end = cursor + period;
        labels.push(format!("{}–{}", format_clock(cursor), format_clock(end)));
        cursor = end;
        if lunch_period == Some(p) {
            cursor = cursor + lunch;
        }
    }
    labels
}
