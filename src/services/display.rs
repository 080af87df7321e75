//! Presentation helpers shared by the page views.

use chrono::{DateTime, Datelike, Utc};

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// "1 de mayo de 2024". Unparsable input is returned as-is.
pub fn format_date(raw: &str) -> String {
    let Some(dt) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    format!(
        "{} de {} de {}",
        dt.day(),
        MONTHS[dt.month0() as usize],
        dt.year()
    )
}

pub fn time_ago(raw: &str, now: DateTime<Utc>) -> String {
    let Some(dt) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    let seconds = (now - dt).num_seconds().max(0);

    let plural = |n: i64, one: &str, many: &str| {
        format!("Hace {} {}", n, if n == 1 { one } else { many })
    };
    match seconds {
        s if s < 60 => "Hace un momento".to_string(),
        s if s < 3_600 => plural(s / 60, "minuto", "minutos"),
        s if s < 86_400 => plural(s / 3_600, "hora", "horas"),
        s if s < 30 * 86_400 => plural(s / 86_400, "día", "días"),
        _ => format_date(raw),
    }
}

/// Up to two uppercase initials, one per word.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// Stable avatar color for a name, same hash the browser side used.
pub fn string_to_color(input: &str) -> String {
    let hash = input.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    let mut color = String::from("#");
    for i in 0..3 {
        let value = (hash >> (i * 8)) & 0xFF;
        color.push_str(&format!("{:02x}", value));
    }
    color
}
