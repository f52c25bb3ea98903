//! Danish display formatting for amounts, dates, CPR numbers and headers.

use chrono::NaiveDate;

use crate::entities::{Appropriation, User};

pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Format an amount in kroner: `1234.5` → `"1.234,50 kr."`.
pub fn cost(amount: f64) -> String {
    format!("{} kr.", number(amount, 2))
}

/// Format with `.` as thousands separator and `,` as decimal mark.
pub fn number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{sign}{grouped},{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn display_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `"-"` for a missing date, as the case views show it.
pub fn display_opt_date(date: Option<NaiveDate>) -> String {
    date.map(display_date).unwrap_or_else(|| "-".to_string())
}

/// `"0101011234"` → `"010101-1234"`. Anything else is returned unchanged.
pub fn cpr(number: &str) -> String {
    let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}", &digits[..6], &digits[6..])
    } else {
        number.to_string()
    }
}

pub fn user_display_name(user: &User) -> String {
    let full = format!("{} {}", user.first_name.trim(), user.last_name.trim());
    let full = full.trim();
    if full.is_empty() {
        user.username.clone()
    } else {
        format!("{full} ({})", user.username)
    }
}

/// Header of the appropriation document, e.g. `"Bevillingsskrivelse 27.24.00-G01-1-26 · Bevilget"`.
pub fn appropriation_header(appropriation: &Appropriation) -> String {
    format!(
        "Bevillingsskrivelse {} · {}",
        appropriation.sbsys_id,
        appropriation.status.label()
    )
}
