use chrono::NaiveDate;

/// Rounded to whole dirhams, e.g. `AED 1,234,568`.
pub fn format_aed(amount: f64) -> String {
    format!("AED {}", group_thousands(amount))
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn format_caption(date: NaiveDate) -> String {
    format!("Data as of {}", date.format("%d %b %Y"))
}

fn group_thousands(amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3 + 1);
    for (index, digit) in rounded.chars().enumerate() {
        if index > 0 && (rounded.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if amount < 0.0 && rounded != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Minimal escaping for text placed into HTML element bodies and attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
