//! French number, money and date formatting, plus the single text
//! normalisation pass every drawn string goes through.

use jiff::civil::Date;

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Replace the no-break spaces produced by French digit grouping (U+202F,
/// U+00A0) and other exotic blanks with an ordinary space. Standard PDF fonts
/// have no glyph for U+202F and viewers render it as garbage.
pub fn normalize_text(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{202F}' | '\u{00A0}' | '\u{2007}' | '\u{2009}' | '\u{200A}' => ' ',
            '\t' => ' ',
            c => c,
        })
        .collect()
}

fn group_thousands(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut groups: Vec<String> = Vec::new();
    while n > 0 {
        let g = n % 1000;
        n /= 1000;
        groups.push(if n > 0 {
            format!("{g:03}")
        } else {
            g.to_string()
        });
    }
    groups.reverse();
    groups.join(" ")
}

/// `1234.5` -> `"1 234,50"`.
pub fn format_amount(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    normalize_text(&format!(
        "{sign}{},{:02}",
        group_thousands(cents / 100),
        cents % 100
    ))
}

/// `1234.5` -> `"1 234,50 €"`.
pub fn format_currency(value: f64) -> String {
    format!("{} €", format_amount(value))
}

/// Up to two decimals, trailing zeros dropped: `12.5` -> `"12,5 %"`.
pub fn format_percent(value: f64) -> String {
    format!("{} %", format_decimal(value))
}

/// Quantities and surfaces: integral values print without decimals.
pub fn format_decimal(value: f64) -> String {
    let hundredths = (value * 100.0).round() as i64;
    let sign = if hundredths < 0 { "-" } else { "" };
    let h = hundredths.unsigned_abs();
    let int = group_thousands(h / 100);
    match h % 100 {
        0 => format!("{sign}{int}"),
        f if f % 10 == 0 => format!("{sign}{int},{}", f / 10),
        f => format!("{sign}{int},{f:02}"),
    }
}

/// `2026-10-01` -> `"1 octobre 2026"`.
pub fn format_date_long(date: Date) -> String {
    let month = MONTHS[(date.month() - 1) as usize];
    format!("{} {} {}", date.day(), month, date.year())
}

/// `delai_execution` -> `"Delai Execution"`.
pub fn titleize(key: &str) -> String {
    key.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join the present, non-blank parts with `sep`.
pub fn join_present<'a>(parts: impl IntoIterator<Item = Option<&'a str>>, sep: &str) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_group_by_thousands() {
        assert_eq!(format_amount(0.0), "0,00");
        assert_eq!(format_amount(999.999), "1 000,00");
        assert_eq!(format_amount(1_234_567.8), "1 234 567,80");
        assert_eq!(format_amount(-42.1), "-42,10");
    }

    #[test]
    fn decimals_drop_trailing_zeros() {
        assert_eq!(format_decimal(3.0), "3");
        assert_eq!(format_decimal(2.5), "2,5");
        assert_eq!(format_decimal(0.25), "0,25");
        assert_eq!(format_percent(100.0), "100 %");
    }

    #[test]
    fn normalizes_narrow_spaces() {
        assert_eq!(normalize_text("1\u{202F}234\u{00A0}€"), "1 234 €");
    }

    #[test]
    fn long_french_dates() {
        assert_eq!(format_date_long(jiff::civil::date(2026, 8, 3)), "3 août 2026");
    }

    #[test]
    fn titleize_snake_case() {
        assert_eq!(titleize("delai_d_execution"), "Delai D Execution");
        assert_eq!(titleize("resiliation"), "Resiliation");
        assert_eq!(titleize("__odd__key"), "Odd Key");
    }

    #[test]
    fn join_skips_missing_and_blank() {
        let s = join_present([Some("A"), None, Some("  "), Some("B")], " - ");
        assert_eq!(s, "A - B");
    }
}
