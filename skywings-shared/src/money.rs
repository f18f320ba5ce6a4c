/// Formats integer cents as a dollar amount with thousands separators,
/// e.g. `106220` -> `$1,062.20`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();
    let remainder = abs % 100;

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(22600), "$226.00");
        assert_eq!(format_cents(106220), "$1,062.20");
        assert_eq!(format_cents(367212), "$3,672.12");
        assert_eq!(format_cents(123456789), "$1,234,567.89");
        assert_eq!(format_cents(-5), "-$0.05");
    }
}
