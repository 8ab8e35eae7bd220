/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use lens_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Half-ULP nudge at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` starts with "0." so keep everything after the zero.
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an amount with a `$` prefix, two decimals and thousands separators.
///
/// # Examples
///
/// ```
/// use lens_core::formatting::format_amount;
///
/// assert_eq!(format_amount(1234.56),  "$1,234.56");
/// assert_eq!(format_amount(0.0),      "$0.00");
/// assert_eq!(format_amount(-9.99),    "$-9.99");
/// ```
pub fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("$-{}", format_number(amount.abs(), 2))
    } else {
        format!("${}", format_number(amount, 2))
    }
}

/// Round `value` to `decimal_places` using half-away-from-zero.
pub fn round_to(value: f64, decimal_places: u32) -> f64 {
    let factor = 10_f64.powi(decimal_places as i32);
    (value * factor).round() / factor
}

/// Period-over-period change in percent, rounded to one decimal.
///
/// A zero previous value yields `0.0` rather than an infinite change.
///
/// # Examples
///
/// ```
/// use lens_core::formatting::percent_change;
///
/// assert_eq!(percent_change(1000.0, 1100.0), 10.0);
/// assert_eq!(percent_change(1100.0, 990.0), -10.0);
/// assert_eq!(percent_change(0.0, 500.0), 0.0);
/// ```
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    round_to((current - previous) / previous * 100.0, 1)
}

/// Signed percent label such as `"+10.0%"` or `"-3.5%"`.
pub fn format_change(change: f64) -> String {
    if change > 0.0 {
        format!("+{:.1}%", change)
    } else if change < 0.0 {
        format!("{:.1}%", change)
    } else {
        "0.0%".to_string()
    }
}

/// Summary label for a multi-select facet.
///
/// * every value selected → `"Todos"`
/// * nothing selected → `"Ninguno"`
/// * otherwise → `"<n> <plural_noun>"`
///
/// # Examples
///
/// ```
/// use lens_core::formatting::summarize;
///
/// assert_eq!(summarize(5, 5, "categorías"), "Todos");
/// assert_eq!(summarize(0, 5, "categorías"), "Ninguno");
/// assert_eq!(summarize(3, 5, "categorías"), "3 categorías");
/// ```
pub fn summarize(selected_count: usize, total_count: usize, plural_noun: &str) -> String {
    if selected_count == total_count {
        "Todos".to_string()
    } else if selected_count == 0 {
        "Ninguno".to_string()
    } else {
        format!("{} {}", selected_count, plural_noun)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
