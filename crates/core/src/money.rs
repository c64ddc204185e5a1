// Ringgit amounts: lenient parsing from export text, display formatting

/// Currency marker stripped on parse and prepended on format.
pub const CURRENCY_MARKER: &str = "RM";

/// Parse an exported amount such as `"RM 1,250,000.00"`.
///
/// Empty, unparseable or non-finite input yields 0.0.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned = raw.replace(CURRENCY_MARKER, "").replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// [`parse_amount`] for a possibly missing cell.
pub fn parse_amount_opt(raw: Option<&str>) -> f64 {
    raw.map(parse_amount).unwrap_or(0.0)
}

/// Format as whole ringgit with thousands separators: `RM 1,250,000`.
///
/// Non-finite input formats as `RM 0`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return format!("{CURRENCY_MARKER} 0");
    }
    let whole = value.round() as i64;
    let digits = group_thousands(whole.unsigned_abs());
    if whole < 0 {
        format!("{CURRENCY_MARKER} -{digits}")
    } else {
        format!("{CURRENCY_MARKER} {digits}")
    }
}

/// Format numeric text. Non-numeric text formats as `RM 0`.
pub fn format_amount_text(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(v) => format_amount(v),
        Err(_) => format_amount(0.0),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
