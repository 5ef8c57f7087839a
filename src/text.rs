//! Text helpers: runtime template filling, caption number formatting, and
//! width estimates used when laying out annotations and tick labels.

use num_format::{Locale, ToFormattedString};

/// Replace each `{}` in `template`, left to right, with the next argument.
/// Surplus placeholders stay as `{}`; surplus arguments are dropped.
pub fn fill_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16 * args.len());
    let mut rest = template;
    let mut args = args.iter();
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(a) => out.push_str(a),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// Format with `sig` significant digits in "general" style: fixed notation
/// while the exponent lies in `[-4, sig - 1)` (keeping at least one decimal),
/// scientific otherwise. Trailing zeros are dropped.
///
/// `format_general(12.3456, 3)` is `"12.3"`, `format_general(12.3, 2)` is `"1.2e+01"`.
pub fn format_general(value: f64, sig: usize) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let sig = sig.max(1);
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    let sci = format!("{:.*e}", sig - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if exp < -4 || exp >= sig as i32 - 1 {
        let m = trim_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{m}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (sig as i32 - 1 - exp).max(0) as usize;
        let fixed = trim_zeros(&format!("{:.*}", decimals, value));
        if fixed.contains('.') {
            fixed
        } else {
            format!("{fixed}.0")
        }
    }
}

fn trim_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// `fraction` as a percentage with `decimals` places: `format_percent(0.95, 0)` is `"95%"`.
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, fraction * 100.0)
}

/// Label for the back-transformed scale of a log effect: a leading `ln`
/// is dropped ("lnRR" reads "RR"), anything else is wrapped as `exp(...)`.
pub fn exponential_label(label: &str) -> String {
    match label.strip_prefix("ln") {
        Some(rest) if !rest.trim().is_empty() => rest.trim_start().to_string(),
        _ => format!("exp({label})"),
    }
}

/// Thousands-separated count, e.g. `10,000`.
pub fn format_count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Wrap text to fit within a maximum pixel width, breaking on word boundaries.
/// Existing line breaks are kept.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.lines() {
        let mut cur = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if cur.is_empty() {
                word.to_string()
            } else {
                format!("{cur} {word}")
            };
            if cur.is_empty() || estimate_text_width_px(&candidate, font_px) <= max_px {
                cur = candidate;
            } else {
                lines.push(std::mem::replace(&mut cur, word.to_string()));
            }
        }
        lines.push(cur);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_placeholders_in_order() {
        assert_eq!(fill_template("{} vs. {}.", &["a", "b"]), "a vs. b.");
        assert_eq!(fill_template("x {} y", &[]), "x {} y");
        assert_eq!(fill_template("no slots", &["a"]), "no slots");
    }

    #[test]
    fn general_format_matches_expected_shapes() {
        assert_eq!(format_general(0.123456, 2), "0.12");
        assert_eq!(format_general(0.5, 2), "0.5");
        assert_eq!(format_general(2.0, 3), "2.0");
        assert_eq!(format_general(12.3456, 3), "12.3");
        assert_eq!(format_general(12.3, 2), "1.2e+01");
        assert_eq!(format_general(-0.000123, 2), "-0.00012");
        assert_eq!(format_general(0.00001, 2), "1e-05");
        assert_eq!(format_general(-1.0, 3), "-1.0");
    }

    #[test]
    fn percent_and_count() {
        assert_eq!(format_percent(0.95, 0), "95%");
        assert_eq!(format_percent(0.95, 1), "95.0%");
        assert_eq!(format_count(10000), "10,000");
    }

    #[test]
    fn exponential_labels() {
        assert_eq!(exponential_label("lnRR"), "RR");
        assert_eq!(exponential_label("ln Odds Ratio"), "Odds Ratio");
        assert_eq!(exponential_label("Hedges' d"), "exp(Hedges' d)");
        assert_eq!(exponential_label("ln"), "exp(ln)");
    }

    #[test]
    fn wrapping_respects_existing_breaks() {
        let lines = wrap_text_to_width("alpha beta\ngamma", 10, 1000);
        assert_eq!(lines, vec!["alpha beta".to_string(), "gamma".to_string()]);
        let narrow = wrap_text_to_width("alpha beta gamma", 10, 40);
        assert_eq!(narrow.len(), 3);
    }
}
