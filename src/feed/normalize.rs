//! Field-level normalization shared by the provider adapters.

use super::sports::SportFamily;
use serde_json::Value;

/// Raw timestamps above this are milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;

/// Normalize a raw provider timestamp to Unix seconds.
///
/// Numbers greater than 1e12 are milliseconds and are integer-divided by 1000.
/// Missing or non-numeric values yield 0 ("unknown"), never "now".
pub fn unix_seconds(raw: Option<&Value>) -> i64 {
    let Some(raw) = raw else { return 0 };
    if let Some(i) = raw.as_i64() {
        return if i as f64 > MILLIS_THRESHOLD { i / 1000 } else { i };
    }
    if let Some(u) = raw.as_u64() {
        let secs = if u as f64 > MILLIS_THRESHOLD { u / 1000 } else { u };
        return i64::try_from(secs).unwrap_or(0);
    }
    match raw.as_f64() {
        Some(f) if f.is_finite() => {
            if f > MILLIS_THRESHOLD {
                (f / 1000.0).trunc() as i64
            } else {
                f.trunc() as i64
            }
        }
        _ => 0,
    }
}

/// Trim a display name; empty names are rejected.
pub fn clean_name(raw: Option<&str>) -> Option<String> {
    let name = raw?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Integer view of a JSON value. Accepts numbers and numeric strings.
pub fn as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer view restricted to small counters (1..=255).
pub fn as_counter(v: Option<&Value>) -> Option<u8> {
    v.and_then(as_int)
        .and_then(|i| u8::try_from(i).ok())
        .filter(|&i| i > 0)
}

/// Loose truthiness for provider flags that arrive as bool, 0/1 or "true".
pub fn truthy(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            !s.is_empty() && !s.eq_ignore_ascii_case("false") && s != "0"
        }
        _ => false,
    }
}

/// Decimal odds as a JSON number or numeric string. Values at or below 1.0
/// (and non-finite ones) are not quotable.
pub fn as_odds(v: Option<&Value>) -> Option<f64> {
    let c = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (c.is_finite() && c > 1.0).then_some(c)
}

/// Text view of a JSON value. Numbers are rendered, everything else is None.
pub fn as_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Derive the current phase number.
///
/// Priority: an explicit numeric field in 1..=10, then an ordinal marker in
/// the phase text, then 1. Out-of-range numerics fall through to the text.
pub fn derive_period(numeric: Option<i64>, phase: Option<&str>, family: SportFamily) -> u8 {
    if let Some(n) = numeric {
        if (1..=10).contains(&n) {
            return n as u8;
        }
    }
    phase.and_then(|p| phase_ordinal(p, family)).unwrap_or(1)
}

const ORDINALS: &[(&str, u8)] = &[
    ("1st", 1),
    ("first", 1),
    ("2nd", 2),
    ("second", 2),
    ("3rd", 3),
    ("third", 3),
    ("4th", 4),
    ("fourth", 4),
    ("5th", 5),
    ("fifth", 5),
];

/// Ordinal marker in a phase string: "1st half", "Second period", "set_3",
/// "extra time" (one past regulation for the sport family).
pub fn phase_ordinal(phase: &str, family: SportFamily) -> Option<u8> {
    let lower = phase.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|t| !t.is_empty())
        .collect();

    for token in &tokens {
        if let Some((_, n)) = ORDINALS.iter().find(|(word, _)| word == token) {
            return Some(*n);
        }
    }
    if tokens.iter().any(|t| *t == "extra" || *t == "overtime") {
        return Some(family.regulation_phases().saturating_add(1).min(10));
    }
    // "set_3", "inning_7": trailing number after a phase word
    if tokens.len() >= 2 {
        if let Some(n) = tokens.last().and_then(|t| t.parse::<u8>().ok()) {
            if (1..=10).contains(&n) {
                return Some(n);
            }
        }
    }
    None
}

/// True when the phase text marks the interval between halves.
pub fn is_half_time_phase(phase: &str) -> bool {
    let lower = phase.to_lowercase().replace(['_', '-'], " ");
    lower.contains("half time") || lower.contains("halftime") || lower.trim() == "break"
}

/// True when the phase text marks added/stoppage time.
pub fn is_stoppage_phase(phase: &str) -> bool {
    let lower = phase.to_lowercase().replace(['_', '-'], " ");
    lower.contains("added time") || lower.contains("stoppage") || lower.contains("injury time")
}

/// Normalize a provider score into "H:A". Accepts ":" or "-" separators and
/// ignores trailing detail like set breakdowns. Unparseable scores become "".
pub fn normalize_score(raw: &str) -> String {
    let head = raw.split(['(', ',', ' ']).find(|s| !s.is_empty()).unwrap_or("");
    let Some((h, a)) = head.split_once([':', '-']) else {
        return String::new();
    };
    match (h.trim().parse::<u32>(), a.trim().parse::<u32>()) {
        (Ok(h), Ok(a)) => format!("{}:{}", h, a),
        _ => String::new(),
    }
}

/// Parse a "3:2" / "3-2" counter pair.
pub fn parse_pair(raw: &str) -> Option<(u32, u32)> {
    let (h, a) = raw.trim().split_once([':', '-'])?;
    Some((h.trim().parse().ok()?, a.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_millis_converted_to_seconds() {
        assert_eq!(unix_seconds(Some(&json!(1700000000000i64))), 1700000000);
        assert_eq!(unix_seconds(Some(&json!(1700000000123i64))), 1700000000);
    }

    #[test]
    fn test_seconds_pass_through() {
        assert_eq!(unix_seconds(Some(&json!(1700000000))), 1700000000);
        assert_eq!(unix_seconds(Some(&json!(1000))), 1000);
        assert_eq!(unix_seconds(Some(&json!(1700000000.7))), 1700000000);
    }

    #[test]
    fn test_missing_or_non_numeric_timestamp_is_zero() {
        assert_eq!(unix_seconds(None), 0);
        assert_eq!(unix_seconds(Some(&json!("1700000000"))), 0);
        assert_eq!(unix_seconds(Some(&json!(null))), 0);
        assert_eq!(unix_seconds(Some(&json!({"t": 1}))), 0);
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name(Some("  Arsenal ")), Some("Arsenal".to_string()));
        assert_eq!(clean_name(Some("   ")), None);
        assert_eq!(clean_name(None), None);
    }

    #[test]
    fn test_period_numeric_in_range_wins() {
        assert_eq!(derive_period(Some(2), Some("1st half"), SportFamily::Halves), 2);
        assert_eq!(derive_period(Some(10), None, SportFamily::Quarters), 10);
    }

    #[test]
    fn test_period_out_of_range_falls_back_to_text() {
        assert_eq!(derive_period(Some(0), Some("2nd half"), SportFamily::Halves), 2);
        assert_eq!(derive_period(Some(45), Some("Second Half"), SportFamily::Halves), 2);
        assert_eq!(derive_period(Some(11), None, SportFamily::Halves), 1);
    }

    #[test]
    fn test_period_text_markers() {
        assert_eq!(derive_period(None, Some("1st_half"), SportFamily::Halves), 1);
        assert_eq!(derive_period(None, Some("first period"), SportFamily::Periods), 1);
        assert_eq!(derive_period(None, Some("extra_time"), SportFamily::Halves), 3);
        assert_eq!(derive_period(None, Some("overtime"), SportFamily::Quarters), 5);
        assert_eq!(derive_period(None, Some("set_3"), SportFamily::Racket), 3);
        assert_eq!(derive_period(None, Some("inning_7"), SportFamily::Innings), 7);
    }

    #[test]
    fn test_period_defaults_to_one() {
        assert_eq!(derive_period(None, None, SportFamily::Halves), 1);
        assert_eq!(derive_period(None, Some("in_play"), SportFamily::Halves), 1);
        assert_eq!(derive_period(None, Some("live"), SportFamily::Other), 1);
    }

    #[test]
    fn test_score_normalization() {
        assert_eq!(normalize_score("2:1"), "2:1");
        assert_eq!(normalize_score("2-1"), "2:1");
        assert_eq!(normalize_score("1:0 (6-4, 3-2)"), "1:0");
        assert_eq!(normalize_score(""), "");
        assert_eq!(normalize_score("145/3"), "");
    }

    #[test]
    fn test_phase_flags() {
        assert!(is_half_time_phase("Half time"));
        assert!(is_half_time_phase("half_time"));
        assert!(is_half_time_phase("break"));
        assert!(!is_half_time_phase("2nd half"));
        assert!(is_stoppage_phase("2nd half added time"));
        assert!(!is_stoppage_phase("2nd half"));
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!(1))));
        assert!(truthy(Some(&json!("yes"))));
        assert!(!truthy(Some(&json!("false"))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(None));
    }

    #[test]
    fn test_odds_must_exceed_one() {
        assert_eq!(as_odds(Some(&json!(1.85))), Some(1.85));
        assert_eq!(as_odds(Some(&json!("2.5"))), Some(2.5));
        assert_eq!(as_odds(Some(&json!(1.0))), None);
        assert_eq!(as_odds(Some(&json!(0))), None);
        assert_eq!(as_odds(Some(&json!(null))), None);
    }

    #[test]
    fn test_counter_rejects_zero_and_garbage() {
        assert_eq!(as_counter(Some(&json!(3))), Some(3));
        assert_eq!(as_counter(Some(&json!("4"))), Some(4));
        assert_eq!(as_counter(Some(&json!(0))), None);
        assert_eq!(as_counter(Some(&json!(-1))), None);
        assert_eq!(as_counter(Some(&json!([1]))), None);
    }
}
