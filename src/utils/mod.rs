use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Remove markdown code-fence markers (```json / ```) the model sometimes wraps its JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Round a money amount to 2 decimal places
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Convert odds to implied probability
pub fn odds_to_probability(odds: f64) -> f64 {
    if odds <= 1.0 {
        return 0.99; // Cap at 99%
    }
    (1.0 / odds).min(0.99)
}

/// Decimal odds must be finite and strictly greater than 1.0 to mean anything.
pub fn is_valid_decimal_odd(odds: f64) -> bool {
    odds.is_finite() && odds > 1.0
}

/// Validate team name format
pub fn validate_team_name(name: &str) -> bool {
    !name.trim().is_empty() && name.len() <= 100
}

/// Clamp into [0.0, 1.0]; NaN becomes 0.0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Human-readable kick-off; falls back to the raw string when it isn't a timestamp.
pub fn format_kickoff(m: &crate::models::MatchData) -> String {
    match m.kickoff() {
        Some(d) => d.format("%a %d %b %H:%M UTC").to_string(),
        None => m.date.clone(),
    }
}

/// Fuzzy team-name match: normalises common suffixes, then containment or Jaro-Winkler >= 0.85.
pub fn names_match(a: &str, b: &str) -> bool {
    let norm = |s: &str| -> String {
        s.to_lowercase()
            .replace(" fc", "")
            .replace("fc ", "")
            .replace(" cf", "")
            .replace(".", "")
            .replace("-", " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    };
    let a = norm(a);
    let b = norm(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a) || strsim::jaro_winkler(&a, &b) >= 0.85
}

/// Models return ids as `"m1"` or `1` interchangeably.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Numbers sometimes arrive quoted (`"0.70"`); anything unparseable reads as absent.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// String list that tolerates nulls and stray non-string entries. A lone string is a list of one.
pub fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Some(Value::String(s)) => Some(vec![s]),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("  ```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fences("[]"), "[]");
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(656.25), 656.25);
        assert_eq!(round_to_cents(1.23456), 1.23);
        assert_eq!(round_to_cents(2.675000001), 2.68);
    }

    #[test]
    fn test_odds_to_probability() {
        assert!((odds_to_probability(2.0) - 0.5).abs() < 0.001);
        assert!((odds_to_probability(4.0) - 0.25).abs() < 0.001);
        assert_eq!(odds_to_probability(1.0), 0.99);
    }

    #[test]
    fn test_decimal_odd_validation() {
        assert!(is_valid_decimal_odd(1.01));
        assert!(!is_valid_decimal_odd(1.0));
        assert!(!is_valid_decimal_odd(f64::NAN));
        assert!(!is_valid_decimal_odd(f64::INFINITY));
    }

    #[test]
    fn test_names_match() {
        assert!(names_match("Man City", "man city"));
        assert!(names_match("Barcelona", "FC Barcelona"));
        assert!(names_match("Boston Celtics", "Celtics"));
        assert!(!names_match("Lakers", "Suns"));
        assert!(!names_match("", "Suns"));
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(1.4), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(0.45), 0.45);
    }

    #[derive(serde::Deserialize)]
    struct Loose {
        #[serde(default, deserialize_with = "lenient_f64")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "lenient_strings")]
        names: Option<Vec<String>>,
    }

    fn loose(json: &str) -> Loose {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_lenient_fields() {
        assert_eq!(loose(r#"{"value": " 0.7 "}"#).value, Some(0.7));
        assert_eq!(loose(r#"{"value": 3}"#).value, Some(3.0));
        assert_eq!(loose(r#"{"value": "n/a"}"#).value, None);
        assert_eq!(loose(r#"{"value": [1]}"#).value, None);
        assert_eq!(loose("{}").value, None);

        assert_eq!(loose(r#"{"names": [null, "Tatum", 7]}"#).names, Some(vec!["Tatum".to_string()]));
        assert_eq!(loose(r#"{"names": "Herro"}"#).names, Some(vec!["Herro".to_string()]));
        assert_eq!(loose(r#"{"names": null}"#).names, None);
    }
}
