//! Human-oriented formatting for amounts, ages and long identifiers.

use chrono::{DateTime, Utc};

fn commafy(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234` → `"1,234 sats"`
pub fn sats(amount: i64) -> String {
    format!("{} sats", commafy(amount))
}

pub fn sats_plain(amount: i64) -> String {
    commafy(amount)
}

pub fn time_ago(time: Option<DateTime<Utc>>) -> String {
    time_ago_from(time, Utc::now())
}

/// Compact age relative to `now`: "just now", "5m ago", "3h ago", "2d ago".
pub fn time_ago_from(time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(time) = time else {
        return "--".to_string();
    };
    let elapsed = now.signed_duration_since(time);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

/// Shortens `s` to at most `max` characters, marking the cut with "...".
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

/// Keeps enough of an API key to recognize it without revealing it.
pub fn truncate_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 16 {
        return key.to_string();
    }
    let head: String = chars[..12].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sats() {
        assert_eq!(sats(0), "0 sats");
        assert_eq!(sats(999), "999 sats");
        assert_eq!(sats(1000), "1,000 sats");
        assert_eq!(sats(1_234_567), "1,234,567 sats");
        assert_eq!(sats(-21_000), "-21,000 sats");
        assert_eq!(sats_plain(100_000), "100,000");
    }

    #[test]
    fn test_time_ago() {
        let now = Utc::now();
        assert_eq!(time_ago_from(None, now), "--");
        assert_eq!(time_ago_from(Some(now - Duration::seconds(30)), now), "just now");
        assert_eq!(time_ago_from(Some(now - Duration::minutes(5)), now), "5m ago");
        assert_eq!(time_ago_from(Some(now - Duration::hours(3)), now), "3h ago");
        assert_eq!(time_ago_from(Some(now - Duration::days(2)), now), "2d ago");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("⚡⚡⚡⚡⚡", 4), "⚡...");
    }

    #[test]
    fn test_truncate_key() {
        assert_eq!(truncate_key("key_short"), "key_short");
        assert_eq!(
            truncate_key("key_abcdefghijklmnopqrstuvwxyz"),
            "key_abcdefgh...wxyz"
        );
    }
}
