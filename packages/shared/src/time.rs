//! Time helpers.
//!
//! All timestamps inside the server are Unix milliseconds in UTC. Conversion to
//! RFC 3339 happens only at the HTTP boundary.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current Unix timestamp in milliseconds (UTC).
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a Unix millisecond timestamp to an RFC 3339 string (UTC, millisecond precision).
///
/// Out-of-range values fall back to the Unix epoch.
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_to_rfc3339() {
        // テスト項目: ミリ秒タイムスタンプが RFC 3339 文字列に変換される
        // given (前提条件):
        let millis = 1_700_000_000_123;

        // when (操作):
        let result = millis_to_rfc3339(millis);

        // then (期待する結果):
        assert_eq!(result, "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_now_millis_is_monotone_enough() {
        // テスト項目: 連続して取得した現在時刻が逆行しない
        let t1 = now_millis();
        let t2 = now_millis();
        assert!(t2 >= t1);
    }
}
