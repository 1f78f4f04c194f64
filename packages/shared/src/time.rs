use chrono::{DateTime, SecondsFormat, Utc};

/// Get current Unix timestamp (milliseconds, UTC)
pub fn now_unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a Unix timestamp in milliseconds as RFC 3339.
///
/// Out-of-range values fall back to the Unix epoch.
pub fn timestamp_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_to_rfc3339() {
        // テスト項目: ミリ秒のタイムスタンプが RFC 3339 形式に変換される
        // given (前提条件):
        let millis = 1_700_000_000_123;

        // when (操作):
        let rendered = timestamp_to_rfc3339(millis);

        // then (期待する結果):
        assert_eq!(rendered, "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_now_unix_millis_is_recent() {
        // テスト項目: 現在時刻が 2020 年以降のミリ秒で返される
        let now = now_unix_millis();
        assert!(now > 1_577_836_800_000);
    }
}
