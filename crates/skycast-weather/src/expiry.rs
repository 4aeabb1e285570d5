//! Cache lifetime derived from forecast response headers.
//!
//! Strategies are consulted in order; the first to produce an instant wins.
//! When none does, [`DEFAULT_CACHE_SECS`] applies.

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, CACHE_CONTROL, EXPIRES};

/// met.no asks clients to cache forecasts for at least an hour.
pub const DEFAULT_CACHE_SECS: i64 = 60 * 60;

/// One way of reading an expiry instant out of response headers.
pub trait ExpiryStrategy: Send + Sync {
    fn resolve(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// `Cache-Control: max-age=N` → now + N seconds.
#[derive(Debug, Default)]
pub struct MaxAge;

impl ExpiryStrategy for MaxAge {
    fn resolve(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .find_map(parse_max_age)?;
        let secs = i64::try_from(secs).ok()?;
        now.checked_add_signed(Duration::try_seconds(secs)?)
    }
}

fn parse_max_age(directive: &str) -> Option<u64> {
    let (name, value) = directive.trim().split_once('=')?;
    if !name.trim().eq_ignore_ascii_case("max-age") {
        return None;
    }
    value.trim().trim_matches('"').parse().ok()
}

/// `Expires: <http-date>`, taken as an absolute instant.
#[derive(Debug, Default)]
pub struct ExpiresHeader;

impl ExpiryStrategy for ExpiresHeader {
    fn resolve(&self, headers: &HeaderMap, _now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let raw = headers.get(EXPIRES)?.to_str().ok()?.trim();
        // IMF-fixdate, RFC 850 and asctime; numeric offsets and RFC 3339 as fallbacks
        if let Ok(at) = httpdate::parse_http_date(raw) {
            return Some(DateTime::<Utc>::from(at));
        }
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Ordered list of strategies plus the fallback duration.
pub struct ExpiryPolicy {
    strategies: Vec<Box<dyn ExpiryStrategy>>,
    default_duration: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            strategies: vec![Box::new(MaxAge), Box::new(ExpiresHeader)],
            default_duration: Duration::seconds(DEFAULT_CACHE_SECS),
        }
    }
}

impl ExpiryPolicy {
    /// First instant any strategy yields, or `None`.
    pub fn resolve(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.resolve(headers, now))
    }

    /// Resolved instant, falling back to `now + default_duration`.
    pub fn expires_at(&self, headers: &HeaderMap, now: DateTime<Utc>) -> DateTime<Utc> {
        self.resolve(headers, now)
            .unwrap_or(now + self.default_duration)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(reqwest::header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_max_age() {
        let h = headers(&[(CACHE_CONTROL, "public, max-age=1800")]);
        assert_eq!(MaxAge.resolve(&h, now()), Some(now() + Duration::seconds(1800)));
    }

    #[test]
    fn test_max_age_ignores_s_maxage() {
        let h = headers(&[(CACHE_CONTROL, "s-maxage=60, MAX-AGE=120")]);
        assert_eq!(MaxAge.resolve(&h, now()), Some(now() + Duration::seconds(120)));
    }

    #[test]
    fn test_max_age_missing_or_malformed() {
        assert_eq!(MaxAge.resolve(&headers(&[(CACHE_CONTROL, "no-cache")]), now()), None);
        assert_eq!(MaxAge.resolve(&headers(&[(CACHE_CONTROL, "max-age=soon")]), now()), None);
        assert_eq!(MaxAge.resolve(&HeaderMap::new(), now()), None);
    }

    #[test]
    fn test_expires_http_date() {
        let h = headers(&[(EXPIRES, "Mon, 19 Oct 2026 13:30:00 GMT")]);
        assert_eq!(
            ExpiresHeader.resolve(&h, now()),
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 13, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_expires_obsolete_http_date_forms() {
        let expected = Some(Utc.with_ymd_and_hms(2026, 10, 19, 13, 30, 0).unwrap());
        let rfc850 = headers(&[(EXPIRES, "Monday, 19-Oct-26 13:30:00 GMT")]);
        assert_eq!(ExpiresHeader.resolve(&rfc850, now()), expected);
        let asctime = headers(&[(EXPIRES, "Mon Oct 19 13:30:00 2026")]);
        assert_eq!(ExpiresHeader.resolve(&asctime, now()), expected);
    }

    #[test]
    fn test_expires_numeric_offset_and_rfc3339() {
        let expected = Some(Utc.with_ymd_and_hms(2026, 10, 19, 13, 30, 0).unwrap());
        let offset = headers(&[(EXPIRES, "Mon, 19 Oct 2026 15:30:00 +0200")]);
        assert_eq!(ExpiresHeader.resolve(&offset, now()), expected);
        let rfc3339 = headers(&[(EXPIRES, "2026-10-19T13:30:00Z")]);
        assert_eq!(ExpiresHeader.resolve(&rfc3339, now()), expected);
    }

    #[test]
    fn test_expires_unparseable() {
        let h = headers(&[(EXPIRES, "0")]);
        assert_eq!(ExpiresHeader.resolve(&h, now()), None);
    }

    #[test]
    fn test_max_age_takes_precedence_over_expires() {
        let h = headers(&[
            (EXPIRES, "Mon, 19 Oct 2026 18:00:00 GMT"),
            (CACHE_CONTROL, "max-age=600"),
        ]);
        let policy = ExpiryPolicy::default();
        assert_eq!(policy.resolve(&h, now()), Some(now() + Duration::seconds(600)));
    }

    #[test]
    fn test_expires_used_without_max_age() {
        let h = headers(&[
            (CACHE_CONTROL, "public"),
            (EXPIRES, "Mon, 19 Oct 2026 18:00:00 GMT"),
        ]);
        let policy = ExpiryPolicy::default();
        assert_eq!(
            policy.expires_at(&h, now()),
            Utc.with_ymd_and_hms(2026, 10, 19, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_default_duration_is_one_hour() {
        let policy = ExpiryPolicy::default();
        assert_eq!(policy.resolve(&HeaderMap::new(), now()), None);
        assert_eq!(
            policy.expires_at(&HeaderMap::new(), now()),
            now() + Duration::hours(1)
        );
    }
}
