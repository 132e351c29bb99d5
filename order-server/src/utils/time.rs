//! 时间工具函数 (业务时区转换)
//!
//! Repositories only see `i64` Unix millis; the conversion from a business
//! calendar date happens here.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;

/// Source of "now" for the order pipeline
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current Unix millis
    fn now_millis(&self) -> i64;

    /// Business timezone used for calendar dates
    fn timezone(&self) -> Tz;

    /// Today's date in the business timezone
    fn today(&self) -> NaiveDate {
        local_date_of(self.now_millis(), self.timezone())
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// Clock that only moves when told to (deterministic tests, replays)
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
    tz: Tz,
}

impl ManualClock {
    pub fn new(millis: i64, tz: Tz) -> Self {
        Self {
            millis: AtomicI64::new(millis),
            tz,
        }
    }

    /// Start at local midnight of `date` (+ `offset_ms`)
    pub fn at_date(date: NaiveDate, offset_ms: i64, tz: Tz) -> Self {
        Self::new(day_start_millis(date, tz) + offset_ms, tz)
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.millis.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// 解析时区名称，失败时回退到 UTC
pub fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to parse timezone '{}': {}, falling back to UTC",
            name,
            e
        );
        Tz::UTC
    })
}

/// Unix millis → calendar date (业务时区)
pub fn local_date_of(millis: i64, tz: Tz) -> NaiveDate {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&tz).date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day, tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_bounds_utc() {
        let start = day_start_millis(date(2023, 10, 5), Tz::UTC);
        let end = day_end_millis(date(2023, 10, 5), Tz::UTC);
        assert_eq!(start, 1_696_464_000_000);
        assert_eq!(end - start, 86_400_000);
    }

    #[test]
    fn test_day_bounds_follow_timezone() {
        // Madrid is UTC+2 in October
        let start = day_start_millis(date(2023, 10, 5), chrono_tz::Europe::Madrid);
        assert_eq!(start, 1_696_464_000_000 - 2 * 3_600_000);
    }

    #[test]
    fn test_local_date_of_crosses_midnight() {
        // 2023-10-05T23:30:00Z is already the 6th in Madrid
        let millis = 1_696_464_000_000 + 23 * 3_600_000 + 30 * 60_000;
        assert_eq!(local_date_of(millis, Tz::UTC), date(2023, 10, 5));
        assert_eq!(
            local_date_of(millis, chrono_tz::Europe::Madrid),
            date(2023, 10, 6)
        );
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::at_date(date(2023, 10, 5), 1000, Tz::UTC);
        assert_eq!(clock.today(), date(2023, 10, 5));
        clock.advance(86_400_000);
        assert_eq!(clock.today(), date(2023, 10, 6));
        clock.set(0);
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn test_parse_timezone_fallback() {
        assert_eq!(parse_timezone("Europe/Madrid"), chrono_tz::Europe::Madrid);
        assert_eq!(parse_timezone("Not/AZone"), Tz::UTC);
    }
}
