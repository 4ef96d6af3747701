// ==========================================
// 订阅配送管理系统 - 日历工具
// ==========================================
// 日期一律为本地日历日 (YYYY-MM-DD),逐日步进,不做时区换算
// ==========================================

use chrono::{Datelike, NaiveDate};

/// 日期存储/展示格式
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// 闭区间 [start, end] 内的每一天; end < start 时为空
pub fn each_day_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// 区间天数（闭区间）; end < start 时为 0
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    (end - start).num_days() as u32 + 1
}

pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// 宽松解析日期
///
/// 接受 `YYYY-MM-DD`,以及前 10 位为日期的时间戳
/// （如 `2024-03-01 00:00:00.000Z`、`2024-03-01T08:00:00Z`）
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, DAY_FORMAT).ok()
}

/// 解析 `YYYY-MM`,返回该月首日与末日
pub fn month_bounds(month: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (y, m) = month.trim().split_once('-')?;
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// 当月首日
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_each_day_crosses_month_and_leap_day() {
        let days: Vec<_> = each_day_inclusive(d(2024, 2, 27), d(2024, 3, 2)).collect();
        assert_eq!(
            days,
            vec![d(2024, 2, 27), d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1), d(2024, 3, 2)]
        );
        assert_eq!(days_inclusive(d(2024, 2, 27), d(2024, 3, 2)), 5);
    }

    #[test]
    fn test_each_day_single_and_empty() {
        assert_eq!(each_day_inclusive(d(2024, 3, 1), d(2024, 3, 1)).count(), 1);
        assert_eq!(each_day_inclusive(d(2024, 3, 2), d(2024, 3, 1)).count(), 0);
        assert_eq!(days_inclusive(d(2024, 3, 2), d(2024, 3, 1)), 0);
    }

    #[test]
    fn test_parse_day_lenient() {
        assert_eq!(parse_day("2024-03-01"), Some(d(2024, 3, 1)));
        assert_eq!(parse_day(" 2024-03-01 00:00:00.000Z"), Some(d(2024, 3, 1)));
        assert_eq!(parse_day("2024-03-01T08:00:00Z"), Some(d(2024, 3, 1)));
        assert_eq!(parse_day("03/01/2024"), None);
        assert_eq!(parse_day(""), None);
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds("2024-02"), Some((d(2024, 2, 1), d(2024, 2, 29))));
        assert_eq!(month_bounds("2023-12"), Some((d(2023, 12, 1), d(2023, 12, 31))));
        assert_eq!(month_bounds("2023-13"), None);
        assert_eq!(month_bounds("abc"), None);
        assert_eq!(first_of_month(d(2024, 3, 17)), d(2024, 3, 1));
    }
}
