//! 时间处理工具模块
//!
//! 后端时间在模型层统一解析为 `DateTime<Utc>`，这里只负责显示：
//! - 绝对时间：按配置的时区（默认系统本地时区）格式化
//! - 相对时间：英文的距离描述，例如 "about 2 hours"，阈值与前端常用的 date-fns 一致

use chrono::{DateTime, FixedOffset, Local, Utc};
use parking_lot::RwLock;

/// 全局时区配置
static TIMEZONE_OFFSET: RwLock<Option<FixedOffset>> = RwLock::new(None);

const MINUTES_IN_HOUR: i64 = 60;
const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// 时区配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneConfig {
    /// 时区偏移（秒），例如：+08:00 = 28800, -05:00 = -18000
    pub offset_seconds: i32,
}

impl TimezoneConfig {
    /// 从小时偏移创建，例如：+8, -5
    pub fn from_hours(hours: i32) -> Self {
        Self {
            offset_seconds: hours * 3600,
        }
    }

    pub fn from_minutes(minutes: i32) -> Self {
        Self {
            offset_seconds: minutes * 60,
        }
    }

    /// 使用系统本地时区
    pub fn local() -> Self {
        Self {
            offset_seconds: Local::now().offset().local_minus_utc(),
        }
    }

    pub fn utc() -> Self {
        Self { offset_seconds: 0 }
    }

    pub fn to_fixed_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.offset_seconds)
    }
}

/// 时间格式化工具
pub struct TimeFormatter;

impl TimeFormatter {
    /// 设置全局显示时区，偏移越界时忽略
    pub fn set_timezone(config: TimezoneConfig) {
        if let Some(offset) = config.to_fixed_offset() {
            *TIMEZONE_OFFSET.write() = Some(offset);
        }
    }

    /// 当前显示时区，未配置时使用系统本地时区
    pub fn timezone() -> FixedOffset {
        if let Some(offset) = *TIMEZONE_OFFSET.read() {
            return offset;
        }
        *Local::now().offset()
    }

    /// 格式: "YYYY-MM-DD HH:MM:SS"
    pub fn format_standard(dt: &DateTime<Utc>) -> String {
        Self::format_in(dt, Self::timezone(), "%Y-%m-%d %H:%M:%S")
    }

    /// 格式: "YYYY-MM-DD HH:MM"
    pub fn format_short(dt: &DateTime<Utc>) -> String {
        Self::format_in(dt, Self::timezone(), "%Y-%m-%d %H:%M")
    }

    /// 时间线中使用的本地时间，例如 "Jan 1, 2024, 10:00:00 AM"
    pub fn format_local(dt: &DateTime<Utc>) -> String {
        Self::format_in(dt, Self::timezone(), "%b %-d, %Y, %-I:%M:%S %p")
    }

    fn format_in(dt: &DateTime<Utc>, tz: FixedOffset, pattern: &str) -> String {
        dt.with_timezone(&tz).format(pattern).to_string()
    }

    /// 两个时间点之间的距离描述（不带 "ago"），方向无关
    pub fn format_distance(dt: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
        let seconds = (*now - *dt).num_seconds().abs();
        let minutes = (seconds as f64 / 60.0).round() as i64;

        if minutes < 1 {
            return "less than a minute".to_string();
        }
        if minutes < 45 {
            return plural(minutes, "minute");
        }
        if minutes < 90 {
            return "about 1 hour".to_string();
        }
        if minutes < MINUTES_IN_DAY {
            let hours = (minutes as f64 / MINUTES_IN_HOUR as f64).round() as i64;
            return format!("about {}", plural(hours, "hour"));
        }
        if minutes < 2_520 {
            return "1 day".to_string();
        }
        if minutes < MINUTES_IN_MONTH {
            let days = (minutes as f64 / MINUTES_IN_DAY as f64).round() as i64;
            return plural(days, "day");
        }
        if minutes < MINUTES_IN_TWO_MONTHS {
            let months = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
            return format!("about {}", plural(months, "month"));
        }

        let months = minutes / MINUTES_IN_MONTH;
        if months < 12 {
            let nearest = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
            return plural(nearest, "month");
        }

        let years = months / 12;
        match months % 12 {
            0..=2 => format!("about {}", plural(years, "year")),
            3..=8 => format!("over {}", plural(years, "year")),
            _ => format!("almost {}", plural(years + 1, "year")),
        }
    }

    /// 相对当前时间的描述，例如 "about 2 hours ago"
    pub fn format_relative(dt: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
        let distance = Self::format_distance(dt, now);
        if dt > now {
            format!("in {}", distance)
        } else {
            format!("{} ago", distance)
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
