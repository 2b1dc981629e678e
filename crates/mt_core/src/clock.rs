// crates/mt_core/src/clock.rs

//! 模拟时钟
//!
//! 把真实墙钟时间映射为模拟天数：每次 `step()` 读取自上次
//! 调用以来的真实秒数，乘以速度倍率得到本步 δt（天）。
//! 暂停冻结积分；恢复时重设墙钟锚点，不追赶暂停期间的时间。

use chrono::{Days, NaiveDate};
use std::time::Instant;

/// 墙钟 → 模拟日 时钟
#[derive(Debug, Clone)]
pub struct SimulationClock {
    /// 模拟起始日期
    start_date: NaiveDate,
    /// 速度倍率 [模拟天/真实秒]
    speed: f64,
    /// 上次 step 的墙钟锚点；暂停时为 None
    anchor: Option<Instant>,
    /// 已积分的模拟天数
    elapsed_days: f64,
}

impl SimulationClock {
    /// 创建时钟（初始为暂停态）
    #[must_use]
    pub fn new(start_date: NaiveDate, speed: f64) -> Self {
        Self {
            start_date,
            speed,
            anchor: None,
            elapsed_days: 0.0,
        }
    }

    /// 启动/恢复：重设墙钟锚点
    pub fn resume(&mut self) {
        if self.anchor.is_none() {
            self.anchor = Some(Instant::now());
        }
    }

    /// 暂停：冻结积分
    pub fn pause(&mut self) {
        // 把未读取的时间先结算掉
        let _ = self.step();
        self.anchor = None;
    }

    /// 是否处于暂停态
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.anchor.is_none()
    }

    /// 读取并结算本步 δt [天]
    ///
    /// 暂停时恒为 0。速度变更从下一次 step 生效。
    pub fn step(&mut self) -> f64 {
        let Some(anchor) = self.anchor else {
            return 0.0;
        };
        let now = Instant::now();
        let dt = now.duration_since(anchor).as_secs_f64() * self.speed;
        self.anchor = Some(now);
        self.elapsed_days += dt;
        dt
    }

    /// 手动推进（批处理/测试路径，不经墙钟）
    pub fn advance_manual(&mut self, delta_days: f64) {
        self.elapsed_days += delta_days;
    }

    /// 设置速度倍率 [模拟天/真实秒]
    pub fn set_speed(&mut self, speed: f64) {
        // 变速前结算旧速度下的时间
        let _ = self.step();
        self.speed = speed;
    }

    /// 当前速度倍率
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// 当前模拟日（自起始日的浮点天数）
    #[must_use]
    pub fn sim_day(&self) -> f64 {
        self.elapsed_days
    }

    /// 当前模拟日历日期
    #[must_use]
    pub fn current_date(&self) -> NaiveDate {
        date_for(self.start_date, self.elapsed_days)
    }

    /// 起始日期
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// 归零：回到起始时刻，进入暂停态
    pub fn reset(&mut self) {
        self.elapsed_days = 0.0;
        self.anchor = None;
    }
}

/// 模拟日 → 日历日期
#[must_use]
pub fn date_for(start: NaiveDate, sim_day: f64) -> NaiveDate {
    let whole = sim_day.max(0.0).floor() as u64;
    start
        .checked_add_days(Days::new(whole))
        .unwrap_or(NaiveDate::MAX)
}
