// crates/mt_core/src/schedule.rs

//! 释放计划
//!
//! 用户以若干互不重叠的阶段申报释放：每个阶段在
//! [start_day, end_day) 内以恒定速率释放 total 的量。
//! 逐步推进时把"应释放量 / 每粒子份额"累入小数累加器，
//! 取整数部分作为本步释放的粒子数。这保证了任意小步长下
//! 释放总量守恒（§累加器残差恒 < 1）。

use crate::error::{CoreError, CoreResult};
use crate::units::ReleaseUnit;
use serde::{Deserialize, Serialize};

/// 单个释放阶段
///
/// 不变量：`end_day > start_day`，`total > 0`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReleasePhase {
    /// 起始模拟日
    pub start_day: f64,
    /// 结束模拟日（不含）
    pub end_day: f64,
    /// 阶段释放总量（申报单位）
    pub total: f64,
    /// 申报单位
    pub unit: ReleaseUnit,
}

impl ReleasePhase {
    /// 阶段时长 [day]
    #[must_use]
    pub fn duration_days(&self) -> f64 {
        self.end_day - self.start_day
    }

    /// 阶段总量（基准单位）
    #[must_use]
    pub fn total_base(&self) -> f64 {
        self.unit.to_base(self.total)
    }

    /// 恒定释放速率 [基准单位/day]
    #[must_use]
    pub fn rate_base_per_day(&self) -> f64 {
        self.total_base() / self.duration_days()
    }

    /// 某模拟日是否落在本阶段内
    #[must_use]
    pub fn contains(&self, day: f64) -> bool {
        day >= self.start_day && day < self.end_day
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.start_day < other.end_day && other.start_day < self.end_day
    }
}

/// 释放计划
///
/// 有序阶段集合 + 小数粒子累加器。每次运行一份，
/// 启动前由外部控制接口填充。
#[derive(Debug, Clone, Default)]
pub struct ReleaseSchedule {
    phases: Vec<ReleasePhase>,
    /// 小数粒子累加器
    accumulator: f64,
    /// 每粒子携带的量（基准单位），绑定容量后有效
    units_per_particle: f64,
}

impl ReleaseSchedule {
    /// 创建空计划
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加阶段
    ///
    /// 拒绝倒置区间、非正总量、与已有阶段重叠的区间。
    pub fn add_phase(
        &mut self,
        start_day: f64,
        end_day: f64,
        total: f64,
        unit: ReleaseUnit,
    ) -> CoreResult<()> {
        if !(end_day > start_day) || !(total > 0.0) {
            return Err(CoreError::InvalidPhase {
                start: start_day,
                end: end_day,
                total,
            });
        }
        let phase = ReleasePhase {
            start_day,
            end_day,
            total,
            unit,
        };
        if self.phases.iter().any(|p| p.overlaps(&phase)) {
            return Err(CoreError::OverlappingPhase {
                start: start_day,
                end: end_day,
            });
        }
        self.phases.push(phase);
        self.phases
            .sort_by(|a, b| a.start_day.partial_cmp(&b.start_day).unwrap());
        Ok(())
    }

    /// 阶段列表（按起始日排序）
    #[must_use]
    pub fn phases(&self) -> &[ReleasePhase] {
        &self.phases
    }

    /// 全部阶段的基准单位总量
    #[must_use]
    pub fn total_base(&self) -> f64 {
        self.phases.iter().map(|p| p.total_base()).sum()
    }

    /// 绑定粒子池容量，确定每粒子份额
    pub fn bind_capacity(&mut self, capacity: usize) {
        if capacity > 0 {
            self.units_per_particle = self.total_base() / capacity as f64;
        }
    }

    /// 每粒子携带的量（基准单位）
    #[must_use]
    pub fn units_per_particle(&self) -> f64 {
        self.units_per_particle
    }

    /// 某模拟日的释放速率
    ///
    /// 返回 (基准单位/day, 活动阶段)；无活动阶段时为 (0, None)。
    #[must_use]
    pub fn rate_at(&self, day: f64) -> (f64, Option<&ReleasePhase>) {
        match self.phases.iter().find(|p| p.contains(day)) {
            Some(p) => (p.rate_base_per_day(), Some(p)),
            None => (0.0, None),
        }
    }

    /// 推进一个时间步，返回本步应释放的整数粒子数
    ///
    /// 累加器残差保留到下一步，释放总量跨任意步长守恒。
    pub fn advance(&mut self, day: f64, delta_days: f64) -> u64 {
        if self.units_per_particle <= 0.0 || delta_days <= 0.0 {
            return 0;
        }
        let (rate, _) = self.rate_at(day);
        self.accumulator += rate * delta_days / self.units_per_particle;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        whole as u64
    }

    /// 把未释放的份额退还累加器（池满时）
    pub fn refund(&mut self, particles: u64) {
        self.accumulator += particles as f64;
    }

    /// 当前累加器残差
    #[must_use]
    pub fn residual(&self) -> f64 {
        self.accumulator
    }

    /// 清零累加器（reset 时）
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_phase_rejects_inverted() {
        let mut s = ReleaseSchedule::new();
        assert!(matches!(
            s.add_phase(10.0, 5.0, 1.0, ReleaseUnit::PBq),
            Err(CoreError::InvalidPhase { .. })
        ));
        assert!(matches!(
            s.add_phase(0.0, 5.0, 0.0, ReleaseUnit::PBq),
            Err(CoreError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_add_phase_rejects_overlap() {
        let mut s = ReleaseSchedule::new();
        s.add_phase(0.0, 10.0, 1.0, ReleaseUnit::PBq).unwrap();
        assert!(matches!(
            s.add_phase(5.0, 15.0, 1.0, ReleaseUnit::PBq),
            Err(CoreError::OverlappingPhase { .. })
        ));
        // 相邻不算重叠
        s.add_phase(10.0, 20.0, 1.0, ReleaseUnit::PBq).unwrap();
        assert_eq!(s.phases().len(), 2);
    }

    #[test]
    fn test_rate_at() {
        let mut s = ReleaseSchedule::new();
        // 10 PBq / 10 天 = 1e6 GBq/day
        s.add_phase(0.0, 10.0, 10.0, ReleaseUnit::PBq).unwrap();
        let (rate, phase) = s.rate_at(5.0);
        assert!((rate - 1e6).abs() < 1e-3);
        assert!(phase.is_some());
        let (rate, phase) = s.rate_at(11.0);
        assert_eq!(rate, 0.0);
        assert!(phase.is_none());
    }

    #[test]
    fn test_advance_conserves_total() {
        let mut s = ReleaseSchedule::new();
        s.add_phase(0.0, 10.0, 10.0, ReleaseUnit::PBq).unwrap();
        s.bind_capacity(1000);

        // 不规则小步推进整个阶段
        let mut day = 0.0;
        let mut emitted = 0u64;
        let steps: [f64; 5] = [0.013, 0.4, 0.07, 0.25, 0.11];
        let mut i = 0;
        while day < 10.0 {
            let dt = steps[i % steps.len()].min(10.0 - day);
            emitted += s.advance(day, dt);
            day += dt;
            i += 1;
        }
        // 总量 = 容量 × 每粒子份额 ⇒ 恰好释放 capacity 个
        assert_eq!(emitted, 1000);
        assert!(s.residual() < 1.0);
    }

    #[test]
    fn test_multi_phase_conservation() {
        let mut s = ReleaseSchedule::new();
        // 四个阶段共 16.2 PBq，731 天
        s.add_phase(0.0, 30.0, 12.0, ReleaseUnit::PBq).unwrap();
        s.add_phase(30.0, 100.0, 3.0, ReleaseUnit::PBq).unwrap();
        s.add_phase(100.0, 400.0, 1.0, ReleaseUnit::PBq).unwrap();
        s.add_phase(400.0, 731.0, 0.2, ReleaseUnit::PBq).unwrap();
        s.bind_capacity(10_000);

        assert!((s.total_base() - 16.2e6).abs() < 1e-3);

        let mut emitted = 0u64;
        let mut day = 0.0;
        while day < 731.0 {
            emitted += s.advance(day, 0.1);
            day += 0.1;
        }
        // 每粒子份额 × 释放数 与总量之差不超过一份
        let released_base = emitted as f64 * s.units_per_particle();
        assert!((released_base - 16.2e6).abs() <= s.units_per_particle() + 1e-6);
    }

    #[test]
    fn test_refund() {
        let mut s = ReleaseSchedule::new();
        s.add_phase(0.0, 1.0, 1.0, ReleaseUnit::GBq).unwrap();
        s.bind_capacity(10);
        let n = s.advance(0.0, 0.5);
        assert_eq!(n, 5);
        s.refund(2);
        assert!(s.residual() >= 2.0);
    }
}
