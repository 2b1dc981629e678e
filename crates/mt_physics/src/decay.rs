// crates/mt_physics/src/decay.rs

//! 质量演化
//!
//! 放射性核素按半衰期衰减 mass·2^(−δt/T½)；带蒸发率 ε 的
//! 物种按 exp(−ε·δt/30) 损失质量。剩余质量跌破初始值的
//! 10⁻³ 时粒子退役，计入 decayed 统计。

use mt_core::tracer::TracerDescriptor;

/// 退役阈值（初始质量的比例）
pub const RETIREMENT_MASS_FRACTION: f64 = 1e-3;

/// 单步质量更新结果
#[derive(Debug, Clone, Copy)]
pub struct MassUpdate {
    /// 更新后的质量
    pub mass: f64,
    /// 本步损失的质量
    pub lost: f64,
    /// 是否应退役
    pub retire: bool,
}

/// 推进一个粒子的质量
#[must_use]
pub fn update_mass(
    mass: f64,
    initial_mass: f64,
    dt_days: f64,
    descriptor: &TracerDescriptor,
) -> MassUpdate {
    let mut m = mass;

    if descriptor.behavior.decay_enabled {
        if let Some(half_life) = descriptor.half_life_days {
            m *= 2.0_f64.powf(-dt_days / half_life);
        }
    }
    if let Some(rate) = descriptor.behavior.evaporation_per_day {
        m *= (-rate * dt_days / 30.0).exp();
    }

    MassUpdate {
        mass: m,
        lost: mass - m,
        retire: m < RETIREMENT_MASS_FRACTION * initial_mass,
    }
}
