// crates/mt_physics/src/vertical.rs

//! 垂向运动
//!
//! 随机项：分段常数的垂向扩散系数 K_z
//! （50 m 以浅 10⁻²，50–200 m 10⁻⁴，200 m 以深 5·10⁻⁵ m²/s）。
//! 确定项：Ekman 抽吸（5·10⁻⁶ m/s，恒向下）；北半球冬季
//! （年积日 ∈ [335, 365] ∪ [0, 90]）且深度小于 100 m 时附加
//! 对流混合项（2·10⁻⁶ m/s）；物种沉降/上浮速度。
//! 最终深度夹到 [0, 1] km。

use crate::diffusion::SECONDS_PER_DAY;
use mt_core::rng::DriftRng;
use serde::{Deserialize, Serialize};

/// 垂向运动参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerticalSettings {
    /// 是否启用垂向混合
    pub enabled: bool,
    /// Ekman 抽吸速度 [m/s]，正值向下
    pub ekman_m_s: f64,
    /// 冬季对流混合速度 [m/s]
    pub convective_m_s: f64,
}

impl Default for VerticalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ekman_m_s: 5e-6,
            convective_m_s: 2e-6,
        }
    }
}

/// 深度上限 [km]
pub const MAX_DEPTH_KM: f64 = 1.0;
/// 对流混合的作用深度 [m]
const CONVECTION_DEPTH_M: f64 = 100.0;

/// 分段垂向扩散系数 [m²/s]
#[must_use]
pub fn kz_m2s(depth_m: f64) -> f64 {
    if depth_m < 50.0 {
        1e-2
    } else if depth_m < 200.0 {
        1e-4
    } else {
        5e-5
    }
}

/// 年积日是否处于北半球冬季
#[must_use]
pub fn winter_convection(day_of_year: u32) -> bool {
    day_of_year >= 335 || day_of_year <= 90
}

/// 推进一个粒子的深度，返回夹取后的新深度 [km]
pub fn vertical_step(
    depth_km: f64,
    settling_m_per_day: f64,
    dt_days: f64,
    day_of_year: u32,
    rng: &mut DriftRng,
    settings: &VerticalSettings,
) -> f64 {
    if !settings.enabled {
        return depth_km.clamp(0.0, MAX_DEPTH_KM);
    }
    let dt_s = dt_days * SECONDS_PER_DAY;
    let depth_m = depth_km * 1000.0;

    let walk_m = (2.0 * kz_m2s(depth_m) * dt_s).sqrt() * rng.standard_normal();
    let ekman_m = settings.ekman_m_s * dt_s;
    let convective_m = if winter_convection(day_of_year) && depth_m < CONVECTION_DEPTH_M {
        settings.convective_m_s * dt_s
    } else {
        0.0
    };
    let settling_m = settling_m_per_day * dt_days;

    let new_depth_m = depth_m + walk_m + ekman_m + convective_m + settling_m;
    (new_depth_m / 1000.0).clamp(0.0, MAX_DEPTH_KM)
}
