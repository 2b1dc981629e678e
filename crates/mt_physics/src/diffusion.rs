// crates/mt_physics/src/diffusion.rs

//! 水平随机游走
//!
//! Markov 链参数化的中尺度扩散：步长尺度
//! √(2·K·scale_user·scale_species·δt) 米，两个轴向独立乘以
//! N(0,1) 抽样。扩散度场缺席时使用 20 m²/s 的回退值。

use glam::DVec2;
use mt_core::rng::DriftRng;

/// 扩散度场缺席时的回退值 [m²/s]
pub const K_FALLBACK_M2_S: f64 = 20.0;

/// 每模拟日的秒数
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// 单粒子水平随机游走位移 [km]
///
/// `scale_user` 为用户全局倍率（0 时位移恒为零），
/// `scale_species` 为物种扩散倍率。
pub fn horizontal_kick(
    k_m2s: f64,
    scale_user: f64,
    scale_species: f64,
    dt_days: f64,
    rng: &mut DriftRng,
) -> DVec2 {
    let dt_s = dt_days * SECONDS_PER_DAY;
    let variance = 2.0 * k_m2s * scale_user * scale_species * dt_s;
    let step_km = variance.max(0.0).sqrt() / 1000.0;
    let (gx, gy) = rng.normal_pair();
    DVec2::new(step_km * gx, step_km * gy)
}
