// crates/mt_physics/src/concentration.rs

//! 浓度模型
//!
//! 每个粒子代表一团以 (σ_h, σ_v) 为尺度的高斯羽流；
//! 基础浓度为 质量 / 羽流体积，再按物种分类换算：
//!
//! - 放射性核素：×1000 可视化倍率，夹到 [10⁻⁶, 10⁶] Bq/m³
//! - 烃类：10 m 以浅按 1 mm 油膜厚度折算面密度 kg/m²，否则 ppm
//! - 颗粒物：mg/L
//! - 污染物：ppb
//! - 生物类：个体/m³

use mt_core::tracer::{TracerBehavior, TracerDescriptor, TracerKind};
use std::f64::consts::PI;

/// 放射性核素的可视化倍率
pub const RADIONUCLIDE_DISPLAY_SCALE: f64 = 1000.0;
/// 羽流体积下限 [m³]
pub const MIN_PLUME_VOLUME_M3: f64 = 1e9;
/// 表层油膜厚度 [m]
pub const SURFACE_SLICK_THICKNESS_M: f64 = 1e-3;
/// 海水密度 [kg/m³]
pub const WATER_DENSITY_KG_M3: f64 = 1000.0;
/// 表层判定深度 [km]
pub const SURFACE_LAYER_KM: f64 = 0.01;

/// 高斯羽流体积 (2π)^{3/2}·σ_h²·σ_v，下限 10⁹ m³
#[must_use]
pub fn plume_volume_m3(behavior: &TracerBehavior) -> f64 {
    let v = (2.0 * PI).powf(1.5) * behavior.sigma_h_m * behavior.sigma_h_m * behavior.sigma_v_m;
    v.max(MIN_PLUME_VOLUME_M3)
}

/// 粒子浓度
#[must_use]
pub fn concentration_of(mass: f64, depth_km: f64, descriptor: &TracerDescriptor) -> f64 {
    let volume = plume_volume_m3(&descriptor.behavior);
    let base = mass / volume;

    match descriptor.kind {
        TracerKind::Radionuclide => {
            (base * RADIONUCLIDE_DISPLAY_SCALE).clamp(1e-6, 1e6)
        }
        TracerKind::Hydrocarbon => {
            if depth_km < SURFACE_LAYER_KM {
                // 表层油膜面密度 [kg/m²]
                base * SURFACE_SLICK_THICKNESS_M
            } else {
                // 水中 ppm
                base / WATER_DENSITY_KG_M3 * 1e6
            }
        }
        TracerKind::Particulate => base * 1000.0,
        TracerKind::Pollutant => base / WATER_DENSITY_KG_M3 * 1e9,
        TracerKind::Biological => base,
    }
}

/// 释放时刻的浓度（表层）
#[must_use]
pub fn initial_concentration(mass: f64, descriptor: &TracerDescriptor) -> f64 {
    concentration_of(mass, 0.0, descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_core::tracer;

    #[test]
    fn test_plume_volume_floor() {
        let desc = tracer::find("fish_larvae").unwrap().descriptor();
        // σ_h = 500, σ_v = 20 ⇒ (2π)^1.5·5e6 ≈ 7.87e7 < 1e9，触发下限
        assert_eq!(plume_volume_m3(&desc.behavior), MIN_PLUME_VOLUME_M3);

        let cs = tracer::find("cs137").unwrap().descriptor();
        // σ_h = 2000, σ_v = 50 ⇒ ≈ 3.15e9，超过下限
        let v = plume_volume_m3(&cs.behavior);
        assert!(v > MIN_PLUME_VOLUME_M3);
        assert!((v - (2.0 * PI).powf(1.5) * 2000.0 * 2000.0 * 50.0).abs() < 1.0);
    }

    #[test]
    fn test_radionuclide_clamped() {
        let desc = tracer::find("cs137").unwrap().descriptor();
        // 极小质量夹到下限
        assert_eq!(concentration_of(1e-30, 0.0, desc), 1e-6);
        // 极大质量夹到上限
        assert_eq!(concentration_of(1e30, 0.0, desc), 1e6);
        // 中间量程不夹
        let v = plume_volume_m3(&desc.behavior);
        let c = concentration_of(v, 0.0, desc);
        assert!((c - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_hydrocarbon_surface_vs_depth() {
        let desc = tracer::find("crude_oil").unwrap().descriptor();
        let surface = concentration_of(1000.0, 0.0, desc);
        let deep = concentration_of(1000.0, 0.5, desc);
        // 表层面密度与水中 ppm 是不同量纲的数
        let volume = plume_volume_m3(&desc.behavior);
        assert!((surface - 1000.0 / volume * 1e-3).abs() < 1e-18);
        assert!((deep - 1000.0 / volume / 1000.0 * 1e6).abs() < 1e-12);
    }

    #[test]
    fn test_biological_plain_density() {
        let desc = tracer::find("fish_larvae").unwrap().descriptor();
        let c = concentration_of(2e9, 0.2, desc);
        assert!((c - 2.0).abs() < 1e-12);
    }
}
