// crates/mt_physics/src/advection.rs

//! 平流积分
//!
//! 两种方案的标签分发：一阶欧拉，或自适应子步的四阶
//! Runge–Kutta。RK4 的子步长按局地流速选取：
//!
//! ```text
//! h = clamp(safety / (|v| + ε), min_step, min(max_step, δt))
//! n = ⌈δt / h⌉，实际子步长 δt / n
//! ```
//!
//! 每个子步的四个斜率在同一天的场上按前一斜率位移后的位置
//! 采样。k₂/k₃/k₄ 任一未命中时该子步退化为欧拉；k₁ 未命中
//! （粒子出网格）时剩余子步的平流贡献为零，由调用方计入
//! 查询落空计数。

use crate::fields::{CurrentSampler, VelocitySample};
use glam::DVec2;
use mt_core::geo::ReleaseOrigin;
use mt_core::particle::IntegratorTag;
use serde::{Deserialize, Serialize};

/// m/s → km/day
pub const MS_TO_KM_PER_DAY: f64 = 86.4;

/// RK4 自适应子步参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rk4Settings {
    /// 子步安全距离 [km]
    pub safety_km: f64,
    /// 子步长下限 [day]
    pub min_step_days: f64,
    /// 子步长上限 [day]
    pub max_step_days: f64,
}

impl Default for Rk4Settings {
    fn default() -> Self {
        Self {
            safety_km: 2.0,
            min_step_days: 1.0 / 96.0,
            max_step_days: 0.25,
        }
    }
}

/// 平流方案
#[derive(Debug, Clone, Copy)]
pub enum AdvectionScheme {
    /// 一阶欧拉
    Euler,
    /// 自适应子步 RK4
    Rk4(Rk4Settings),
}

/// 单粒子平流结果
#[derive(Debug, Clone, Copy)]
pub struct AdvectionOutcome {
    /// 本步位移 [km]
    pub displacement_km: DVec2,
    /// 起点采样的 u [m/s]（自适应步长启发式用）
    pub last_u_ms: f64,
    /// 起点采样的 v [m/s]
    pub last_v_ms: f64,
    /// 起点采样是否命中
    pub found: bool,
    /// 实际使用的积分器
    pub tag: IntegratorTag,
}

impl AdvectionOutcome {
    fn miss(tag: IntegratorTag) -> Self {
        Self {
            displacement_km: DVec2::ZERO,
            last_u_ms: 0.0,
            last_v_ms: 0.0,
            found: false,
            tag,
        }
    }
}

#[inline]
fn slope_km_per_day(s: &VelocitySample) -> DVec2 {
    DVec2::new(s.u_ms * MS_TO_KM_PER_DAY, s.v_ms * MS_TO_KM_PER_DAY)
}

/// 平流一个粒子
pub fn advect<C: CurrentSampler + ?Sized>(
    scheme: &AdvectionScheme,
    currents: &C,
    origin: &ReleaseOrigin,
    position_km: DVec2,
    depth_m: f64,
    dt_days: f64,
) -> AdvectionOutcome {
    let sample = |pos: DVec2| -> VelocitySample {
        let (lon, lat) = origin.to_lonlat(pos);
        currents.velocity(lon, lat, depth_m)
    };

    match scheme {
        AdvectionScheme::Euler => {
            let k1 = sample(position_km);
            if !k1.found {
                return AdvectionOutcome::miss(IntegratorTag::Euler);
            }
            AdvectionOutcome {
                displacement_km: slope_km_per_day(&k1) * dt_days,
                last_u_ms: k1.u_ms,
                last_v_ms: k1.v_ms,
                found: true,
                tag: IntegratorTag::Euler,
            }
        }
        AdvectionScheme::Rk4(cfg) => {
            let first = sample(position_km);
            if !first.found {
                return AdvectionOutcome::miss(IntegratorTag::Rk4);
            }
            let speed = slope_km_per_day(&first).length();
            let h = (cfg.safety_km / (speed + 1e-6))
                .clamp(cfg.min_step_days, cfg.max_step_days.min(dt_days));
            let n = (dt_days / h).ceil().max(1.0) as usize;
            let h = dt_days / n as f64;

            let mut pos = position_km;
            for _ in 0..n {
                let k1 = sample(pos);
                if !k1.found {
                    // 子步起点出网格，剩余平流贡献为零
                    break;
                }
                let s1 = slope_km_per_day(&k1);
                let k2 = sample(pos + s1 * (h / 2.0));
                let k3 = sample(pos + slope_km_per_day(&k2) * (h / 2.0));
                let k4 = sample(pos + slope_km_per_day(&k3) * h);

                let slope = if k2.found && k3.found && k4.found {
                    (s1 + slope_km_per_day(&k2) * 2.0 + slope_km_per_day(&k3) * 2.0
                        + slope_km_per_day(&k4))
                        / 6.0
                } else {
                    // 欧拉回退
                    s1
                };
                pos += slope * h;
            }

            AdvectionOutcome {
                displacement_km: pos - position_km,
                last_u_ms: first.u_ms,
                last_v_ms: first.v_ms,
                found: true,
                tag: IntegratorTag::Rk4,
            }
        }
    }
}
