// crates/mt_physics/src/stepper.rs

//! 单步编排
//!
//! 对全部激活粒子施加一个时间步的物理更新，固定顺序：
//! 平流 → 水平随机游走 → 陆地拒绝 → 垂向运动 → 质量演化 →
//! 浓度更新 → 尾迹维护。
//!
//! 粒子按最近深度层分组处理，一次层数据取用摊销到组内全部
//! 粒子。一步之内所有粒子看到同一天的场与同一 δt；粒子间
//! 无相互作用，顺序更新保证同种子逐位复现。
//!
//! 陆地拒绝：平流加扩散后的新位置若非海洋，三个坐标一并
//! 回退，向搜索半径内最近的海洋单元施加 3 km/day 的岸向
//! 推离；找不到海洋单元时粒子本步冻结，只计入 gauge，不退役。

use crate::advection::{advect, AdvectionScheme};
use crate::concentration::concentration_of;
use crate::decay::update_mass;
use crate::diffusion::{horizontal_kick, K_FALLBACK_M2_S};
use crate::fields::{CurrentSampler, DiffusivitySampler};
use crate::vertical::{vertical_step, VerticalSettings};
use chrono::{Datelike, NaiveDate};
use glam::DVec2;
use mt_core::geo::ReleaseOrigin;
use mt_core::pool::ParticlePool;
use mt_core::rng::DriftRng;

/// 单步物理参数
#[derive(Debug, Clone, Copy)]
pub struct StepSettings {
    /// 平流方案
    pub scheme: AdvectionScheme,
    /// 用户全局扩散倍率
    pub diffusivity_scale: f64,
    /// 垂向运动参数
    pub vertical: VerticalSettings,
    /// 陆地拒绝的最大搜索半径 [桶步]
    pub max_land_search_radius: usize,
    /// 岸向推离强度 [km/day]
    pub coastal_push_km_per_day: f64,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            scheme: AdvectionScheme::Rk4(Default::default()),
            diffusivity_scale: 1.0,
            vertical: VerticalSettings::default(),
            max_land_search_radius: 10,
            coastal_push_km_per_day: 3.0,
        }
    }
}

/// 单步统计
#[derive(Debug, Clone, Copy, Default)]
pub struct StepStats {
    /// 本步更新的粒子数
    pub updated: usize,
    /// 平流查询落空的粒子数（平流贡献为零）
    pub lookup_miss: usize,
    /// 困在陆地附近、本步冻结的粒子数（gauge）
    pub particles_on_land: usize,
    /// 本步因质量阈值退役的粒子数
    pub retired_decayed: usize,
    /// 本步衰变/蒸发损失的质量（含退役残余）
    pub mass_lost: f64,
    /// 激活粒子的最大深度 [m]
    pub max_depth_m: f64,
    /// 激活粒子的最大浓度
    pub max_concentration: f64,
}

/// 推进全部激活粒子一个时间步
pub fn step_particles(
    pool: &mut ParticlePool,
    currents: &dyn CurrentSampler,
    diffusivity: Option<&dyn DiffusivitySampler>,
    origin: &ReleaseOrigin,
    date: NaiveDate,
    dt_days: f64,
    rng: &mut DriftRng,
    settings: &StepSettings,
) -> StepStats {
    let mut stats = StepStats::default();
    if dt_days <= 0.0 {
        return stats;
    }
    let day_of_year = date.ordinal();

    // 按最近深度层分组，摊销层数据取用
    let mut indices = pool.active_indices();
    {
        let slice = pool.as_slice();
        indices.sort_by_key(|&i| currents.layer_of(slice[i].depth_km * 1000.0));
    }

    for idx in indices {
        let mut retire = false;
        {
            let p = pool.get_mut(idx);
            let pos0 = DVec2::new(p.x_km, p.y_km);
            let depth0_km = p.depth_km;
            let depth_m = depth0_km * 1000.0;
            let behavior = p.species.descriptor().behavior;

            // 1. 平流
            let adv = advect(&settings.scheme, currents, origin, pos0, depth_m, dt_days);
            if !adv.found {
                stats.lookup_miss += 1;
            }
            p.last_u = adv.last_u_ms;
            p.last_v = adv.last_v_ms;
            p.integrator = adv.tag;

            // 2. 水平随机游走
            let (lon0, lat0) = origin.to_lonlat(pos0);
            let k = match diffusivity {
                Some(d) => d.k_at(lon0, lat0),
                None => K_FALLBACK_M2_S,
            };
            let kick = horizontal_kick(
                k,
                settings.diffusivity_scale,
                behavior.diffusivity_factor,
                dt_days,
                rng,
            );

            // 3. 陆地拒绝
            let candidate = pos0 + adv.displacement_km + kick;
            let (lon1, lat1) = origin.to_lonlat(candidate);
            let mut stuck = false;
            let mut new_pos = candidate;
            let mut new_depth_km = depth0_km;
            if !currents.is_ocean(lon1, lat1, depth_m) {
                // 回退全部三个坐标
                new_pos = pos0;
                match currents.nearest_ocean(
                    lon1,
                    lat1,
                    depth_m,
                    settings.max_land_search_radius,
                ) {
                    Some((tlon, tlat)) => {
                        let target = origin.to_km(tlon, tlat);
                        let dir = target - pos0;
                        let len = dir.length();
                        if len > 1e-9 {
                            new_pos =
                                pos0 + dir / len * (settings.coastal_push_km_per_day * dt_days);
                        }
                    }
                    None => {
                        stuck = true;
                        stats.particles_on_land += 1;
                    }
                }
            }
            p.x_km = new_pos.x;
            p.y_km = new_pos.y;

            // 4. 垂向运动（冻结的粒子跳过）
            if !stuck {
                new_depth_km = vertical_step(
                    new_depth_km,
                    behavior.settling_m_per_day,
                    dt_days,
                    day_of_year,
                    rng,
                    &settings.vertical,
                );
            }
            p.depth_km = new_depth_km;

            // 5. 质量演化
            let upd = update_mass(p.mass, p.initial_mass, dt_days, p.species.descriptor());
            stats.mass_lost += upd.lost;
            p.mass = upd.mass;
            if upd.retire {
                // 退役残余一并计入损失，保持质量守恒账目
                stats.mass_lost += p.mass;
                p.mass = 0.0;
                retire = true;
            }

            if !retire {
                // 6. 浓度更新
                p.concentration = concentration_of(p.mass, p.depth_km, p.species.descriptor());

                // 7. 尾迹维护
                if (p.x_km - pos0.x).abs() > 1.0 || (p.y_km - pos0.y).abs() > 1.0 {
                    let point = p.position();
                    p.push_trail(point);
                }

                stats.max_depth_m = stats.max_depth_m.max(p.depth_km * 1000.0);
                stats.max_concentration = stats.max_concentration.max(p.concentration);
            }

            p.age_days += dt_days;
            stats.updated += 1;
        }
        if retire {
            pool.retire_decayed(idx);
            stats.retired_decayed += 1;
        }
    }

    tracing::trace!(
        "步进完成: {} 粒子, {} 查询落空, {} 困于陆地, {} 退役",
        stats.updated,
        stats.lookup_miss,
        stats.particles_on_land,
        stats.retired_decayed
    );
    stats
}
