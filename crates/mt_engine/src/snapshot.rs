// crates/mt_engine/src/snapshot.rs

//! 粒子快照
//!
//! 外部消费者（渲染层、导出、回放）拿到的只读深拷贝视图。
//! 快照不持有池的引用，捕获后与模拟状态完全解耦。

use chrono::NaiveDate;
use mt_core::pool::ParticlePool;
use serde::{Deserialize, Serialize};

/// 单粒子记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub id: u32,
    pub x_km: f64,
    pub y_km: f64,
    pub depth_km: f64,
    pub concentration: f64,
    pub age_days: f64,
    pub mass: f64,
    pub active: bool,
    pub species_id: String,
    /// 最近位置尾迹 (x, y, depth)
    pub trail: Vec<(f64, f64, f64)>,
}

/// 一帧快照
///
/// 不变量：帧序列按 `sim_day` 严格递增。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFrame {
    /// 模拟日
    pub sim_day: f64,
    /// 模拟日历日期（UTC）
    pub date_utc: NaiveDate,
    /// 累计释放粒子数
    pub released_total: u64,
    /// 累计衰变退役粒子数
    pub decayed_total: u64,
    /// 当前激活粒子数
    pub active_count: usize,
    /// 本步困在陆地附近的粒子数（gauge）
    pub particles_on_land: usize,
    /// 激活粒子最大深度 [m]
    pub max_depth_m: f64,
    /// 激活粒子最大浓度
    pub max_concentration: f64,
    /// 激活粒子记录
    pub particles: Vec<ParticleRecord>,
}

impl SnapshotFrame {
    /// 从粒子池捕获一帧
    #[must_use]
    pub fn capture(
        pool: &ParticlePool,
        sim_day: f64,
        date_utc: NaiveDate,
        particles_on_land: usize,
        max_depth_m: f64,
        max_concentration: f64,
    ) -> Self {
        let counters = pool.counters();
        let particles: Vec<ParticleRecord> = pool
            .iter_active()
            .map(|p| ParticleRecord {
                id: p.id,
                x_km: p.x_km,
                y_km: p.y_km,
                depth_km: p.depth_km,
                concentration: p.concentration,
                age_days: p.age_days,
                mass: p.mass,
                active: p.active,
                species_id: p.species.descriptor().id.to_string(),
                trail: p.trail.iter().map(|t| (t.x, t.y, t.depth)).collect(),
            })
            .collect();

        Self {
            sim_day,
            date_utc,
            released_total: counters.released,
            decayed_total: counters.decayed,
            active_count: particles.len(),
            particles_on_land,
            max_depth_m,
            max_concentration,
            particles,
        }
    }
}
