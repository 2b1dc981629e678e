// crates/mt_core/src/pool.rs

//! 固定容量粒子池
//!
//! 池在构造时一次性分配全部槽位，之后 emit/retire 只翻转激活位，
//! 逐步运行中没有堆分配。释放位置围绕释放原点做 Box–Muller
//! 正态散布，落在陆地上的采样点被拒绝并重采样。

use crate::geo::{ReleaseOrigin, LON_KM_PER_DEG};
use crate::particle::{IntegratorTag, Particle};
use crate::rng::DriftRng;
use crate::tracer::TracerId;

/// 释放位置采样参数
#[derive(Debug, Clone, Copy)]
pub struct EmitSettings {
    /// 散布标准差 [km]
    pub sigma_km: f64,
    /// 陆地拒绝的最大重采样次数
    pub max_attempts: usize,
}

impl Default for EmitSettings {
    fn default() -> Self {
        Self {
            sigma_km: 30.0,
            max_attempts: 1000,
        }
    }
}

/// 守恒计数
///
/// 任意时刻满足 active + decayed + vacant(曾释放后退役以外) 的
/// 守恒关系：`released == active_count + decayed`。
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolCounters {
    /// 累计释放粒子数
    pub released: u64,
    /// 因质量衰减退役的粒子数
    pub decayed: u64,
}

/// 固定容量粒子池
///
/// 粒子存储的唯一所有者；积分器与快照层只拿到借用视图。
pub struct ParticlePool {
    particles: Vec<Particle>,
    counters: PoolCounters,
    next_id: u32,
}

impl ParticlePool {
    /// 创建容量为 `capacity` 的池
    #[must_use]
    pub fn new(capacity: usize, species: TracerId) -> Self {
        let particles = (0..capacity)
            .map(|i| Particle::vacant(i as u32, species))
            .collect();
        Self {
            particles,
            counters: PoolCounters::default(),
            next_id: capacity as u32,
        }
    }

    /// 池容量
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// 当前激活粒子数
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    /// 守恒计数
    #[must_use]
    pub fn counters(&self) -> PoolCounters {
        self.counters
    }

    /// 全部槽位的只读视图
    #[must_use]
    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    /// 激活粒子迭代
    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.active)
    }

    /// 下标访问（积分器使用）
    #[must_use]
    pub fn get_mut(&mut self, idx: usize) -> &mut Particle {
        &mut self.particles[idx]
    }

    /// 激活粒子的下标列表
    #[must_use]
    pub fn active_indices(&self) -> Vec<usize> {
        self.particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active)
            .map(|(i, _)| i)
            .collect()
    }

    /// 释放一个粒子
    ///
    /// 围绕原点正态散布（±3σ 截断），落在陆地上的位置重采样至多
    /// `max_attempts` 次。池满或重采样耗尽时返回 `None`，不报错；
    /// 释放计划的累加器保留未释放的份额。
    ///
    /// # 参数
    /// - `is_ocean`: 经纬度 → 是否海洋 的判定
    pub fn emit<F>(
        &mut self,
        rng: &mut DriftRng,
        origin: &ReleaseOrigin,
        species: TracerId,
        mass: f64,
        concentration: f64,
        settings: &EmitSettings,
        is_ocean: F,
    ) -> Option<usize>
    where
        F: Fn(f64, f64) -> bool,
    {
        let slot = self.particles.iter().position(|p| !p.active)?;

        let sigma_deg = settings.sigma_km / LON_KM_PER_DEG;
        let mut found = None;
        for _ in 0..settings.max_attempts.max(1) {
            let (gx, gy) = rng.normal_pair();
            let dlon = (gx * sigma_deg).clamp(-3.0 * sigma_deg, 3.0 * sigma_deg);
            let dlat = (gy * sigma_deg).clamp(-3.0 * sigma_deg, 3.0 * sigma_deg);
            let lon = origin.lon + dlon;
            let lat = origin.lat + dlat;
            if is_ocean(lon, lat) {
                found = Some((lon, lat));
                break;
            }
        }
        let Some((lon, lat)) = found else {
            tracing::debug!(
                "释放位置重采样 {} 次后放弃（释放点周围全是陆地？）",
                settings.max_attempts
            );
            return None;
        };

        let xy = origin.to_km(lon, lat);
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let p = &mut self.particles[slot];
        p.id = id;
        p.active = true;
        p.species = species;
        p.x_km = xy.x;
        p.y_km = xy.y;
        p.depth_km = 0.0;
        p.age_days = 0.0;
        p.mass = mass;
        p.initial_mass = mass;
        p.concentration = concentration;
        p.last_u = 0.0;
        p.last_v = 0.0;
        p.trail.clear();
        let pos = p.position();
        p.trail.push(pos);
        p.integrator = IntegratorTag::None;

        self.counters.released += 1;
        Some(slot)
    }

    /// 批量释放，返回实际释放数
    #[allow(clippy::too_many_arguments)]
    pub fn emit_many<F>(
        &mut self,
        count: u64,
        rng: &mut DriftRng,
        origin: &ReleaseOrigin,
        species: TracerId,
        mass: f64,
        concentration: f64,
        settings: &EmitSettings,
        is_ocean: F,
    ) -> u64
    where
        F: Fn(f64, f64) -> bool,
    {
        let mut emitted = 0;
        for _ in 0..count {
            if self
                .emit(rng, origin, species, mass, concentration, settings, &is_ocean)
                .is_none()
            {
                break;
            }
            emitted += 1;
        }
        emitted
    }

    /// 因质量低于阈值退役
    pub fn retire_decayed(&mut self, idx: usize) {
        let p = &mut self.particles[idx];
        if p.active {
            p.active = false;
            self.counters.decayed += 1;
        }
    }

    /// 清空全部粒子与计数
    pub fn reset(&mut self) {
        for p in &mut self.particles {
            p.active = false;
            p.trail.clear();
        }
        self.counters = PoolCounters::default();
    }
}
