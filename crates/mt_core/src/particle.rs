// crates/mt_core/src/particle.rs

//! 粒子记录
//!
//! 一个粒子代表释放总量中的一份虚拟水团。非激活粒子的位置、
//! 年龄、质量无意义；激活粒子满足 0 ≤ depth ≤ 1 km、mass ≥ 0。

use crate::tracer::TracerId;
use smallvec::SmallVec;

/// 尾迹最大长度
pub const MAX_TRAIL_LEN: usize = 8;

/// 尾迹点 (x, y, depth)，单位 km
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// 上一步实际使用的积分器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorTag {
    /// 尚未积分
    None,
    /// 一阶欧拉
    Euler,
    /// 四阶 Runge–Kutta
    Rk4,
}

/// 粒子记录
#[derive(Debug, Clone)]
pub struct Particle {
    /// 运行内唯一编号
    pub id: u32,
    /// 激活位
    pub active: bool,
    /// 物种句柄
    pub species: TracerId,
    /// 相对释放原点的东向位移 [km]
    pub x_km: f64,
    /// 相对释放原点的北向位移 [km]
    pub y_km: f64,
    /// 深度 [km]，0 = 海面，向下为正
    pub depth_km: f64,
    /// 自释放以来的模拟天数
    pub age_days: f64,
    /// 剩余质量/活度（基准单位）
    pub mass: f64,
    /// 释放时的初始质量
    pub initial_mass: f64,
    /// 最近一次计算的浓度
    pub concentration: f64,
    /// 上一步采样的流速 u [m/s]
    pub last_u: f64,
    /// 上一步采样的流速 v [m/s]
    pub last_v: f64,
    /// 最近位置尾迹（最旧在前）
    pub trail: SmallVec<[TrailPoint; MAX_TRAIL_LEN]>,
    /// 上一步使用的积分器
    pub integrator: IntegratorTag,
}

impl Particle {
    /// 创建非激活的空槽位
    #[must_use]
    pub fn vacant(id: u32, species: TracerId) -> Self {
        Self {
            id,
            active: false,
            species,
            x_km: 0.0,
            y_km: 0.0,
            depth_km: 0.0,
            age_days: 0.0,
            mass: 0.0,
            initial_mass: 0.0,
            concentration: 0.0,
            last_u: 0.0,
            last_v: 0.0,
            trail: SmallVec::new(),
            integrator: IntegratorTag::None,
        }
    }

    /// 当前位置作为尾迹点
    #[must_use]
    pub fn position(&self) -> TrailPoint {
        TrailPoint {
            x: self.x_km,
            y: self.y_km,
            depth: self.depth_km,
        }
    }

    /// 追加尾迹点，超长时淘汰最旧的
    pub fn push_trail(&mut self, point: TrailPoint) {
        if self.trail.len() == MAX_TRAIL_LEN {
            self.trail.remove(0);
        }
        self.trail.push(point);
    }
}
