// crates/mt_core/src/lib.rs

//! MariTrace 基础层
//!
//! 提供拉格朗日示踪剂模拟的领域数据模型，不包含任何求解或 IO 逻辑：
//!
//! - [`error`]: 基础错误类型
//! - [`units`]: 释放量单位与基准单位换算
//! - [`tracer`]: 示踪剂种类目录（核素、油类、颗粒物等）
//! - [`geo`]: 平面近似的经纬度/公里换算
//! - [`rng`]: 可播种的运行随机源（Box–Muller 正态抽样）
//! - [`particle`]: 粒子记录与轨迹尾迹
//! - [`pool`]: 固定容量粒子池（emit/retire 语义）
//! - [`schedule`]: 多阶段释放计划与小数累加器
//! - [`clock`]: 墙钟 → 模拟日的时钟映射
//!
//! # 设计原则
//!
//! 1. **数据与求解分离**：本层只存储状态，物理更新在 mt_physics
//! 2. **零逐步分配**：粒子池在构造时一次分配，之后只翻转激活位
//! 3. **可复现**：所有随机抽样经由 [`rng::DriftRng`]，同种子同轨迹

pub mod clock;
pub mod error;
pub mod geo;
pub mod particle;
pub mod pool;
pub mod rng;
pub mod schedule;
pub mod tracer;
pub mod units;

pub use clock::SimulationClock;
pub use error::{CoreError, CoreResult};
pub use geo::{ReleaseOrigin, LAT_KM_PER_DEG, LON_KM_PER_DEG};
pub use particle::{IntegratorTag, Particle, TrailPoint, MAX_TRAIL_LEN};
pub use pool::{EmitSettings, ParticlePool, PoolCounters};
pub use rng::DriftRng;
pub use schedule::{ReleasePhase, ReleaseSchedule};
pub use tracer::{registry, TracerBehavior, TracerDescriptor, TracerId, TracerKind};
pub use units::ReleaseUnit;
