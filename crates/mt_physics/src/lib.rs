// crates/mt_physics/src/lib.rs

//! MariTrace 物理层
//!
//! 对粒子池施加单步物理更新，依赖注入的场采样接口：
//!
//! - [`fields`]: 流场/扩散度采样 trait（档案实现在引擎层桥接）
//! - [`advection`]: 一阶欧拉与自适应子步 RK4 平流
//! - [`diffusion`]: 水平 Markov 随机游走
//! - [`vertical`]: 垂向随机游走 + Ekman 抽吸 + 冬季对流 + 沉降
//! - [`decay`]: 半衰期衰变与蒸发质量损失
//! - [`concentration`]: 羽流体积浓度模型
//! - [`stepper`]: 单步编排（平流→水平扩散→陆地拒绝→垂向→衰变→浓度→尾迹）
//!
//! 粒子间相互独立；一步之内所有粒子看到同一天的场和同一 δt。
//! 单线程顺序更新保证同种子逐位复现。

pub mod advection;
pub mod concentration;
pub mod decay;
pub mod diffusion;
pub mod fields;
pub mod stepper;
pub mod vertical;

pub use advection::{advect, AdvectionOutcome, AdvectionScheme, Rk4Settings, MS_TO_KM_PER_DAY};
pub use concentration::{concentration_of, initial_concentration, plume_volume_m3};
pub use decay::{update_mass, MassUpdate, RETIREMENT_MASS_FRACTION};
pub use diffusion::{horizontal_kick, K_FALLBACK_M2_S, SECONDS_PER_DAY};
pub use fields::{CurrentSampler, DiffusivitySampler, VelocitySample};
pub use stepper::{step_particles, StepSettings, StepStats};
pub use vertical::{kz_m2s, vertical_step, winter_convection, VerticalSettings};
