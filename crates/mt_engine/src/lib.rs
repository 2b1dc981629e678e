// crates/mt_engine/src/lib.rs

//! MariTrace 运行层
//!
//! 把基础层、档案层与物理层装配成一次完整的模拟运行：
//!
//! - [`error`]: 运行层错误与退出码映射
//! - [`config`]: 模拟配置与校验
//! - [`context`]: 档案字段源（把日视图桥接到物理层采样接口）
//! - [`simulation`]: 步进循环（时钟 → 释放 → 积分 → 快照）
//! - [`snapshot`]: 外部消费者的只读粒子快照
//! - [`events`]: 进度事件的监听器/分发器
//! - [`prerender`]: 固定步长批处理与回放帧缓冲
//!
//! 调度模型为模拟步粒度的单线程协作式：一步内的释放、平流、
//! 扩散、衰变、浓度更新全部完成后才进入下一步。

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod prerender;
pub mod simulation;
pub mod snapshot;

pub use config::{PhaseConfig, SimulationConfig};
pub use context::{ArchiveFieldSource, FieldSource, PinnedFields};
pub use error::{EngineError, EngineResult};
pub use events::{EventDispatcher, FnListener, LoggingListener, RunEvent, RunListener};
pub use prerender::{prerender, FrameBuffer, PrerenderConfig};
pub use simulation::Simulation;
pub use snapshot::{ParticleRecord, SnapshotFrame};
