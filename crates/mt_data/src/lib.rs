// crates/mt_data/src/lib.rs

//! MariTrace 档案层
//!
//! 读取预计算的逐日海洋再分析档案并提供点查询：
//!
//! - [`error`]: 数据层错误（文件缺失 / 版本不支持 / 二进制损坏）
//! - [`half`]: IEEE-754 binary16 编解码
//! - [`binary`]: 日文件二进制格式的读写
//! - [`metadata`]: 档案元数据（JSON）与日期解析
//! - [`spatial`]: 分桶最近网格单元索引
//! - [`cache`]: 日数据包 LRU 缓存（活动日固定、并发加载去重）
//! - [`currents`]: 三维逐日流场档案
//! - [`diffusivity`]: 二维逐日涡动扩散度档案（半精度存储）
//!
//! 数据包由缓存独占持有；查询方拿到的 `*DayView` 只在一个
//! 时间步内使用，不延长数据包生命周期之外的所有权。

pub mod binary;
pub mod cache;
pub mod currents;
pub mod diffusivity;
pub mod error;
pub mod half;
pub mod metadata;
pub mod spatial;

pub use binary::{CurrentDayFile, CurrentHeader, DiffusivityDayFile, DiffusivityHeader, EkeCoordsFile};
pub use cache::LruDayCache;
pub use currents::{is_land_value, CurrentArchive, CurrentDayView, VelocitySample};
pub use diffusivity::{DiffusivityArchive, DiffusivityDayView, K_CEIL_M2_S, K_FLOOR_M2_S};
pub use error::{DataError, DataResult};
pub use metadata::{ArchiveMetadata, DayEntry};
pub use spatial::{SpatialIndex, SpatialIndexConfig};
