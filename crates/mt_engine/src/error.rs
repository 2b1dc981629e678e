// crates/mt_engine/src/error.rs

//! 运行层错误
//!
//! 基础层配置错误与档案层数据错误在此汇聚；批处理打包为
//! CLI 时按约定映射退出码：0 成功，2 配置无效，3 数据不可用，
//! 4 二进制损坏，5 已取消。

use mt_core::error::CoreError;
use mt_data::error::DataError;
use thiserror::Error;

/// 运行层结果类型别名
pub type EngineResult<T> = Result<T, EngineError>;

/// 运行层错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// 配置无效，运行不启动
    #[error("配置无效: {0}")]
    Config(#[from] CoreError),

    /// 数据层错误，运行不启动或停在上一个完成步
    #[error(transparent)]
    Data(#[from] DataError),

    /// 运行被调用方取消
    #[error("运行已取消")]
    Cancelled,
}

impl EngineError {
    /// 批处理 CLI 的退出码
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Data(DataError::DataUnavailable { .. }) => 3,
            Self::Data(_) => 4,
            Self::Cancelled => 5,
        }
    }
}
