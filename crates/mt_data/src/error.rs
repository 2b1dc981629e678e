// crates/mt_data/src/error.rs

//! 数据层错误类型
//!
//! 错误分类与传播策略：
//!
//! - [`DataError::DataUnavailable`]：文件或元数据缺失。运行启动前
//!   出现则拒绝启动；运行中出现则在上一个完成步处停机。
//! - [`DataError::UnsupportedFormat`] / [`DataError::CorruptBinary`]：
//!   版本不受支持、尺寸不符、偏移越界。策略同上。
//!
//! 逐粒子的查询落空（出网格、附近无海洋单元）不是错误，
//! 由调用方以 `found = false` / `None` 就地恢复。

use std::path::PathBuf;
use thiserror::Error;

/// 数据层结果类型别名
pub type DataResult<T> = Result<T, DataError>;

/// 数据层错误
#[derive(Debug, Error)]
pub enum DataError {
    /// 日文件或元数据缺失/不可读
    #[error("数据不可用: {path}: {reason}")]
    DataUnavailable {
        /// 请求的路径
        path: PathBuf,
        /// 底层原因
        reason: String,
    },

    /// 格式版本不受支持
    #[error("不支持的格式版本: {path}: 文件版本 {found}, 支持 {supported}")]
    UnsupportedFormat {
        path: PathBuf,
        found: i32,
        supported: &'static str,
    },

    /// 二进制内容损坏（截断、尺寸不符、偏移越界）
    #[error("二进制数据损坏: {path}: {reason}")]
    CorruptBinary { path: PathBuf, reason: String },
}

impl DataError {
    /// 文件不可用
    #[inline]
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// 二进制损坏
    #[inline]
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptBinary {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// 版本不受支持
    #[inline]
    pub fn unsupported(path: impl Into<PathBuf>, found: i32, supported: &'static str) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            found,
            supported,
        }
    }
}
