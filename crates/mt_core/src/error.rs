// crates/mt_core/src/error.rs

//! 基础错误类型
//!
//! 定义领域层的配置类错误。数据访问错误（文件缺失、二进制损坏）
//! 属于 mt_data 层，不在此定义；两者在引擎层汇聚。

use thiserror::Error;

/// 统一结果类型别名
pub type CoreResult<T> = Result<T, CoreError>;

/// 领域层配置错误
///
/// 所有变体都表示"运行不应启动"级别的问题。
#[derive(Debug, Error)]
pub enum CoreError {
    /// 配置字段无效
    #[error("配置无效: {message}")]
    InvalidConfig {
        /// 说明无效原因
        message: String,
    },

    /// 未知的示踪剂标识
    #[error("未知的示踪剂: {id}")]
    UnknownTracer { id: String },

    /// 未知的释放量单位
    #[error("未知的释放量单位: {unit}")]
    UnknownUnit { unit: String },

    /// 释放阶段区间倒置或总量非正
    #[error("释放阶段无效: start={start}, end={end}, total={total}")]
    InvalidPhase { start: f64, end: f64, total: f64 },

    /// 释放阶段与已有阶段重叠
    #[error("释放阶段重叠: [{start}, {end}) 与已有阶段冲突")]
    OverlappingPhase { start: f64, end: f64 },

    /// 日期范围非升序
    #[error("日期范围无效: {start} >= {end}")]
    InvalidDateRange { start: String, end: String },
}

impl CoreError {
    /// 创建配置无效错误
    #[inline]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
