// crates/mt_core/src/units.rs

//! 释放量单位
//!
//! 用户以任意常用单位申报释放总量；内部统一换算到基准单位：
//! 放射性活度以 GBq 为基准，质量以 kg 为基准。
//!
//! # 换算表
//!
//! | 单位 | 基准 | 因子 |
//! |---|---|---|
//! | Bq   | GBq | 1e-9 |
//! | GBq  | GBq | 1    |
//! | TBq  | GBq | 1e3  |
//! | PBq  | GBq | 1e6  |
//! | kg   | kg  | 1    |
//! | tons | kg  | 1e3  |

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 释放量单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseUnit {
    /// 贝可勒尔
    Bq,
    /// 吉贝可
    GBq,
    /// 太贝可
    TBq,
    /// 拍贝可
    PBq,
    /// 千克
    Kg,
    /// 吨
    Tons,
}

impl ReleaseUnit {
    /// 从字符串解析单位（大小写不敏感）
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "bq" => Ok(Self::Bq),
            "gbq" => Ok(Self::GBq),
            "tbq" => Ok(Self::TBq),
            "pbq" => Ok(Self::PBq),
            "kg" => Ok(Self::Kg),
            "t" | "ton" | "tons" => Ok(Self::Tons),
            _ => Err(CoreError::UnknownUnit {
                unit: s.to_string(),
            }),
        }
    }

    /// 换算到基准单位的因子
    #[must_use]
    pub fn to_base_factor(&self) -> f64 {
        match self {
            Self::Bq => 1e-9,
            Self::GBq => 1.0,
            Self::TBq => 1e3,
            Self::PBq => 1e6,
            Self::Kg => 1.0,
            Self::Tons => 1e3,
        }
    }

    /// 是否为放射性活度单位
    #[must_use]
    pub fn is_activity(&self) -> bool {
        matches!(self, Self::Bq | Self::GBq | Self::TBq | Self::PBq)
    }

    /// 基准单位名称
    #[must_use]
    pub fn base_label(&self) -> &'static str {
        if self.is_activity() {
            "GBq"
        } else {
            "kg"
        }
    }

    /// 将数量换算到基准单位
    #[must_use]
    pub fn to_base(&self, amount: f64) -> f64 {
        amount * self.to_base_factor()
    }
}

impl fmt::Display for ReleaseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bq => "Bq",
            Self::GBq => "GBq",
            Self::TBq => "TBq",
            Self::PBq => "PBq",
            Self::Kg => "kg",
            Self::Tons => "tons",
        };
        write!(f, "{}", s)
    }
}
