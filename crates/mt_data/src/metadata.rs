// crates/mt_data/src/metadata.rs

//! 档案元数据
//!
//! 每个档案附带一份 JSON 元数据，列出数据集标识、逐日条目
//! （日期、文件名、日偏移）、网格形状，流场档案另有深度层列表。
//! 元数据缺失按 [`DataError::DataUnavailable`] 处理，解析失败按
//! [`DataError::CorruptBinary`] 处理。

use crate::error::{DataError, DataResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 逐日条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEntry {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// 日文件路径（相对元数据所在目录）
    pub file: String,
    /// 距档案首日的天数
    #[serde(default)]
    pub day_offset: i64,
}

impl DayEntry {
    /// 条目日期
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// 档案元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// 数据集标识
    pub dataset: String,
    /// 描述
    #[serde(default)]
    pub description: String,
    /// 网格形状 [n_lat, n_lon]
    pub grid_shape: [usize; 2],
    /// 深度层列表 [m]，流场档案使用；浅层在前
    #[serde(default)]
    pub depths_m: Vec<f64>,
    /// 共享坐标文件（扩散度档案使用）
    #[serde(default)]
    pub coords_file: Option<String>,
    /// 逐日条目
    pub days: Vec<DayEntry>,
}

impl ArchiveMetadata {
    /// 加载并排序元数据
    pub fn load(path: &Path) -> DataResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DataError::unavailable(path, e.to_string()))?;
        let mut meta: Self = serde_json::from_str(&text)
            .map_err(|e| DataError::corrupt(path, format!("JSON 解析失败: {}", e)))?;

        for entry in &meta.days {
            if entry.date().is_none() {
                return Err(DataError::corrupt(
                    path,
                    format!("条目日期无效: {}-{}-{}", entry.year, entry.month, entry.day),
                ));
            }
        }
        meta.days.sort_by_key(|e| e.date());
        Ok(meta)
    }

    /// 精确匹配某日期的条目
    #[must_use]
    pub fn resolve_exact(&self, date: NaiveDate) -> Option<&DayEntry> {
        self.days.iter().find(|e| e.date() == Some(date))
    }

    /// 日期夹取解析
    ///
    /// 返回日期键不小于目标的最小条目；若目标晚于全部条目，
    /// 返回最晚的一个。不做插值。
    #[must_use]
    pub fn resolve_clamped(&self, date: NaiveDate) -> Option<&DayEntry> {
        self.days
            .iter()
            .find(|e| e.date().map(|d| d >= date).unwrap_or(false))
            .or_else(|| self.days.last())
    }

    /// 档案覆盖的日期范围
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.days.first()?.date()?;
        let last = self.days.last()?.date()?;
        Some((first, last))
    }

    /// 单元数
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.grid_shape[0] * self.grid_shape[1]
    }
}
