// crates/mt_engine/src/context.rs

//! 字段源
//!
//! 物理层只认识采样 trait；本模块把档案层的日视图桥接过去。
//! [`FieldSource`] 是步进循环与数据来源之间的唯一接缝：
//! 生产路径用 [`ArchiveFieldSource`]（两个二进制档案），
//! 测试与标定注入合成实现。
//!
//! 每步开头 `pin_day` 一次：该步内所有粒子查询都走同一份
//! 数据包句柄，缓存在一步之内不会发生淘汰。

use crate::error::EngineResult;
use chrono::NaiveDate;
use mt_data::currents::{CurrentArchive, CurrentDayView};
use mt_data::diffusivity::{DiffusivityArchive, DiffusivityDayView};
use mt_physics::fields::{CurrentSampler, DiffusivitySampler, VelocitySample};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// 一步之内有效的已固定字段集
pub struct PinnedFields<'a> {
    /// 流场采样
    pub currents: Box<dyn CurrentSampler + 'a>,
    /// 扩散度采样；缺席时物理层使用 20 m²/s 回退值
    pub diffusivity: Option<Box<dyn DiffusivitySampler + 'a>>,
}

/// 步进循环的数据来源接缝
pub trait FieldSource {
    /// 固定某个日历日的字段视图
    fn pin_day(&self, date: NaiveDate) -> EngineResult<PinnedFields<'_>>;
}

/// 双档案字段源
pub struct ArchiveFieldSource {
    currents: CurrentArchive,
    diffusivity: Option<DiffusivityArchive>,
    warned_no_diffusivity: AtomicBool,
}

impl ArchiveFieldSource {
    /// 由已打开的档案构造
    #[must_use]
    pub fn new(currents: CurrentArchive, diffusivity: Option<DiffusivityArchive>) -> Self {
        Self {
            currents,
            diffusivity,
            warned_no_diffusivity: AtomicBool::new(false),
        }
    }

    /// 从元数据路径打开
    pub fn open(
        currents_metadata: &Path,
        diffusivity_metadata: Option<&Path>,
    ) -> EngineResult<Self> {
        let currents = CurrentArchive::open(currents_metadata)?;
        let diffusivity = match diffusivity_metadata {
            Some(path) => Some(DiffusivityArchive::open(path)?),
            None => None,
        };
        Ok(Self::new(currents, diffusivity))
    }

    /// 流场档案
    #[must_use]
    pub fn currents(&self) -> &CurrentArchive {
        &self.currents
    }
}

impl FieldSource for ArchiveFieldSource {
    fn pin_day(&self, date: NaiveDate) -> EngineResult<PinnedFields<'_>> {
        let current_view = self.currents.day_view(date)?;
        let diffusivity = match &self.diffusivity {
            Some(archive) => Some(Box::new(DiffusivityFieldAdapter(archive.day_view(date)?))
                as Box<dyn DiffusivitySampler>),
            None => {
                if !self.warned_no_diffusivity.swap(true, Ordering::Relaxed) {
                    tracing::warn!("扩散度档案缺席，整个运行使用 20 m²/s 回退值");
                }
                None
            }
        };
        Ok(PinnedFields {
            currents: Box::new(CurrentFieldAdapter(current_view)),
            diffusivity,
        })
    }
}

/// 流场日视图 → 物理层采样接口
struct CurrentFieldAdapter(CurrentDayView);

impl CurrentSampler for CurrentFieldAdapter {
    fn velocity(&self, lon: f64, lat: f64, depth_m: f64) -> VelocitySample {
        let s = self.0.velocity_at(lon, lat, depth_m);
        VelocitySample {
            u_ms: s.u,
            v_ms: s.v,
            found: s.found,
            chosen_depth_m: s.chosen_depth_m,
        }
    }

    fn nearest_ocean(
        &self,
        lon: f64,
        lat: f64,
        depth_m: f64,
        max_radius: usize,
    ) -> Option<(f64, f64)> {
        self.0
            .nearest_ocean_cell(lon, lat, depth_m, max_radius)
            .map(|cell| self.0.cell_lonlat(cell))
    }

    fn layer_of(&self, depth_m: f64) -> usize {
        self.0.layer_for(depth_m)
    }
}

/// 扩散度日视图 → 物理层采样接口
struct DiffusivityFieldAdapter(DiffusivityDayView);

impl DiffusivitySampler for DiffusivityFieldAdapter {
    fn k_at(&self, lon: f64, lat: f64) -> f64 {
        self.0.k_at(lon, lat)
    }
}
