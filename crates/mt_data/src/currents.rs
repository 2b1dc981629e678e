// crates/mt_data/src/currents.rs

//! 三维逐日流场档案
//!
//! 提供任意 (lon, lat, depth, date) 的 (u, v) 查询。日数据包
//! 经 LRU 缓存按需加载；空间索引附着在跨日不变的网格上，
//! 首次加载时构建一次。
//!
//! 查询以 [`CurrentDayView`] 进行：一次取得某天的视图后，
//! 该步内的全部粒子查询只付一次索引查找加一次数组读取，
//! 满足批量查询的 O(|positions|) 吞吐约定。

use crate::binary::{CurrentDayFile, CurrentHeader};
use crate::cache::{LruDayCache, DEFAULT_CAPACITY};
use crate::error::{DataError, DataResult};
use crate::metadata::ArchiveMetadata;
use crate::spatial::{SpatialIndex, SpatialIndexConfig};
use chrono::NaiveDate;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 陆地哨兵阈值：NaN 或绝对值超过此值均视为陆地/填充
pub const LAND_SENTINEL_ABS: f32 = 1000.0;

/// 批量查询切换到并行的阈值
const PAR_THRESHOLD: usize = 4096;

/// 存储值是否为陆地/填充
#[inline]
#[must_use]
pub fn is_land_value(v: f32) -> bool {
    v.is_nan() || v.abs() > LAND_SENTINEL_ABS
}

/// 单点流速采样结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocitySample {
    /// 东向流速 [m/s]
    pub u: f64,
    /// 北向流速 [m/s]
    pub v: f64,
    /// 是否命中有效海洋单元
    pub found: bool,
    /// 实际选取的深度层 [m]
    pub chosen_depth_m: f64,
}

impl VelocitySample {
    /// 未命中
    #[must_use]
    pub fn miss(chosen_depth_m: f64) -> Self {
        Self {
            u: 0.0,
            v: 0.0,
            found: false,
            chosen_depth_m,
        }
    }
}

/// 一天的流场数据包
pub struct CurrentBundle {
    file: CurrentDayFile,
}

impl CurrentBundle {
    /// 文件头
    #[must_use]
    pub fn header(&self) -> &CurrentHeader {
        self.file.header()
    }
}

/// 流场档案
pub struct CurrentArchive {
    root: PathBuf,
    metadata: ArchiveMetadata,
    depths_m: Arc<Vec<f64>>,
    index_cfg: SpatialIndexConfig,
    cache: LruDayCache<CurrentBundle>,
    /// 网格跨日不变，索引建一次
    index: RwLock<Option<Arc<SpatialIndex>>>,
}

impl CurrentArchive {
    /// 打开档案（默认索引参数）
    pub fn open(metadata_path: &Path) -> DataResult<Self> {
        Self::open_with_config(metadata_path, SpatialIndexConfig::currents())
    }

    /// 打开档案并指定索引参数
    pub fn open_with_config(
        metadata_path: &Path,
        index_cfg: SpatialIndexConfig,
    ) -> DataResult<Self> {
        let metadata = ArchiveMetadata::load(metadata_path)?;
        let root = metadata_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let depths_m = if metadata.depths_m.is_empty() {
            Arc::new(vec![0.0])
        } else {
            Arc::new(metadata.depths_m.clone())
        };
        tracing::info!(
            "流场档案打开: {} ({} 天, {} 层)",
            metadata.dataset,
            metadata.days.len(),
            depths_m.len()
        );
        Ok(Self {
            root,
            metadata,
            depths_m,
            index_cfg,
            cache: LruDayCache::new(DEFAULT_CAPACITY),
            index: RwLock::new(None),
        })
    }

    /// 档案元数据
    #[must_use]
    pub fn metadata(&self) -> &ArchiveMetadata {
        &self.metadata
    }

    /// 深度层列表 [m]
    #[must_use]
    pub fn depths_m(&self) -> &[f64] {
        &self.depths_m
    }

    /// 取得某天的查询视图
    ///
    /// 日期不在档案内或文件加载失败时返回错误。
    pub fn day_view(&self, date: NaiveDate) -> DataResult<CurrentDayView> {
        let entry = self.metadata.resolve_exact(date).ok_or_else(|| {
            DataError::unavailable(
                self.root.join("currents"),
                format!("日期不在档案内: {}", date),
            )
        })?;
        let path = self.root.join(&entry.file);
        let depths = self.depths_m.clone();
        let meta_shape = self.metadata.grid_shape;
        let bundle = self.cache.get_or_load(date, || {
            let file = CurrentDayFile::open(&path)?;
            let h = file.header();
            if [h.n_lat, h.n_lon] != meta_shape {
                return Err(DataError::corrupt(
                    &path,
                    format!(
                        "网格形状与元数据不符: 文件 {}×{}, 元数据 {}×{}",
                        h.n_lat, h.n_lon, meta_shape[0], meta_shape[1]
                    ),
                ));
            }
            if h.n_depth != depths.len() {
                return Err(DataError::corrupt(
                    &path,
                    format!("深度层数不符: 文件 {}, 元数据 {}", h.n_depth, depths.len()),
                ));
            }
            tracing::debug!("流场日文件加载: {} ({})", date, path.display());
            Ok(CurrentBundle { file })
        })?;

        let index = self.ensure_index(&bundle);
        Ok(CurrentDayView {
            bundle,
            index,
            depths_m: self.depths_m.clone(),
        })
    }

    fn ensure_index(&self, bundle: &CurrentBundle) -> Arc<SpatialIndex> {
        if let Some(idx) = self.index.read().as_ref() {
            return idx.clone();
        }
        let mut slot = self.index.write();
        if let Some(idx) = slot.as_ref() {
            return idx.clone();
        }
        let idx = Arc::new(SpatialIndex::build(
            bundle.file.lon(),
            bundle.file.lat(),
            &self.index_cfg,
        ));
        *slot = Some(idx.clone());
        idx
    }

    // 便捷单点接口

    /// 单点流速
    pub fn velocity_at(
        &self,
        lon: f64,
        lat: f64,
        depth_m: f64,
        date: NaiveDate,
    ) -> DataResult<VelocitySample> {
        Ok(self.day_view(date)?.velocity_at(lon, lat, depth_m))
    }

    /// 单点是否海洋
    pub fn is_ocean(&self, lon: f64, lat: f64, depth_m: f64, date: NaiveDate) -> DataResult<bool> {
        Ok(self.day_view(date)?.is_ocean(lon, lat, depth_m))
    }
}

/// 某一天的流场查询视图
///
/// 持有数据包与索引的共享句柄，只应在一个时间步内使用。
pub struct CurrentDayView {
    bundle: Arc<CurrentBundle>,
    index: Arc<SpatialIndex>,
    depths_m: Arc<Vec<f64>>,
}

impl CurrentDayView {
    /// 最接近目标深度的层下标（等距取浅层）
    #[must_use]
    pub fn layer_for(&self, depth_m: f64) -> usize {
        let mut best = 0;
        let mut best_err = f64::MAX;
        for (k, &level) in self.depths_m.iter().enumerate() {
            let err = (depth_m - level).abs();
            if err < best_err {
                best_err = err;
                best = k;
            }
        }
        best
    }

    /// 层深度 [m]
    #[must_use]
    pub fn layer_depth_m(&self, k: usize) -> f64 {
        self.depths_m[k]
    }

    /// 单点流速采样
    #[must_use]
    pub fn velocity_at(&self, lon: f64, lat: f64, depth_m: f64) -> VelocitySample {
        let k = self.layer_for(depth_m);
        let chosen = self.depths_m[k];
        let file = &self.bundle.file;
        let Some(cell) = self.index.nearest(lon, lat, file.lon(), file.lat()) else {
            return VelocitySample::miss(chosen);
        };
        let u = file.u_layer(k)[cell];
        let v = file.v_layer(k)[cell];
        if is_land_value(u) || is_land_value(v) {
            return VelocitySample::miss(chosen);
        }
        VelocitySample {
            u: u as f64,
            v: v as f64,
            found: true,
            chosen_depth_m: chosen,
        }
    }

    /// 批量流速采样（同一深度层）
    ///
    /// 大批量时并行；输出顺序与输入一致。
    #[must_use]
    pub fn velocities_at_multiple(&self, positions: &[(f64, f64)], depth_m: f64) -> Vec<VelocitySample> {
        if positions.len() >= PAR_THRESHOLD {
            positions
                .par_iter()
                .map(|&(lon, lat)| self.velocity_at(lon, lat, depth_m))
                .collect()
        } else {
            positions
                .iter()
                .map(|&(lon, lat)| self.velocity_at(lon, lat, depth_m))
                .collect()
        }
    }

    /// 是否为有效海洋点
    #[must_use]
    pub fn is_ocean(&self, lon: f64, lat: f64, depth_m: f64) -> bool {
        self.velocity_at(lon, lat, depth_m).found
    }

    /// 最近海洋单元的螺旋搜索
    ///
    /// 从目标桶开始逐环向外扩展至多 `max_radius` 个桶步，
    /// 返回所选深度层上 u 有限的最近单元。
    #[must_use]
    pub fn nearest_ocean_cell(
        &self,
        lon: f64,
        lat: f64,
        depth_m: f64,
        max_radius: usize,
    ) -> Option<usize> {
        let file = &self.bundle.file;
        let (bx, by) = self.index.bucket_of(lon, lat)?;
        let k = self.layer_for(depth_m);
        let u = file.u_layer(k);
        let (lons, lats) = (file.lon(), file.lat());

        for r in 0..=max_radius {
            let mut best: Option<(f64, usize)> = None;
            for idx in self.index.ring_candidates(bx, by, r) {
                let i = idx as usize;
                if is_land_value(u[i]) {
                    continue;
                }
                let dlon = lons[i] as f64 - lon;
                let dlat = lats[i] as f64 - lat;
                let d2 = dlon * dlon + dlat * dlat;
                match best {
                    Some((bd, bi)) if d2 > bd || (d2 == bd && i >= bi) => {}
                    _ => best = Some((d2, i)),
                }
            }
            if let Some((_, i)) = best {
                return Some(i);
            }
        }
        None
    }

    /// 单元的经纬度
    #[must_use]
    pub fn cell_lonlat(&self, cell: usize) -> (f64, f64) {
        let file = &self.bundle.file;
        (file.lon()[cell] as f64, file.lat()[cell] as f64)
    }
}
