// crates/mt_data/src/diffusivity.rs

//! 二维逐日涡动扩散度档案
//!
//! K 场以半精度存储，查询时解码为 f32。解码值经 NaN→20
//! 替换后夹到物理区间 [20, 500] m²/s。目标日期不在元数据
//! 日期表里时采用夹取策略：取不小于目标的最小日期键，
//! 否则取最晚一天；不做时间插值。

use crate::binary::{DiffusivityDayFile, DiffusivityHeader, EkeCoordsFile};
use crate::cache::{LruDayCache, DEFAULT_CAPACITY};
use crate::error::{DataError, DataResult};
use crate::half::f16_to_f32;
use crate::metadata::ArchiveMetadata;
use crate::spatial::{SpatialIndex, SpatialIndexConfig};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// K 的物理下限 [m²/s]
pub const K_FLOOR_M2_S: f64 = 20.0;
/// K 的物理上限 [m²/s]
pub const K_CEIL_M2_S: f64 = 500.0;

/// 解码一个存储值并施加 NaN 替换与物理夹取
#[inline]
#[must_use]
pub fn decode_k(bits: u16) -> f64 {
    let raw = f16_to_f32(bits) as f64;
    if raw.is_nan() {
        K_FLOOR_M2_S
    } else {
        raw.clamp(K_FLOOR_M2_S, K_CEIL_M2_S)
    }
}

/// 一天的扩散度数据包
pub struct DiffusivityBundle {
    file: DiffusivityDayFile,
}

impl DiffusivityBundle {
    /// 文件头
    #[must_use]
    pub fn header(&self) -> &DiffusivityHeader {
        self.file.header()
    }
}

/// 扩散度档案
pub struct DiffusivityArchive {
    root: PathBuf,
    metadata: ArchiveMetadata,
    coords: Arc<EkeCoordsFile>,
    index: Arc<SpatialIndex>,
    cache: LruDayCache<DiffusivityBundle>,
}

impl DiffusivityArchive {
    /// 打开档案（默认索引参数）
    pub fn open(metadata_path: &Path) -> DataResult<Self> {
        Self::open_with_config(metadata_path, SpatialIndexConfig::diffusivity())
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

        let coords_name = metadata
            .coords_file
            .clone()
            .unwrap_or_else(|| "eke_coords.bin".to_string());
        let coords_path = root.join(coords_name);
        let coords = EkeCoordsFile::open(&coords_path)?;
        if [coords.n_lat, coords.n_lon] != metadata.grid_shape {
            return Err(DataError::corrupt(
                &coords_path,
                format!(
                    "坐标网格与元数据不符: 文件 {}×{}, 元数据 {}×{}",
                    coords.n_lat, coords.n_lon, metadata.grid_shape[0], metadata.grid_shape[1]
                ),
            ));
        }

        // 共享坐标可直接建索引
        let index = Arc::new(SpatialIndex::build(coords.lon(), coords.lat(), &index_cfg));
        tracing::info!(
            "扩散度档案打开: {} ({} 天, {}×{})",
            metadata.dataset,
            metadata.days.len(),
            coords.n_lat,
            coords.n_lon
        );

        Ok(Self {
            root,
            metadata,
            coords: Arc::new(coords),
            index,
            cache: LruDayCache::new(DEFAULT_CAPACITY),
        })
    }

    /// 档案元数据
    #[must_use]
    pub fn metadata(&self) -> &ArchiveMetadata {
        &self.metadata
    }

    /// 取得某天的查询视图（日期夹取策略）
    pub fn day_view(&self, date: NaiveDate) -> DataResult<DiffusivityDayView> {
        let entry = self.metadata.resolve_clamped(date).ok_or_else(|| {
            DataError::unavailable(self.root.join("diffusivity"), "档案日期表为空")
        })?;
        let resolved = entry.date().expect("元数据加载时已校验日期");
        let path = self.root.join(&entry.file);
        let n_cells = self.coords.n_cells();
        let bundle = self.cache.get_or_load(resolved, || {
            let file = DiffusivityDayFile::open(&path, n_cells)?;
            tracing::debug!(
                "扩散度日文件加载: {} (最大量化误差 {:.3} m²/s)",
                resolved,
                file.header().max_error()
            );
            Ok(DiffusivityBundle { file })
        })?;

        Ok(DiffusivityDayView {
            bundle,
            coords: self.coords.clone(),
            index: self.index.clone(),
        })
    }

    /// 单点查询便捷接口
    pub fn k_at(&self, lon: f64, lat: f64, date: NaiveDate) -> DataResult<f64> {
        Ok(self.day_view(date)?.k_at(lon, lat))
    }
}

/// 某一天的扩散度查询视图
pub struct DiffusivityDayView {
    bundle: Arc<DiffusivityBundle>,
    coords: Arc<EkeCoordsFile>,
    index: Arc<SpatialIndex>,
}

impl DiffusivityDayView {
    /// 单点水平扩散度 [m²/s]
    ///
    /// 索引未命中时返回下限值 20 m²/s。
    #[must_use]
    pub fn k_at(&self, lon: f64, lat: f64) -> f64 {
        match self
            .index
            .nearest(lon, lat, self.coords.lon(), self.coords.lat())
        {
            Some(cell) => decode_k(self.bundle.file.k_half()[cell]),
            None => K_FLOOR_M2_S,
        }
    }

    /// 文件头（诊断）
    #[must_use]
    pub fn header(&self) -> &DiffusivityHeader {
        self.bundle.header()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{write_diffusivity_day, write_eke_coords};
    use crate::half::f32_to_f16;
    use crate::metadata::DayEntry;
    use std::path::PathBuf;

    const N: usize = 8;

    fn dense_cfg() -> SpatialIndexConfig {
        SpatialIndexConfig {
            grid: 8,
            cell_stride: 1,
            bounds_stride: 1,
        }
    }

    fn write_archive(dir: &Path, days: &[(u32, f32)]) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let mut lon = Vec::new();
        let mut lat = Vec::new();
        for i in 0..N {
            for j in 0..N {
                lon.push(140.0 + j as f32 * 0.2);
                lat.push(35.0 + i as f32 * 0.2);
            }
        }
        write_eke_coords(&dir.join("eke_coords.bin"), N, N, &lon, &lat).unwrap();

        let mut entries = Vec::new();
        for (offset, &(day, k_value)) in days.iter().enumerate() {
            let mut k = vec![f32_to_f16(k_value); N * N];
            // 单元 0 无数据
            k[0] = f32_to_f16(f32::NAN);
            // 单元 1 超上限
            k[1] = f32_to_f16(2000.0);
            // 单元 2 低于下限
            k[2] = f32_to_f16(3.0);
            let file = format!("eke_2011_03_{:02}.bin", day);
            let header = DiffusivityHeader {
                version: 6,
                year: 2011,
                month: 3,
                day,
                max_error_scaled: 244,
            };
            write_diffusivity_day(&dir.join(&file), &header, &k).unwrap();
            entries.push(DayEntry {
                year: 2011,
                month: 3,
                day,
                file,
                day_offset: offset as i64,
            });
        }
        let meta = ArchiveMetadata {
            dataset: "test eke".to_string(),
            description: String::new(),
            grid_shape: [N, N],
            depths_m: Vec::new(),
            coords_file: Some("eke_coords.bin".to_string()),
            days: entries,
        };
        let meta_path = dir.join("eke_metadata.json");
        std::fs::write(&meta_path, serde_json::to_string_pretty(&meta).unwrap()).unwrap();
        meta_path
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mt_diff_{}_{}", std::process::id(), name))
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2011, 3, day).unwrap()
    }

    #[test]
    fn test_k_lookup_and_clamp() {
        let dir = temp_dir("clamp");
        let meta = write_archive(&dir, &[(11, 120.0)]);
        let archive = DiffusivityArchive::open_with_config(&meta, dense_cfg()).unwrap();
        let view = archive.day_view(d(11)).unwrap();

        // 正常值：半精度量化误差内
        let k = view.k_at(140.8, 35.8);
        assert!((k - 120.0).abs() < 0.2, "k={}", k);
        // NaN → 20（单元 0）
        assert_eq!(view.k_at(140.0, 35.0), K_FLOOR_M2_S);
        // 上溢夹到 500（单元 1）
        assert_eq!(view.k_at(140.2, 35.0), K_CEIL_M2_S);
        // 下溢夹到 20（单元 2）
        assert_eq!(view.k_at(140.4, 35.0), K_FLOOR_M2_S);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_date_clamping() {
        let dir = temp_dir("dates");
        let meta = write_archive(&dir, &[(11, 100.0), (15, 200.0)]);
        let archive = DiffusivityArchive::open_with_config(&meta, dense_cfg()).unwrap();

        // 12 日 → 不小于目标的最小键 15 日
        let k = archive.k_at(140.8, 35.8, d(12)).unwrap();
        assert!((k - 200.0).abs() < 0.5, "k={}", k);
        // 晚于全部 → 最晚一天
        let k = archive.k_at(140.8, 35.8, d(25)).unwrap();
        assert!((k - 200.0).abs() < 0.5);
        // 早于全部 → 最早一天
        let k = archive.k_at(140.8, 35.8, d(1)).unwrap();
        assert!((k - 100.0).abs() < 0.5);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_miss_outside_grid() {
        let dir = temp_dir("outside");
        let meta = write_archive(&dir, &[(11, 100.0)]);
        let archive = DiffusivityArchive::open_with_config(&meta, dense_cfg()).unwrap();
        let view = archive.day_view(d(11)).unwrap();
        assert_eq!(view.k_at(120.0, 35.0), K_FLOOR_M2_S);
        std::fs::remove_dir_all(&dir).ok();
    }
}
