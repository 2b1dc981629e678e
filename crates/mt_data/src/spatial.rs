// crates/mt_data/src/spatial.rs

//! 分桶最近网格单元索引
//!
//! 原生网格（曲线坐标）的经纬度数组不规则，无法用下标公式
//! 定位。索引把档案范围划成固定 GRID × GRID 桶格，每桶登记
//! 一个按步长抽样的原生单元子集；查询时检查目标桶的 3×3
//! 邻域，取欧氏距离（度）最小的单元。期望 O(1)。
//!
//! 抽样步长限制建桶时间；范围由再抽样的边界扫描确定。
//! 网格跨日不变，索引只建一次，附着在网格上而非某一天。

/// 索引构建参数
#[derive(Debug, Clone, Copy)]
pub struct SpatialIndexConfig {
    /// 每边桶数
    pub grid: usize,
    /// 登记单元的抽样步长
    pub cell_stride: usize,
    /// 范围扫描的抽样步长
    pub bounds_stride: usize,
}

impl SpatialIndexConfig {
    /// 流场档案参数
    #[must_use]
    pub fn currents() -> Self {
        Self {
            grid: 100,
            cell_stride: 10,
            bounds_stride: 1000,
        }
    }

    /// 扩散度档案参数
    #[must_use]
    pub fn diffusivity() -> Self {
        Self {
            grid: 50,
            cell_stride: 20,
            bounds_stride: 100,
        }
    }
}

/// 分桶空间索引
pub struct SpatialIndex {
    grid: usize,
    lon_min: f64,
    lon_max: f64,
    lat_min: f64,
    lat_max: f64,
    buckets: Vec<Vec<u32>>,
}

impl SpatialIndex {
    /// 从原生坐标数组构建索引
    pub fn build(lons: &[f32], lats: &[f32], cfg: &SpatialIndexConfig) -> Self {
        let n = lons.len().min(lats.len());
        let grid = cfg.grid.max(1);

        // 边界扫描
        let (mut lon_min, mut lon_max) = (f64::MAX, f64::MIN);
        let (mut lat_min, mut lat_max) = (f64::MAX, f64::MIN);
        let mut i = 0;
        while i < n {
            let (lo, la) = (lons[i] as f64, lats[i] as f64);
            if lo.is_finite() && la.is_finite() {
                lon_min = lon_min.min(lo);
                lon_max = lon_max.max(lo);
                lat_min = lat_min.min(la);
                lat_max = lat_max.max(la);
            }
            i += cfg.bounds_stride.max(1);
        }
        if lon_min > lon_max {
            // 无有效坐标，退化为空索引
            lon_min = 0.0;
            lon_max = 1.0;
            lat_min = 0.0;
            lat_max = 1.0;
        }
        // 退化范围扩展，避免除零
        if lon_max - lon_min < 1e-9 {
            lon_max = lon_min + 1e-9;
        }
        if lat_max - lat_min < 1e-9 {
            lat_max = lat_min + 1e-9;
        }

        let mut index = Self {
            grid,
            lon_min,
            lon_max,
            lat_min,
            lat_max,
            buckets: vec![Vec::new(); grid * grid],
        };

        // 抽样登记
        let mut i = 0;
        while i < n {
            let (lo, la) = (lons[i] as f64, lats[i] as f64);
            if lo.is_finite() && la.is_finite() {
                if let Some((bx, by)) = index.bucket_of(lo, la) {
                    index.buckets[by * grid + bx].push(i as u32);
                }
            }
            i += cfg.cell_stride.max(1);
        }

        tracing::debug!(
            "空间索引构建完成: {}×{} 桶, 范围 [{:.2}, {:.2}]°E × [{:.2}, {:.2}]°N",
            grid,
            grid,
            index.lon_min,
            index.lon_max,
            index.lat_min,
            index.lat_max
        );
        index
    }

    /// 每边桶数
    #[must_use]
    pub fn grid_size(&self) -> usize {
        self.grid
    }

    /// 目标点所在桶；超出档案范围返回 None
    #[must_use]
    pub fn bucket_of(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        if lon < self.lon_min || lon > self.lon_max || lat < self.lat_min || lat > self.lat_max {
            return None;
        }
        let fx = (lon - self.lon_min) / (self.lon_max - self.lon_min);
        let fy = (lat - self.lat_min) / (self.lat_max - self.lat_min);
        let bx = ((fx * self.grid as f64) as usize).min(self.grid - 1);
        let by = ((fy * self.grid as f64) as usize).min(self.grid - 1);
        Some((bx, by))
    }

    /// 最近原生单元
    ///
    /// 检查 3×3 桶邻域，按 (lon, lat) 度的欧氏距离取最小；
    /// 等距时取线性下标较小者。邻域内无候选时返回 None。
    #[must_use]
    pub fn nearest(&self, lon: f64, lat: f64, lons: &[f32], lats: &[f32]) -> Option<usize> {
        let (bx, by) = self.bucket_of(lon, lat)?;
        let mut best: Option<(f64, usize)> = None;

        for idx in self.neighborhood_candidates(bx, by) {
            let i = idx as usize;
            let dlon = lons[i] as f64 - lon;
            let dlat = lats[i] as f64 - lat;
            let d2 = dlon * dlon + dlat * dlat;
            match best {
                Some((bd, bi)) if d2 > bd || (d2 == bd && i >= bi) => {}
                _ => best = Some((d2, i)),
            }
        }
        best.map(|(_, i)| i)
    }

    /// 3×3 邻域内全部登记单元
    fn neighborhood_candidates(&self, bx: usize, by: usize) -> impl Iterator<Item = u32> + '_ {
        let grid = self.grid as i64;
        let (bx, by) = (bx as i64, by as i64);
        (-1i64..=1).flat_map(move |dy| {
            (-1i64..=1).filter_map(move |dx| {
                let (x, y) = (bx + dx, by + dy);
                if x < 0 || y < 0 || x >= grid || y >= grid {
                    None
                } else {
                    Some(self.buckets[(y * grid + x) as usize].iter().copied())
                }
            })
        })
        .flatten()
    }

    /// 切比雪夫半径 r 的桶环上全部登记单元
    ///
    /// r = 0 时只含中心桶。供最近海洋单元的螺旋搜索使用。
    #[must_use]
    pub fn ring_candidates(&self, bx: usize, by: usize, radius: usize) -> Vec<u32> {
        let grid = self.grid as i64;
        let (bx, by) = (bx as i64, by as i64);
        let r = radius as i64;
        let mut out = Vec::new();

        let mut visit = |x: i64, y: i64, out: &mut Vec<u32>| {
            if x >= 0 && y >= 0 && x < grid && y < grid {
                out.extend_from_slice(&self.buckets[(y * grid + x) as usize]);
            }
        };

        if r == 0 {
            visit(bx, by, &mut out);
            return out;
        }
        // 上下两条边
        for x in (bx - r)..=(bx + r) {
            visit(x, by - r, &mut out);
            visit(x, by + r, &mut out);
        }
        // 左右两条边（去掉角上的重复）
        for y in (by - r + 1)..=(by + r - 1) {
            visit(bx - r, y, &mut out);
            visit(bx + r, y, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10×10 规则网格，0.1° 间距
    fn regular_grid() -> (Vec<f32>, Vec<f32>) {
        let mut lons = Vec::new();
        let mut lats = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                lons.push(140.0 + j as f32 * 0.1);
                lats.push(35.0 + i as f32 * 0.1);
            }
        }
        (lons, lats)
    }

    fn dense_cfg() -> SpatialIndexConfig {
        SpatialIndexConfig {
            grid: 10,
            cell_stride: 1,
            bounds_stride: 1,
        }
    }

    #[test]
    fn test_nearest_exact_hit() {
        let (lons, lats) = regular_grid();
        let index = SpatialIndex::build(&lons, &lats, &dense_cfg());
        // 网格点本身
        let idx = index.nearest(140.3, 35.2, &lons, &lats).unwrap();
        assert_eq!(idx, 2 * 10 + 3);
    }

    #[test]
    fn test_nearest_between_points() {
        let (lons, lats) = regular_grid();
        let index = SpatialIndex::build(&lons, &lats, &dense_cfg());
        // 偏向 (140.4, 35.0)
        let idx = index.nearest(140.44, 35.01, &lons, &lats).unwrap();
        assert_eq!(idx, 4);
    }

    #[test]
    fn test_outside_extent_misses() {
        let (lons, lats) = regular_grid();
        let index = SpatialIndex::build(&lons, &lats, &dense_cfg());
        assert!(index.nearest(120.0, 35.0, &lons, &lats).is_none());
        assert!(index.nearest(140.5, 50.0, &lons, &lats).is_none());
        assert!(index.nearest(f64::NAN, 35.0, &lons, &lats).is_none());
    }

    #[test]
    fn test_nan_coordinates_skipped() {
        let (mut lons, lats) = regular_grid();
        lons[0] = f32::NAN;
        let index = SpatialIndex::build(&lons, &lats, &dense_cfg());
        // NaN 单元未登记，最近点落到相邻单元
        let idx = index.nearest(140.0, 35.0, &lons, &lats).unwrap();
        assert_ne!(idx, 0);
    }

    #[test]
    fn test_ring_candidates_disjoint_union() {
        let (lons, lats) = regular_grid();
        let index = SpatialIndex::build(&lons, &lats, &dense_cfg());
        let (bx, by) = index.bucket_of(140.45, 35.45).unwrap();

        // 环无重复且互不相交
        let mut seen = std::collections::HashSet::new();
        let mut total = 0;
        for r in 0..index.grid_size() {
            for c in index.ring_candidates(bx, by, r) {
                assert!(seen.insert(c), "重复单元 {}", c);
                total += 1;
            }
        }
        assert_eq!(total, 100);
    }

    #[test]
    fn test_stride_sampling_sparser() {
        let (lons, lats) = regular_grid();
        let sparse = SpatialIndexConfig {
            grid: 10,
            cell_stride: 10,
            bounds_stride: 1,
        };
        let index = SpatialIndex::build(&lons, &lats, &sparse);
        let registered: usize = (0..10)
            .flat_map(|y| (0..10).map(move |x| (x, y)))
            .map(|(x, y)| index.ring_candidates(x, y, 0).len())
            .sum();
        assert_eq!(registered, 10);
    }
}
