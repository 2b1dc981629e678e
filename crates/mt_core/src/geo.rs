// crates/mt_core/src/geo.rs

//! 平面近似坐标换算
//!
//! 粒子位置以释放点为原点、公里为单位存储。经纬度与公里之间
//! 使用固定比例的平面近似换算，比例取 37°N 附近的值，
//! 在太平洋尺度的位移上误差可接受。

use glam::DVec2;

/// 经度方向换算比例 [km/°]（37°N 附近）
pub const LON_KM_PER_DEG: f64 = 88.8;
/// 纬度方向换算比例 [km/°]
pub const LAT_KM_PER_DEG: f64 = 111.0;

/// 释放原点
///
/// 所有粒子的 (x, y) 公里坐标相对此点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseOrigin {
    /// 原点经度 [°E]
    pub lon: f64,
    /// 原点纬度 [°N]
    pub lat: f64,
}

impl ReleaseOrigin {
    /// 创建释放原点
    #[must_use]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// 经纬度 → 公里偏移
    #[must_use]
    pub fn to_km(&self, lon: f64, lat: f64) -> DVec2 {
        DVec2::new(
            (lon - self.lon) * LON_KM_PER_DEG,
            (lat - self.lat) * LAT_KM_PER_DEG,
        )
    }

    /// 公里偏移 → 经纬度
    #[must_use]
    pub fn to_lonlat(&self, xy_km: DVec2) -> (f64, f64) {
        (
            self.lon + xy_km.x / LON_KM_PER_DEG,
            self.lat + xy_km.y / LAT_KM_PER_DEG,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let origin = ReleaseOrigin::new(141.31, 37.42);
        let km = origin.to_km(142.0, 38.0);
        let (lon, lat) = origin.to_lonlat(km);
        assert!((lon - 142.0).abs() < 1e-12);
        assert!((lat - 38.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale() {
        let origin = ReleaseOrigin::new(141.31, 37.42);
        // 向东 1° ≈ 88.8 km
        let km = origin.to_km(142.31, 37.42);
        assert!((km.x - 88.8).abs() < 1e-9);
        assert!(km.y.abs() < 1e-12);
    }
}
