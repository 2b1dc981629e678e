// crates/mt_physics/src/fields.rs

//! 场采样接口
//!
//! 物理层通过这两个 trait 读取环境场，不直接依赖档案层。
//! 引擎层把日视图桥接到这里；测试用 [`synthetic`] 注入
//! 解析已知的合成场。

/// 单点流速采样结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocitySample {
    /// 东向流速 [m/s]
    pub u_ms: f64,
    /// 北向流速 [m/s]
    pub v_ms: f64,
    /// 是否命中有效海洋单元
    pub found: bool,
    /// 实际选取的深度层 [m]
    pub chosen_depth_m: f64,
}

impl VelocitySample {
    /// 未命中
    #[must_use]
    pub fn miss() -> Self {
        Self {
            u_ms: 0.0,
            v_ms: 0.0,
            found: false,
            chosen_depth_m: 0.0,
        }
    }
}

/// 流场采样接口
pub trait CurrentSampler {
    /// (lon, lat, depth) 处的流速
    fn velocity(&self, lon: f64, lat: f64, depth_m: f64) -> VelocitySample;

    /// 该点是否为有效海洋点
    fn is_ocean(&self, lon: f64, lat: f64, depth_m: f64) -> bool {
        self.velocity(lon, lat, depth_m).found
    }

    /// 最近海洋单元的经纬度（螺旋搜索，至多 `max_radius` 个桶步）
    fn nearest_ocean(
        &self,
        lon: f64,
        lat: f64,
        depth_m: f64,
        max_radius: usize,
    ) -> Option<(f64, f64)>;

    /// 目标深度对应的层下标（按层分组的批处理键）
    fn layer_of(&self, depth_m: f64) -> usize {
        let _ = depth_m;
        0
    }
}

/// 水平扩散度采样接口
pub trait DiffusivitySampler {
    /// (lon, lat) 处的水平扩散度 [m²/s]
    fn k_at(&self, lon: f64, lat: f64) -> f64;
}

// ============================================================
// 合成场
// ============================================================

/// 解析已知的合成场，供边界情形测试与标定使用
pub mod synthetic {
    use super::{CurrentSampler, DiffusivitySampler, VelocitySample};

    /// 处处静止的海洋
    pub struct NullFlow;

    impl CurrentSampler for NullFlow {
        fn velocity(&self, _lon: f64, _lat: f64, _depth_m: f64) -> VelocitySample {
            VelocitySample {
                u_ms: 0.0,
                v_ms: 0.0,
                found: true,
                chosen_depth_m: 0.0,
            }
        }

        fn nearest_ocean(
            &self,
            lon: f64,
            lat: f64,
            _depth_m: f64,
            _max_radius: usize,
        ) -> Option<(f64, f64)> {
            Some((lon, lat))
        }
    }

    /// 处处均匀的流场
    pub struct UniformFlow {
        pub u_ms: f64,
        pub v_ms: f64,
    }

    impl CurrentSampler for UniformFlow {
        fn velocity(&self, _lon: f64, _lat: f64, _depth_m: f64) -> VelocitySample {
            VelocitySample {
                u_ms: self.u_ms,
                v_ms: self.v_ms,
                found: true,
                chosen_depth_m: 0.0,
            }
        }

        fn nearest_ocean(
            &self,
            lon: f64,
            lat: f64,
            _depth_m: f64,
            _max_radius: usize,
        ) -> Option<(f64, f64)> {
            Some((lon, lat))
        }
    }

    /// 经度超过 `coast_lon` 为陆地的半平面海洋
    pub struct CoastalFlow {
        pub u_ms: f64,
        pub v_ms: f64,
        pub coast_lon: f64,
    }

    impl CurrentSampler for CoastalFlow {
        fn velocity(&self, lon: f64, _lat: f64, _depth_m: f64) -> VelocitySample {
            if lon >= self.coast_lon {
                VelocitySample::miss()
            } else {
                VelocitySample {
                    u_ms: self.u_ms,
                    v_ms: self.v_ms,
                    found: true,
                    chosen_depth_m: 0.0,
                }
            }
        }

        fn nearest_ocean(
            &self,
            lon: f64,
            lat: f64,
            _depth_m: f64,
            _max_radius: usize,
        ) -> Option<(f64, f64)> {
            if lon < self.coast_lon {
                Some((lon, lat))
            } else {
                // 退回海岸线以西 0.05°
                Some((self.coast_lon - 0.05, lat))
            }
        }
    }

    /// 常数扩散度
    pub struct ConstantK(pub f64);

    impl DiffusivitySampler for ConstantK {
        fn k_at(&self, _lon: f64, _lat: f64) -> f64 {
            self.0
        }
    }
}
