// crates/mt_engine/src/config.rs

//! 模拟配置
//!
//! 外部控制接口提交的完整运行配置。`validate` 在运行启动前
//! 做全部校验：日期升序、释放点范围、阶段区间、物种与单位
//! 解析；任何失败都阻止运行启动。

use crate::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use mt_core::error::CoreError;
use mt_core::geo::ReleaseOrigin;
use mt_core::schedule::ReleaseSchedule;
use mt_core::tracer::{self, TracerId};
use mt_core::units::ReleaseUnit;
use mt_physics::advection::{AdvectionScheme, Rk4Settings};
use mt_physics::stepper::StepSettings;
use mt_physics::vertical::VerticalSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

/// 释放阶段配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// 起始模拟日
    pub start_day: f64,
    /// 结束模拟日（不含）
    pub end_day: f64,
    /// 阶段释放总量
    pub total: f64,
    /// 申报单位（"Bq" / "GBq" / "TBq" / "PBq" / "kg" / "tons"）
    pub unit: String,
}

/// 一次运行的完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 释放点经度 [°E]
    pub release_lon: f64,
    /// 释放点纬度 [°N]
    pub release_lat: f64,
    /// 模拟起始日期
    pub start_date: NaiveDate,
    /// 模拟结束日期
    pub end_date: NaiveDate,
    /// 示踪剂目录标识
    pub tracer_id: String,
    /// 粒子池容量
    pub particle_count: usize,
    /// 释放阶段
    pub phases: Vec<PhaseConfig>,
    /// 是否启用 RK4 平流（否则一阶欧拉）
    #[serde(default = "default_true")]
    pub rk4_enabled: bool,
    /// 用户全局扩散倍率
    #[serde(default = "default_one")]
    pub diffusivity_scale: f64,
    /// 时钟速度倍率 [模拟天/真实秒]
    #[serde(default = "default_one")]
    pub simulation_speed: f64,
    /// 是否启用垂向混合
    #[serde(default = "default_true")]
    pub vertical_mixing: bool,
    /// 运行随机种子；缺省时取熵源
    #[serde(default)]
    pub seed: Option<u64>,
}

/// 校验产物：已解析的运行参数
pub struct ValidatedConfig {
    pub tracer: TracerId,
    pub origin: ReleaseOrigin,
    pub schedule: ReleaseSchedule,
    pub total_days: f64,
}

impl SimulationConfig {
    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(CoreError::invalid_config(format!(
                "配置文件不可读 {}: {}",
                path.display(),
                e
            )))
        })?;
        Self::from_json(&text)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(text: &str) -> EngineResult<Self> {
        serde_json::from_str(text).map_err(|e| {
            EngineError::Config(CoreError::invalid_config(format!("配置解析失败: {}", e)))
        })
    }

    /// 模拟总天数
    #[must_use]
    pub fn total_days(&self) -> f64 {
        (self.end_date - self.start_date).num_days() as f64
    }

    /// 校验配置并解析运行参数
    pub fn validate(&self) -> EngineResult<ValidatedConfig> {
        if self.end_date <= self.start_date {
            return Err(CoreError::InvalidDateRange {
                start: self.start_date.to_string(),
                end: self.end_date.to_string(),
            }
            .into());
        }
        if !(-180.0..=360.0).contains(&self.release_lon)
            || !(-90.0..=90.0).contains(&self.release_lat)
        {
            return Err(CoreError::invalid_config(format!(
                "释放点超出范围: ({}, {})",
                self.release_lon, self.release_lat
            ))
            .into());
        }
        if self.particle_count == 0 {
            return Err(CoreError::invalid_config("粒子池容量必须为正").into());
        }
        if self.phases.is_empty() {
            return Err(CoreError::invalid_config("至少需要一个释放阶段").into());
        }
        if !(self.diffusivity_scale >= 0.0) {
            return Err(CoreError::invalid_config("扩散倍率必须非负").into());
        }
        if !(self.simulation_speed > 0.0) {
            return Err(CoreError::invalid_config("时钟速度倍率必须为正").into());
        }

        let tracer = tracer::find(&self.tracer_id).map_err(EngineError::Config)?;

        let mut schedule = ReleaseSchedule::new();
        for phase in &self.phases {
            let unit = ReleaseUnit::parse(&phase.unit).map_err(EngineError::Config)?;
            schedule
                .add_phase(phase.start_day, phase.end_day, phase.total, unit)
                .map_err(EngineError::Config)?;
        }
        schedule.bind_capacity(self.particle_count);

        Ok(ValidatedConfig {
            tracer,
            origin: ReleaseOrigin::new(self.release_lon, self.release_lat),
            schedule,
            total_days: self.total_days(),
        })
    }

    /// 由配置导出单步物理参数
    #[must_use]
    pub fn step_settings(&self) -> StepSettings {
        StepSettings {
            scheme: if self.rk4_enabled {
                AdvectionScheme::Rk4(Rk4Settings::default())
            } else {
                AdvectionScheme::Euler
            },
            diffusivity_scale: self.diffusivity_scale,
            vertical: VerticalSettings {
                enabled: self.vertical_mixing,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> SimulationConfig {
        SimulationConfig {
            release_lon: 141.31,
            release_lat: 37.42,
            start_date: NaiveDate::from_ymd_opt(2011, 3, 11).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2011, 9, 11).unwrap(),
            tracer_id: "cs137".to_string(),
            particle_count: 10_000,
            phases: vec![PhaseConfig {
                start_day: 0.0,
                end_day: 30.0,
                total: 16.2,
                unit: "PBq".to_string(),
            }],
            rk4_enabled: true,
            diffusivity_scale: 1.0,
            simulation_speed: 1.0,
            vertical_mixing: true,
            seed: Some(7),
        }
    }

    #[test]
    fn test_valid_config() {
        let v = base_config().validate().unwrap();
        assert!((v.schedule.total_base() - 16.2e6).abs() < 1e-3);
        assert!((v.schedule.units_per_particle() - 1620.0).abs() < 1e-9);
        assert!((v.total_days - 184.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_dates_rejected() {
        let mut cfg = base_config();
        cfg.end_date = cfg.start_date;
        assert!(matches!(
            cfg.validate(),
            Err(EngineError::Config(CoreError::InvalidDateRange { .. }))
        ));
    }

    #[test]
    fn test_unknown_tracer_rejected() {
        let mut cfg = base_config();
        cfg.tracer_id = "kryptonite".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(EngineError::Config(CoreError::UnknownTracer { .. }))
        ));
    }

    #[test]
    fn test_bad_unit_rejected() {
        let mut cfg = base_config();
        cfg.phases[0].unit = "curie".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(EngineError::Config(CoreError::UnknownUnit { .. }))
        ));
    }

    #[test]
    fn test_overlapping_phases_rejected() {
        let mut cfg = base_config();
        cfg.phases.push(PhaseConfig {
            start_day: 10.0,
            end_day: 40.0,
            total: 1.0,
            unit: "PBq".to_string(),
        });
        assert!(matches!(
            cfg.validate(),
            Err(EngineError::Config(CoreError::OverlappingPhase { .. }))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let cfg = base_config();
        let text = serde_json::to_string_pretty(&cfg).unwrap();
        let parsed = SimulationConfig::from_json(&text).unwrap();
        assert_eq!(parsed.tracer_id, "cs137");
        assert_eq!(parsed.start_date, cfg.start_date);
        assert_eq!(parsed.seed, Some(7));
    }

    #[test]
    fn test_json_defaults() {
        let text = r#"{
            "release_lon": 141.31, "release_lat": 37.42,
            "start_date": "2011-03-11", "end_date": "2011-04-11",
            "tracer_id": "cs137", "particle_count": 100,
            "phases": [{"start_day": 0.0, "end_day": 10.0, "total": 1.0, "unit": "PBq"}]
        }"#;
        let cfg = SimulationConfig::from_json(text).unwrap();
        assert!(cfg.rk4_enabled);
        assert_eq!(cfg.diffusivity_scale, 1.0);
        assert!(cfg.vertical_mixing);
        assert!(cfg.seed.is_none());
    }
}
