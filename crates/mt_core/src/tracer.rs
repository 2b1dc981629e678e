// crates/mt_core/src/tracer.rs

//! 示踪剂目录
//!
//! 进程级静态的物种描述表。每个物种带一组行为参数
//! （扩散倍率、沉降/上浮速度、蒸发率、羽流尺度、衰变开关），
//! 粒子只持有目录句柄 [`TracerId`]，不复制描述数据。

use crate::error::{CoreError, CoreResult};
use crate::units::ReleaseUnit;
use serde::{Deserialize, Serialize};

/// 示踪剂分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracerKind {
    /// 放射性核素
    Radionuclide,
    /// 烃类（油品）
    Hydrocarbon,
    /// 颗粒物
    Particulate,
    /// 一般污染物
    Pollutant,
    /// 生物类（浮游幼体等）
    Biological,
}

/// 物种行为参数束
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TracerBehavior {
    /// 水平扩散系数倍率
    pub diffusivity_factor: f64,
    /// 垂向沉降速度 [m/day]，正值下沉，负值上浮
    pub settling_m_per_day: f64,
    /// 一阶质量损失率（蒸发）[1/day]
    pub evaporation_per_day: Option<f64>,
    /// 水平羽流尺度 σ_h [m]
    pub sigma_h_m: f64,
    /// 垂向羽流尺度 σ_v [m]
    pub sigma_v_m: f64,
    /// 是否启用放射性衰变
    pub decay_enabled: bool,
}

/// 示踪剂描述
#[derive(Debug, Clone, Serialize)]
pub struct TracerDescriptor {
    /// 目录标识
    pub id: &'static str,
    /// 显示名称
    pub name: &'static str,
    /// 分类
    pub kind: TracerKind,
    /// 半衰期 [day]（仅放射性核素）
    pub half_life_days: Option<f64>,
    /// 默认释放总量
    pub default_total: f64,
    /// 默认释放单位
    pub default_unit: ReleaseUnit,
    /// 行为参数
    pub behavior: TracerBehavior,
}

impl TracerDescriptor {
    /// 基准单位名称
    #[must_use]
    pub fn base_unit(&self) -> &'static str {
        self.default_unit.base_label()
    }
}

/// 目录句柄
///
/// 指向静态目录的下标，粒子记录以此引用物种。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TracerId(pub(crate) usize);

impl TracerId {
    /// 对应的描述条目
    #[must_use]
    pub fn descriptor(&self) -> &'static TracerDescriptor {
        &REGISTRY[self.0]
    }
}

// ============================================================
// 静态目录
// ============================================================

/// Cs-137 半衰期 30.17 年
const CS137_HALF_LIFE_DAYS: f64 = 30.17 * 365.25;
/// H-3 半衰期 12.32 年
const H3_HALF_LIFE_DAYS: f64 = 12.32 * 365.25;

static REGISTRY: &[TracerDescriptor] = &[
    TracerDescriptor {
        id: "cs137",
        name: "Cesium-137",
        kind: TracerKind::Radionuclide,
        half_life_days: Some(CS137_HALF_LIFE_DAYS),
        default_total: 16.2,
        default_unit: ReleaseUnit::PBq,
        behavior: TracerBehavior {
            diffusivity_factor: 1.0,
            settling_m_per_day: 0.0,
            evaporation_per_day: None,
            sigma_h_m: 2000.0,
            sigma_v_m: 50.0,
            decay_enabled: true,
        },
    },
    TracerDescriptor {
        id: "i131",
        name: "Iodine-131",
        kind: TracerKind::Radionuclide,
        half_life_days: Some(8.02),
        default_total: 150.0,
        default_unit: ReleaseUnit::PBq,
        behavior: TracerBehavior {
            diffusivity_factor: 1.0,
            settling_m_per_day: 0.0,
            evaporation_per_day: None,
            sigma_h_m: 2000.0,
            sigma_v_m: 50.0,
            decay_enabled: true,
        },
    },
    TracerDescriptor {
        id: "h3",
        name: "Tritium",
        kind: TracerKind::Radionuclide,
        half_life_days: Some(H3_HALF_LIFE_DAYS),
        default_total: 860.0,
        default_unit: ReleaseUnit::TBq,
        behavior: TracerBehavior {
            // 氚以水分子形态随流，扩散与水体一致
            diffusivity_factor: 1.0,
            settling_m_per_day: 0.0,
            evaporation_per_day: None,
            sigma_h_m: 3000.0,
            sigma_v_m: 100.0,
            decay_enabled: true,
        },
    },
    TracerDescriptor {
        id: "crude_oil",
        name: "Crude oil",
        kind: TracerKind::Hydrocarbon,
        half_life_days: None,
        default_total: 5000.0,
        default_unit: ReleaseUnit::Tons,
        behavior: TracerBehavior {
            diffusivity_factor: 1.2,
            // 浮油整体上浮
            settling_m_per_day: -10.0,
            evaporation_per_day: Some(0.03),
            sigma_h_m: 1000.0,
            sigma_v_m: 5.0,
            decay_enabled: false,
        },
    },
    TracerDescriptor {
        id: "microplastic",
        name: "Microplastic",
        kind: TracerKind::Particulate,
        half_life_days: None,
        default_total: 100.0,
        default_unit: ReleaseUnit::Tons,
        behavior: TracerBehavior {
            diffusivity_factor: 1.0,
            settling_m_per_day: -2.0,
            evaporation_per_day: None,
            sigma_h_m: 1500.0,
            sigma_v_m: 20.0,
            decay_enabled: false,
        },
    },
    TracerDescriptor {
        id: "pollutant",
        name: "Industrial pollutant",
        kind: TracerKind::Pollutant,
        half_life_days: None,
        default_total: 500.0,
        default_unit: ReleaseUnit::Tons,
        behavior: TracerBehavior {
            diffusivity_factor: 1.0,
            settling_m_per_day: 0.5,
            evaporation_per_day: None,
            sigma_h_m: 2000.0,
            sigma_v_m: 50.0,
            decay_enabled: false,
        },
    },
    TracerDescriptor {
        id: "fish_larvae",
        name: "Fish larvae cohort",
        kind: TracerKind::Biological,
        half_life_days: None,
        default_total: 1e6,
        default_unit: ReleaseUnit::Kg,
        behavior: TracerBehavior {
            diffusivity_factor: 1.5,
            settling_m_per_day: 0.0,
            evaporation_per_day: None,
            sigma_h_m: 500.0,
            sigma_v_m: 20.0,
            decay_enabled: false,
        },
    },
];

/// 完整目录
#[must_use]
pub fn registry() -> &'static [TracerDescriptor] {
    REGISTRY
}

/// 按标识查找物种
pub fn find(id: &str) -> CoreResult<TracerId> {
    REGISTRY
        .iter()
        .position(|d| d.id == id)
        .map(TracerId)
        .ok_or_else(|| CoreError::UnknownTracer { id: id.to_string() })
}
