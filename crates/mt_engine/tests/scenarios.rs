// crates/mt_engine/tests/scenarios.rs

//! 解析已知的标定场景
//!
//! 用合成场驱动完整引擎，对照闭式解验证：静水不动、均匀
//! 平流位移、纯扩散方差、半衰期衰变、同种子复现。

use chrono::NaiveDate;
use mt_core::geo::{LON_KM_PER_DEG, ReleaseOrigin};
use mt_core::pool::EmitSettings;
use mt_engine::config::{PhaseConfig, SimulationConfig};
use mt_engine::context::{FieldSource, PinnedFields};
use mt_engine::error::EngineResult;
use mt_engine::simulation::Simulation;
use mt_physics::fields::synthetic::{ConstantK, UniformFlow};
use mt_physics::fields::DiffusivitySampler;

/// 均匀流 + 可选常数扩散度的合成字段源
struct SyntheticSource {
    u_ms: f64,
    v_ms: f64,
    k_m2s: Option<f64>,
}

impl FieldSource for SyntheticSource {
    fn pin_day(&self, _date: NaiveDate) -> EngineResult<PinnedFields<'_>> {
        Ok(PinnedFields {
            currents: Box::new(UniformFlow {
                u_ms: self.u_ms,
                v_ms: self.v_ms,
            }),
            diffusivity: self
                .k_m2s
                .map(|k| Box::new(ConstantK(k)) as Box<dyn DiffusivitySampler>),
        })
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn base_config(particles: usize, total_days: i64) -> SimulationConfig {
    SimulationConfig {
        release_lon: 141.31,
        release_lat: 37.42,
        start_date: d(2011, 3, 11),
        end_date: d(2011, 3, 11) + chrono::Days::new(total_days as u64),
        tracer_id: "microplastic".to_string(),
        particle_count: particles,
        phases: vec![PhaseConfig {
            start_day: 0.0,
            end_day: 0.5,
            total: 100.0,
            unit: "tons".to_string(),
        }],
        rk4_enabled: true,
        diffusivity_scale: 1.0,
        simulation_speed: 1.0,
        vertical_mixing: false,
        seed: Some(20110311),
    }
}

fn point_release() -> EmitSettings {
    EmitSettings {
        sigma_km: 0.0,
        max_attempts: 1,
    }
}

#[test]
fn scenario_null_flow_zero_diffusion() {
    // S1：静流 + 零扩散，100 天后每个粒子停在释放位置
    let mut config = base_config(1000, 100);
    config.diffusivity_scale = 0.0;
    let source = SyntheticSource {
        u_ms: 0.0,
        v_ms: 0.0,
        k_m2s: None,
    };
    let mut sim = Simulation::new(config, Box::new(source)).unwrap();

    while !sim.is_finished() {
        sim.step_fixed(0.5).unwrap();
    }

    let frame = sim.snapshot();
    assert_eq!(frame.active_count, 1000);
    let mut msd = 0.0;
    for p in &frame.particles {
        let (x0, y0, _) = p.trail[0];
        assert_eq!(p.x_km, x0);
        assert_eq!(p.y_km, y0);
        msd += (p.x_km - x0).powi(2) + (p.y_km - y0).powi(2);
    }
    assert_eq!(msd, 0.0);
}

#[test]
fn scenario_uniform_eastward_flow() {
    // S2：0.1 m/s 东向流、零扩散，100 天位移 864 km
    let mut config = base_config(1, 100);
    config.diffusivity_scale = 0.0;
    let source = SyntheticSource {
        u_ms: 0.1,
        v_ms: 0.0,
        k_m2s: None,
    };
    let mut sim = Simulation::new(config, Box::new(source)).unwrap();
    sim.set_emit_settings(point_release());

    while !sim.is_finished() {
        sim.step_fixed(0.5).unwrap();
    }

    let frame = sim.snapshot();
    assert_eq!(frame.active_count, 1);
    let p = &frame.particles[0];
    assert!((p.x_km - 864.0).abs() < 1e-6, "x={}", p.x_km);

    let origin = ReleaseOrigin::new(141.31, 37.42);
    let (lon, lat) = origin.to_lonlat(glam_vec(p.x_km, p.y_km));
    let predicted_lon = 141.31 + 864.0 / LON_KM_PER_DEG;
    assert!((lon - predicted_lon).abs() < 1e-6, "lon={}", lon);
    assert!((lat - 37.42).abs() < 1e-3);
}

fn glam_vec(x: f64, y: f64) -> glam::DVec2 {
    glam::DVec2::new(x, y)
}

#[test]
fn scenario_isotropic_diffusion_variance() {
    // S3：纯扩散 K = 100 m²/s，10 天后每轴方差 ≈ 2·K·t，±5%
    let config = base_config(10_000, 10);
    let source = SyntheticSource {
        u_ms: 0.0,
        v_ms: 0.0,
        k_m2s: Some(100.0),
    };
    let mut sim = Simulation::new(config, Box::new(source)).unwrap();
    sim.set_emit_settings(point_release());

    while !sim.is_finished() {
        sim.step_fixed(1.0).unwrap();
    }

    let frame = sim.snapshot();
    assert_eq!(frame.active_count, 10_000);
    let n = frame.particles.len() as f64;
    let mean_x: f64 = frame.particles.iter().map(|p| p.x_km).sum::<f64>() / n;
    let var_x: f64 = frame
        .particles
        .iter()
        .map(|p| (p.x_km - mean_x).powi(2))
        .sum::<f64>()
        / n;

    // 2 × 100 m²/s × 10 天 = 1.728e8 m² = 172.8 km²，σ ≈ 13.1 km
    let expected = 172.8;
    assert!(
        (var_x - expected).abs() / expected < 0.05,
        "var_x={} expected={}",
        var_x,
        expected
    );
}

#[test]
fn scenario_cs137_half_life() {
    // S5：Cs-137 经过一个半衰期后质量减半
    let half_life = 30.17 * 365.25;
    let mut config = base_config(1, 12_500);
    config.tracer_id = "cs137".to_string();
    config.phases = vec![PhaseConfig {
        start_day: 0.0,
        end_day: 0.4,
        total: 1.0,
        unit: "GBq".to_string(),
    }];
    config.diffusivity_scale = 0.0;
    let source = SyntheticSource {
        u_ms: 0.0,
        v_ms: 0.0,
        k_m2s: None,
    };
    let mut sim = Simulation::new(config, Box::new(source)).unwrap();
    sim.set_emit_settings(point_release());

    let dt = half_life / 1000.0;
    for _ in 0..1000 {
        sim.step_fixed(dt).unwrap();
    }

    let frame = sim.snapshot();
    assert_eq!(frame.active_count, 1);
    assert!(
        (frame.particles[0].mass - 0.5).abs() < 1e-9,
        "mass={}",
        frame.particles[0].mass
    );
}

#[test]
fn scenario_reproducible_and_reset() {
    // 不变量 5 / 定律 6：同种子同输入 ⇒ 同快照；reset 后重跑一致
    let make = || {
        let config = base_config(200, 30);
        let source = SyntheticSource {
            u_ms: 0.05,
            v_ms: 0.02,
            k_m2s: Some(80.0),
        };
        Simulation::new(config, Box::new(source)).unwrap()
    };
    let run = |sim: &mut Simulation| {
        while !sim.is_finished() {
            sim.step_fixed(0.5).unwrap();
        }
        serde_json::to_string(&sim.snapshot()).unwrap()
    };

    let mut a = make();
    let mut b = make();
    let snap_a = run(&mut a);
    let snap_b = run(&mut b);
    assert_eq!(snap_a, snap_b);

    // reset 后重新跑出同一轨迹
    a.reset();
    let snap_c = run(&mut a);
    assert_eq!(snap_a, snap_c);
}
