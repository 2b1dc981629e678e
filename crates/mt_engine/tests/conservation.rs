// crates/mt_engine/tests/conservation.rs

//! 守恒性质
//!
//! 粒子数守恒（released = active + decayed）、质量守恒
//! （激活质量 + 累计损失 = 释放质量）与多阶段释放总量守恒。

use chrono::NaiveDate;
use mt_engine::config::{PhaseConfig, SimulationConfig};
use mt_engine::context::{FieldSource, PinnedFields};
use mt_engine::error::EngineResult;
use mt_engine::simulation::Simulation;
use mt_physics::fields::synthetic::NullFlow;

struct StillOcean;

impl FieldSource for StillOcean {
    fn pin_day(&self, _date: NaiveDate) -> EngineResult<PinnedFields<'_>> {
        Ok(PinnedFields {
            currents: Box::new(NullFlow),
            diffusivity: None,
        })
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 四阶段共 16.2 PBq、731 天的多年释放
fn multi_phase_config() -> SimulationConfig {
    SimulationConfig {
        release_lon: 141.31,
        release_lat: 37.42,
        start_date: d(2011, 3, 11),
        end_date: d(2013, 3, 11),
        tracer_id: "cs137".to_string(),
        particle_count: 2000,
        phases: vec![
            PhaseConfig {
                start_day: 0.0,
                end_day: 30.0,
                total: 12.0,
                unit: "PBq".to_string(),
            },
            PhaseConfig {
                start_day: 30.0,
                end_day: 100.0,
                total: 3.0,
                unit: "PBq".to_string(),
            },
            PhaseConfig {
                start_day: 100.0,
                end_day: 400.0,
                total: 1.0,
                unit: "PBq".to_string(),
            },
            PhaseConfig {
                start_day: 400.0,
                end_day: 731.0,
                total: 0.2,
                unit: "PBq".to_string(),
            },
        ],
        rk4_enabled: true,
        diffusivity_scale: 1.0,
        simulation_speed: 1.0,
        vertical_mixing: true,
        seed: Some(11),
    }
}

#[test]
fn release_total_conserved_over_phases() {
    // S6：释放粒子数 × 每粒子份额 = 16.2e6 GBq（一份以内）
    let config = multi_phase_config();
    let mut sim = Simulation::new(config, Box::new(StillOcean)).unwrap();

    let upp = 16.2e6 / 2000.0;
    while !sim.is_finished() {
        sim.step_fixed(1.0).unwrap();

        // 不变量 1：每步都满足 released = active + decayed
        let counters = sim.counters();
        assert_eq!(
            counters.released,
            sim.active_count() as u64 + counters.decayed
        );
    }

    let counters = sim.counters();
    let released_base = counters.released as f64 * upp;
    assert!(
        (released_base - 16.2e6).abs() <= upp + 1e-6,
        "released_base={}",
        released_base
    );
    // 容量恰好承载全部释放（浮点累加最多差一个粒子）
    assert!(counters.released >= 1999 && counters.released <= 2000);
}

#[test]
fn mass_budget_closed() {
    // 不变量 2：激活质量 + 累计损失 = 释放质量（相对 1e-6）
    let config = multi_phase_config();
    let mut sim = Simulation::new(config, Box::new(StillOcean)).unwrap();

    while !sim.is_finished() {
        sim.step_fixed(1.0).unwrap();
    }

    let released_mass = sim.counters().released as f64 * (16.2e6 / 2000.0);
    let budget = sim.active_mass() + sim.mass_lost_total();
    assert!(
        (budget - released_mass).abs() / released_mass < 1e-6,
        "budget={} released={}",
        budget,
        released_mass
    );
    // Cs-137 两年衰变约 4.5%，损失账目应当非零
    assert!(sim.mass_lost_total() > 0.0);
}

#[test]
fn particle_age_tracks_days() {
    // 不变量 11：第 d 天释放的粒子在第 d+k 天年龄为 k
    let mut config = multi_phase_config();
    config.particle_count = 1;
    config.phases = vec![PhaseConfig {
        start_day: 0.0,
        end_day: 0.5,
        total: 1.0,
        unit: "PBq".to_string(),
    }];
    let mut sim = Simulation::new(config, Box::new(StillOcean)).unwrap();

    for _ in 0..20 {
        sim.step_fixed(0.5).unwrap();
    }
    let frame = sim.snapshot();
    assert_eq!(frame.active_count, 1);
    // 释放发生在第 0 天的首步，此后 20 × 0.5 = 10 天
    assert!((frame.particles[0].age_days - 10.0).abs() < 1e-9);
}

#[test]
fn residual_accumulator_stays_fractional() {
    // 边界行为 10：整个运行期间累加器残差恒小于 1
    let config = multi_phase_config();
    let mut sim = Simulation::new(config, Box::new(StillOcean)).unwrap();

    // 以不规则步长推进，检验任意小步下守恒
    let steps = [0.3, 0.7, 0.11, 1.9, 0.45];
    let mut i = 0;
    while !sim.is_finished() {
        sim.step_fixed(steps[i % steps.len()]).unwrap();
        i += 1;
    }
    let counters = sim.counters();
    assert_eq!(counters.released, 2000);
}
