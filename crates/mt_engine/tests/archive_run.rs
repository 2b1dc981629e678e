// crates/mt_engine/tests/archive_run.rs

//! 端到端档案驱动运行
//!
//! 在临时目录里造出小型二进制档案（含陆地条带），用真实的
//! 档案字段源跑完整引擎：释放点陆地拒绝（S4）、步末位置
//! 合法性、日文件缺失时的停机行为。

use chrono::NaiveDate;
use mt_core::geo::ReleaseOrigin;
use mt_core::pool::EmitSettings;
use mt_data::binary::{
    write_current_day, write_diffusivity_day, write_eke_coords, CurrentHeader, DiffusivityHeader,
};
use mt_data::currents::CurrentArchive;
use mt_data::diffusivity::DiffusivityArchive;
use mt_data::half::f32_to_f16;
use mt_data::metadata::{ArchiveMetadata, DayEntry};
use mt_data::spatial::SpatialIndexConfig;
use mt_engine::config::{PhaseConfig, SimulationConfig};
use mt_engine::context::ArchiveFieldSource;
use mt_engine::error::EngineError;
use mt_engine::prerender::{prerender, PrerenderConfig};
use mt_engine::events::EventDispatcher;
use mt_engine::simulation::Simulation;
use std::path::{Path, PathBuf};

const N: usize = 10;

fn dense_cfg() -> SpatialIndexConfig {
    SpatialIndexConfig {
        grid: 10,
        cell_stride: 1,
        bounds_stride: 1,
    }
}

fn grid_coords() -> (Vec<f32>, Vec<f32>) {
    let mut lon = Vec::new();
    let mut lat = Vec::new();
    for i in 0..N {
        for j in 0..N {
            lon.push(140.0 + j as f32 * 0.1);
            lat.push(35.0 + i as f32 * 0.1);
        }
    }
    (lon, lat)
}

/// 经度 140.3°E 以西为陆地，海域东向流 0.02 m/s
fn write_archives(dir: &Path, n_days: u32) -> (PathBuf, PathBuf) {
    std::fs::create_dir_all(dir).unwrap();
    let (lon, lat) = grid_coords();

    let mut current_entries = Vec::new();
    let mut eke_entries = Vec::new();
    for offset in 0..n_days {
        let day = 11 + offset;
        let mut u = vec![0.02f32; N * N];
        let mut v = vec![0.0f32; N * N];
        for i in 0..N {
            for j in 0..3 {
                u[i * N + j] = -9999.0;
                v[i * N + j] = -9999.0;
            }
        }
        let file = format!("currents_2011_03_{:02}.bin", day);
        let header = CurrentHeader {
            version: 3,
            n_lat: N,
            n_lon: N,
            n_depth: 1,
            year: 2011,
            month: 3,
            day,
        };
        write_current_day(&dir.join(&file), &header, &lon, &lat, &u, &v).unwrap();
        current_entries.push(DayEntry {
            year: 2011,
            month: 3,
            day,
            file,
            day_offset: offset as i64,
        });

        let k = vec![f32_to_f16(60.0); N * N];
        let file = format!("eke_2011_03_{:02}.bin", day);
        write_diffusivity_day(
            &dir.join(&file),
            &DiffusivityHeader {
                version: 6,
                year: 2011,
                month: 3,
                day,
                max_error_scaled: 30,
            },
            &k,
        )
        .unwrap();
        eke_entries.push(DayEntry {
            year: 2011,
            month: 3,
            day,
            file,
            day_offset: offset as i64,
        });
    }

    let currents_meta = dir.join("currents_metadata.json");
    std::fs::write(
        &currents_meta,
        serde_json::to_string_pretty(&ArchiveMetadata {
            dataset: "test currents".to_string(),
            description: String::new(),
            grid_shape: [N, N],
            depths_m: vec![0.0],
            coords_file: None,
            days: current_entries,
        })
        .unwrap(),
    )
    .unwrap();

    write_eke_coords(&dir.join("eke_coords.bin"), N, N, &lon, &lat).unwrap();
    let eke_meta = dir.join("eke_metadata.json");
    std::fs::write(
        &eke_meta,
        serde_json::to_string_pretty(&ArchiveMetadata {
            dataset: "test eke".to_string(),
            description: String::new(),
            grid_shape: [N, N],
            depths_m: Vec::new(),
            coords_file: Some("eke_coords.bin".to_string()),
            days: eke_entries,
        })
        .unwrap(),
    )
    .unwrap();

    (currents_meta, eke_meta)
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mt_archive_run_{}_{}", std::process::id(), name))
}

fn source(currents_meta: &Path, eke_meta: &Path) -> ArchiveFieldSource {
    let currents = CurrentArchive::open_with_config(currents_meta, dense_cfg()).unwrap();
    let diffusivity = DiffusivityArchive::open_with_config(eke_meta, dense_cfg()).unwrap();
    ArchiveFieldSource::new(currents, Some(diffusivity))
}

fn config(days: u64) -> SimulationConfig {
    SimulationConfig {
        // 释放点贴着海岸（陆地在 140.3°E 以西）
        release_lon: 140.35,
        release_lat: 35.5,
        start_date: NaiveDate::from_ymd_opt(2011, 3, 11).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2011, 3, 11).unwrap() + chrono::Days::new(days),
        tracer_id: "cs137".to_string(),
        particle_count: 200,
        phases: vec![PhaseConfig {
            start_day: 0.0,
            end_day: 1.0,
            total: 1.0,
            unit: "PBq".to_string(),
        }],
        rk4_enabled: true,
        diffusivity_scale: 1.0,
        simulation_speed: 1.0,
        vertical_mixing: true,
        seed: Some(314),
    }
}

#[test]
fn coastal_release_keeps_particles_in_ocean() {
    // S4：紧邻海岸释放，步末没有激活粒子停在陆地上
    let dir = temp_dir("coastal");
    let (currents_meta, eke_meta) = write_archives(&dir, 5);
    let fields = source(&currents_meta, &eke_meta);
    let currents_check =
        CurrentArchive::open_with_config(&currents_meta, dense_cfg()).unwrap();

    let mut sim = Simulation::new(config(4), Box::new(fields)).unwrap();
    sim.set_emit_settings(EmitSettings {
        sigma_km: 10.0,
        max_attempts: 1000,
    });

    let origin = ReleaseOrigin::new(140.35, 35.5);
    let check_date = NaiveDate::from_ymd_opt(2011, 3, 11).unwrap();
    let view = currents_check.day_view(check_date).unwrap();

    for _ in 0..10 {
        sim.step_fixed(0.1).unwrap();
        let frame = sim.snapshot();
        assert!(frame.active_count > 0);
        for p in &frame.particles {
            let (lon, lat) = origin.to_lonlat(glam::DVec2::new(p.x_km, p.y_km));
            assert!(
                view.is_ocean(lon, lat, 0.0),
                "粒子落在陆地: ({:.3}, {:.3})",
                lon,
                lat
            );
        }
        assert_eq!(frame.particles_on_land, 0);
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_day_halts_run() {
    // 档案只有 2 天，跑到第 3 天时报 DataUnavailable 并停机
    let dir = temp_dir("missing");
    let (currents_meta, eke_meta) = write_archives(&dir, 2);
    let fields = source(&currents_meta, &eke_meta);

    let mut sim = Simulation::new(config(10), Box::new(fields)).unwrap();
    let mut err = None;
    for _ in 0..40 {
        if let Err(e) = sim.step_fixed(0.25) {
            err = Some(e);
            break;
        }
    }
    match err {
        Some(EngineError::Data(mt_data::error::DataError::DataUnavailable { .. })) => {}
        other => panic!("期望 DataUnavailable, 实际 {:?}", other.map(|e| e.to_string())),
    }
    // 停在上一个完成步：已完成 2 天 / 0.25 = 8 步
    assert_eq!(sim.total_steps(), 8);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn prerender_records_ordered_frames() {
    let dir = temp_dir("prerender");
    let (currents_meta, eke_meta) = write_archives(&dir, 5);
    let fields = source(&currents_meta, &eke_meta);

    let mut sim = Simulation::new(config(4), Box::new(fields)).unwrap();
    let events = EventDispatcher::new();
    let buffer = prerender(
        &mut sim,
        &PrerenderConfig {
            step_days: 0.1,
            record_interval_days: 1.0,
            progress_step_percent: 25.0,
        },
        &events,
    )
    .unwrap();

    assert_eq!(buffer.len(), 4);
    for pair in buffer.frames().windows(2) {
        assert!(pair[0].sim_day < pair[1].sim_day);
    }
    // 回放插值帧落在括住的两帧之间
    let frame = buffer.frame_at(1.5).unwrap();
    assert!((frame.sim_day - 1.5).abs() < 1e-12);
    std::fs::remove_dir_all(&dir).ok();
}
