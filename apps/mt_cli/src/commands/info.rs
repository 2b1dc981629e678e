// apps/mt_cli/src/commands/info.rs

//! 档案检查命令
//!
//! 打印一个二进制日文件的头部、网格范围与数值范围，可选做
//! 一次测试点查询。文件类别按头部第一个整数判别：
//! 2/3/4 = 流场，6 = 扩散度，1 = 共享坐标。

use clap::Args;
use mt_data::binary::{CurrentDayFile, DiffusivityDayFile, EkeCoordsFile};
use mt_data::currents::is_land_value;
use mt_data::error::{DataError, DataResult};
use mt_data::half::f16_to_f32;
use mt_engine::error::EngineResult;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

/// 检查参数
#[derive(Args)]
pub struct InfoArgs {
    /// 二进制日文件路径
    #[arg(short, long)]
    pub file: PathBuf,

    /// 测试点经度
    #[arg(long, default_value = "141.5")]
    pub lon: f64,

    /// 测试点纬度
    #[arg(long, default_value = "39.6")]
    pub lat: f64,
}

/// 执行检查命令
pub fn execute(args: InfoArgs) -> EngineResult<()> {
    let version = peek_version(&args.file)?;
    match version {
        2 | 3 | 4 => inspect_currents(&args)?,
        6 => inspect_diffusivity(&args)?,
        1 => inspect_coords(&args)?,
        other => {
            return Err(DataError::unsupported(&args.file, other, "1/2/3/4/6").into());
        }
    }
    Ok(())
}

fn peek_version(path: &PathBuf) -> DataResult<i32> {
    let mut file =
        std::fs::File::open(path).map_err(|e| DataError::unavailable(path, e.to_string()))?;
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)
        .map_err(|_| DataError::corrupt(path, "头部截断"))?;
    Ok(i32::from_le_bytes(buf))
}

fn value_range(values: &[f32]) -> (f64, f64, usize) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    let mut ocean = 0;
    for &v in values {
        if is_land_value(v) {
            continue;
        }
        ocean += 1;
        min = min.min(v as f64);
        max = max.max(v as f64);
    }
    (min, max, ocean)
}

fn inspect_currents(args: &InfoArgs) -> DataResult<()> {
    let file = CurrentDayFile::open(&args.file)?;
    let h = file.header();
    info!("流场日文件: {}", args.file.display());
    info!(
        "  版本 {}, 网格 {}×{}, {} 层, 日期 {}-{:02}-{:02}",
        h.version, h.n_lat, h.n_lon, h.n_depth, h.year, h.month, h.day
    );

    let (lon_min, lon_max, _) = value_range(file.lon());
    let (lat_min, lat_max, _) = value_range(file.lat());
    info!(
        "  范围 [{:.2}, {:.2}]°E × [{:.2}, {:.2}]°N",
        lon_min, lon_max, lat_min, lat_max
    );

    let surface_u = file.u_layer(0);
    let (u_min, u_max, ocean) = value_range(surface_u);
    info!(
        "  表层 u ∈ [{:.4}, {:.4}] m/s, 海洋单元 {}/{} ({:.1}%)",
        u_min,
        u_max,
        ocean,
        surface_u.len(),
        ocean as f64 / surface_u.len() as f64 * 100.0
    );

    // 测试点：线性扫描最近单元（检查工具不建索引）
    let (lons, lats) = (file.lon(), file.lat());
    let mut best = (f64::MAX, 0usize);
    for i in 0..lons.len() {
        let (lo, la) = (lons[i] as f64, lats[i] as f64);
        if !lo.is_finite() || !la.is_finite() {
            continue;
        }
        let d2 = (lo - args.lon).powi(2) + (la - args.lat).powi(2);
        if d2 < best.0 {
            best = (d2, i);
        }
    }
    let cell = best.1;
    info!(
        "  测试点 ({:.2}, {:.2}) → 单元 {} ({:.2}, {:.2}), u = {:.4} m/s",
        args.lon, args.lat, cell, lons[cell], lats[cell], surface_u[cell]
    );
    Ok(())
}

fn inspect_diffusivity(args: &InfoArgs) -> DataResult<()> {
    // 单元数由文件长度推出（坐标在共享文件里）
    let len = std::fs::metadata(&args.file)
        .map_err(|e| DataError::unavailable(&args.file, e.to_string()))?
        .len() as usize;
    if len < 20 || (len - 20) % 2 != 0 {
        return Err(DataError::corrupt(&args.file, "文件长度不合法"));
    }
    let n_cells = (len - 20) / 2;
    let file = DiffusivityDayFile::open(&args.file, n_cells)?;
    let h = file.header();
    info!("扩散度日文件: {}", args.file.display());
    info!(
        "  版本 {}, 日期 {}-{:02}-{:02}, 单元 {}, 最大量化误差 {:.3} m²/s",
        h.version,
        h.year,
        h.month,
        h.day,
        n_cells,
        h.max_error()
    );

    let mut min = f64::MAX;
    let mut max = f64::MIN;
    let mut valid = 0usize;
    for &bits in file.k_half() {
        let v = f16_to_f32(bits) as f64;
        if v.is_nan() {
            continue;
        }
        valid += 1;
        min = min.min(v);
        max = max.max(v);
    }
    info!(
        "  K ∈ [{:.2}, {:.2}] m²/s（夹取前）, 有效 {}/{}",
        min, max, valid, n_cells
    );
    Ok(())
}

fn inspect_coords(args: &InfoArgs) -> DataResult<()> {
    let file = EkeCoordsFile::open(&args.file)?;
    info!("共享坐标文件: {}", args.file.display());
    info!("  网格 {}×{}", file.n_lat, file.n_lon);
    let (lon_min, lon_max, _) = value_range(file.lon());
    let (lat_min, lat_max, _) = value_range(file.lat());
    info!(
        "  范围 [{:.2}, {:.2}]°E × [{:.2}, {:.2}]°N",
        lon_min, lon_max, lat_min, lat_max
    );
    Ok(())
}
