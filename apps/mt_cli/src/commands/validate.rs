// apps/mt_cli/src/commands/validate.rs

//! 配置校验命令
//!
//! 运行启动前的全量检查：配置本身的合法性、档案元数据
//! 可读性、模拟日期范围是否被流场档案覆盖。

use clap::Args;
use mt_core::error::CoreError;
use mt_data::metadata::ArchiveMetadata;
use mt_engine::config::SimulationConfig;
use mt_engine::error::EngineResult;
use std::path::PathBuf;
use tracing::{info, warn};

/// 校验参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 模拟配置 JSON 路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 流场档案元数据路径（可选：附带检查日期覆盖）
    #[arg(long)]
    pub currents: Option<PathBuf>,

    /// 扩散度档案元数据路径（可选）
    #[arg(long)]
    pub diffusivity: Option<PathBuf>,
}

/// 执行校验命令
pub fn execute(args: ValidateArgs) -> EngineResult<()> {
    let config = SimulationConfig::load(&args.config)?;
    let validated = config.validate()?;

    let descriptor = validated.tracer.descriptor();
    info!("配置合法: {}", args.config.display());
    info!(
        "  示踪剂 {} ({}), 释放点 ({:.2}°E, {:.2}°N)",
        descriptor.name, descriptor.id, config.release_lon, config.release_lat
    );
    info!(
        "  {} → {} ({} 天), {} 粒子",
        config.start_date,
        config.end_date,
        validated.total_days,
        config.particle_count
    );
    info!(
        "  {} 个释放阶段, 共 {:.3e} {}, 每粒子 {:.3e} {}",
        validated.schedule.phases().len(),
        validated.schedule.total_base(),
        descriptor.base_unit(),
        validated.schedule.units_per_particle(),
        descriptor.base_unit()
    );

    if let Some(path) = &args.currents {
        check_coverage(path, &config, true)?;
    }
    if let Some(path) = &args.diffusivity {
        // 扩散度按日期夹取，不覆盖只降级不报错
        check_coverage(path, &config, false)?;
    }
    info!("校验通过");
    Ok(())
}

fn check_coverage(
    metadata_path: &PathBuf,
    config: &SimulationConfig,
    required: bool,
) -> EngineResult<()> {
    let metadata = ArchiveMetadata::load(metadata_path)?;
    let Some((first, last)) = metadata.date_range() else {
        return Err(CoreError::invalid_config(format!(
            "档案日期表为空: {}",
            metadata_path.display()
        ))
        .into());
    };
    info!(
        "  档案 {}: {} 天, {} → {}",
        metadata.dataset,
        metadata.days.len(),
        first,
        last
    );

    let covered = first <= config.start_date && last >= config.end_date;
    if !covered {
        if required {
            return Err(CoreError::invalid_config(format!(
                "流场档案不覆盖模拟日期范围 {} → {}",
                config.start_date, config.end_date
            ))
            .into());
        }
        warn!(
            "  档案不完全覆盖模拟范围，缺失日期将按夹取策略处理"
        );
    }
    Ok(())
}
