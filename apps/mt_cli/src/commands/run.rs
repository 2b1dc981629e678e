// apps/mt_cli/src/commands/run.rs

//! 批处理运行命令
//!
//! 预渲染模式：不经墙钟，以固定步长跑完配置的日期范围，
//! 把记录帧序列写成 JSON。

use clap::Args;
use mt_core::error::CoreError;
use mt_data::error::DataError;
use mt_engine::config::SimulationConfig;
use mt_engine::context::ArchiveFieldSource;
use mt_engine::error::{EngineError, EngineResult};
use mt_engine::events::{EventDispatcher, LoggingListener};
use mt_engine::prerender::{prerender, PrerenderConfig};
use mt_engine::simulation::Simulation;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 模拟配置 JSON 路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 流场档案元数据路径
    #[arg(long)]
    pub currents: PathBuf,

    /// 扩散度档案元数据路径（缺省时使用 20 m²/s 回退值）
    #[arg(long)]
    pub diffusivity: Option<PathBuf>,

    /// 输出目录
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// 固定步长 [模拟日]
    #[arg(long, default_value = "0.1")]
    pub step_days: f64,

    /// 帧记录间隔 [模拟日]
    #[arg(long, default_value = "1.0")]
    pub record_interval: f64,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> EngineResult<()> {
    info!("=== MariTrace 批处理运行 ===");

    let config = SimulationConfig::load(&args.config)?;
    let fields = ArchiveFieldSource::open(&args.currents, args.diffusivity.as_deref())?;
    let mut simulation = Simulation::new(config, Box::new(fields))?;

    let events = EventDispatcher::new();
    events.add_listener(Arc::new(LoggingListener::new("prerender")));

    let prerender_config = PrerenderConfig {
        step_days: args.step_days,
        record_interval_days: args.record_interval,
        ..Default::default()
    };

    let start = Instant::now();
    let buffer = prerender(&mut simulation, &prerender_config, &events)?;

    std::fs::create_dir_all(&args.output)
        .map_err(|e| DataError::unavailable(&args.output, e.to_string()))?;
    let frames_path = args.output.join("frames.json");
    let text = serde_json::to_string(buffer.frames()).map_err(|e| {
        EngineError::Config(CoreError::invalid_config(format!("帧序列化失败: {}", e)))
    })?;
    std::fs::write(&frames_path, text)
        .map_err(|e| DataError::unavailable(&frames_path, e.to_string()))?;

    let counters = simulation.counters();
    info!("=== 运行完成 ===");
    info!("帧数: {}, 输出: {}", buffer.len(), frames_path.display());
    info!(
        "释放 {}, 退役 {}, 剩余激活 {}",
        counters.released,
        counters.decayed,
        simulation.active_count()
    );
    info!("耗时 {:.2} s", start.elapsed().as_secs_f64());
    Ok(())
}
