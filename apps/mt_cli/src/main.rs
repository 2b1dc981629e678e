// apps/mt_cli/src/main.rs

//! MariTrace 命令行界面
//!
//! 海洋示踪剂扩散模拟的批处理工具：
//!
//! - `run`: 预渲染模式跑完整个日期范围，帧序列写成 JSON
//! - `info`: 检查一个二进制日文件（头部、网格范围、测试点）
//! - `validate`: 校验模拟配置与档案覆盖范围
//!
//! 退出码：0 成功，2 配置无效，3 数据不可用，4 二进制损坏，
//! 5 已取消。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// MariTrace 海洋示踪剂扩散模拟器
#[derive(Parser)]
#[command(name = "mt_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MariTrace ocean tracer dispersion simulator", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 批处理运行并导出帧序列
    Run(commands::run::RunArgs),
    /// 检查二进制日文件
    Info(commands::info::InfoArgs),
    /// 校验配置
    Validate(commands::validate::ValidateArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("日志初始化失败");
    }

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}
