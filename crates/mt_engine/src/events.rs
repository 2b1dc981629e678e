// crates/mt_engine/src/events.rs

//! 进度事件
//!
//! 预渲染批处理和交互式运行向外部协作者发布进度的
//! 监听器/分发器机制。

use parking_lot::RwLock;
use std::sync::Arc;

/// 运行事件
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// 运行已开始
    Started {
        /// 模拟总天数
        total_days: f64,
    },
    /// 进度更新
    Progress {
        /// 进度百分比 (0–100)
        percent: f64,
        /// 当前模拟日
        sim_day: f64,
        /// 当前激活粒子数
        active: usize,
        /// 附加消息
        message: Option<String>,
    },
    /// 一帧已记录
    FrameRecorded {
        /// 帧对应的模拟日
        sim_day: f64,
        /// 帧下标
        index: usize,
    },
    /// 运行完成
    Completed {
        /// 总步数
        total_steps: u64,
        /// 运行时长 [秒]
        duration_secs: f64,
    },
    /// 运行失败
    Failed {
        /// 错误信息
        error: String,
    },
    /// 运行已取消
    Cancelled {
        /// 取消时的模拟日
        sim_day: f64,
    },
}

impl RunEvent {
    /// 事件名称
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Started",
            Self::Progress { .. } => "Progress",
            Self::FrameRecorded { .. } => "FrameRecorded",
            Self::Completed { .. } => "Completed",
            Self::Failed { .. } => "Failed",
            Self::Cancelled { .. } => "Cancelled",
        }
    }
}

/// 事件监听器 trait
pub trait RunListener: Send + Sync {
    /// 处理事件
    fn on_event(&self, event: &RunEvent);

    /// 监听器名称（调试用）
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// 函数式监听器
pub struct FnListener<F>
where
    F: Fn(&RunEvent) + Send + Sync,
{
    name: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(&RunEvent) + Send + Sync,
{
    /// 创建函数式监听器
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> RunListener for FnListener<F>
where
    F: Fn(&RunEvent) + Send + Sync,
{
    fn on_event(&self, event: &RunEvent) {
        (self.handler)(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 日志监听器
pub struct LoggingListener {
    prefix: String,
}

impl LoggingListener {
    /// 创建日志监听器
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl RunListener for LoggingListener {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::Started { total_days } => {
                tracing::info!("{}: 开始，共 {} 天", self.prefix, total_days);
            }
            RunEvent::Progress {
                percent,
                sim_day,
                active,
                ..
            } => {
                tracing::info!(
                    "{}: {:.0}% (第 {:.1} 天, {} 粒子)",
                    self.prefix,
                    percent,
                    sim_day,
                    active
                );
            }
            RunEvent::Completed {
                total_steps,
                duration_secs,
            } => {
                tracing::info!(
                    "{}: 完成，{} 步，耗时 {:.2} s",
                    self.prefix,
                    total_steps,
                    duration_secs
                );
            }
            RunEvent::Failed { error } => {
                tracing::error!("{}: 失败: {}", self.prefix, error);
            }
            RunEvent::Cancelled { sim_day } => {
                tracing::warn!("{}: 在第 {:.1} 天取消", self.prefix, sim_day);
            }
            RunEvent::FrameRecorded { .. } => {}
        }
    }

    fn name(&self) -> &str {
        "LoggingListener"
    }
}

/// 事件分发器
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<Arc<dyn RunListener>>>,
}

impl EventDispatcher {
    /// 创建空分发器
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加监听器
    pub fn add_listener(&self, listener: Arc<dyn RunListener>) {
        self.listeners.write().push(listener);
    }

    /// 添加函数式监听器
    pub fn add_fn_listener<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(FnListener::new(name, handler)));
    }

    /// 分发事件
    pub fn emit(&self, event: RunEvent) {
        tracing::trace!("事件: {}", event.name());
        for listener in self.listeners.read().iter() {
            listener.on_event(&event);
        }
    }

    /// 监听器数量
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
