// crates/mt_engine/src/prerender.rs

//! 预渲染批处理与帧缓冲
//!
//! 不经墙钟的固定步长循环（默认 0.1 模拟日），按记录间隔
//! （默认 1 模拟日）把激活粒子状态深拷贝进时间索引的帧缓冲。
//! 进度按粗粒度百分比发布；取消标志在帧记录间检查，在途的
//! 日文件加载完成后丢弃结果。
//!
//! 回放查找：按模拟日二分；消费方可取括住目标日的帧对自行
//! 插值，或直接要求线性插值的仅位置帧。

use crate::error::{EngineError, EngineResult};
use crate::events::{EventDispatcher, RunEvent};
use crate::simulation::Simulation;
use crate::snapshot::{ParticleRecord, SnapshotFrame};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// 预渲染参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrerenderConfig {
    /// 固定步长 [模拟日]
    pub step_days: f64,
    /// 帧记录间隔 [模拟日]
    pub record_interval_days: f64,
    /// 进度事件的百分比粒度
    pub progress_step_percent: f64,
}

impl Default for PrerenderConfig {
    fn default() -> Self {
        Self {
            step_days: 0.1,
            record_interval_days: 1.0,
            progress_step_percent: 5.0,
        }
    }
}

/// 时间索引的帧缓冲
///
/// 不变量：帧按 `sim_day` 严格递增。
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Vec<SnapshotFrame>,
}

impl FrameBuffer {
    /// 创建空缓冲
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一帧；违反严格递增的帧被丢弃
    pub fn push(&mut self, frame: SnapshotFrame) {
        if let Some(last) = self.frames.last() {
            if frame.sim_day <= last.sim_day {
                tracing::warn!(
                    "丢弃乱序帧: sim_day {} <= {}",
                    frame.sim_day,
                    last.sim_day
                );
                return;
            }
        }
        self.frames.push(frame);
    }

    /// 帧数
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 按下标取帧
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SnapshotFrame> {
        self.frames.get(index)
    }

    /// 全部帧
    #[must_use]
    pub fn frames(&self) -> &[SnapshotFrame] {
        &self.frames
    }

    /// 二分查找括住目标日的帧对
    ///
    /// 精确命中时返回同一帧两次；目标在范围外时返回 None。
    #[must_use]
    pub fn seek_bracket(&self, sim_day: f64) -> Option<(&SnapshotFrame, &SnapshotFrame)> {
        let first = self.frames.first()?;
        let last = self.frames.last()?;
        if sim_day < first.sim_day || sim_day > last.sim_day {
            return None;
        }
        let idx = self
            .frames
            .partition_point(|f| f.sim_day < sim_day);
        let upper = &self.frames[idx.min(self.frames.len() - 1)];
        if (upper.sim_day - sim_day).abs() < 1e-12 {
            return Some((upper, upper));
        }
        let lower = &self.frames[idx - 1];
        Some((lower, upper))
    }

    /// 连续回放用的插值帧
    ///
    /// 仅位置线性插值（按粒子 id 匹配），聚合量取下界帧。
    #[must_use]
    pub fn frame_at(&self, sim_day: f64) -> Option<SnapshotFrame> {
        let (lower, upper) = self.seek_bracket(sim_day)?;
        if std::ptr::eq(lower, upper) {
            return Some(lower.clone());
        }
        let t = (sim_day - lower.sim_day) / (upper.sim_day - lower.sim_day);
        let upper_by_id: HashMap<u32, &ParticleRecord> =
            upper.particles.iter().map(|p| (p.id, p)).collect();

        let mut frame = lower.clone();
        frame.sim_day = sim_day;
        for p in &mut frame.particles {
            if let Some(next) = upper_by_id.get(&p.id) {
                p.x_km += (next.x_km - p.x_km) * t;
                p.y_km += (next.y_km - p.y_km) * t;
                p.depth_km += (next.depth_km - p.depth_km) * t;
            }
        }
        Some(frame)
    }
}

/// 运行到结束日并记录帧
///
/// 错误时发布 `Failed` 事件并停在上一个完成步；取消时发布
/// `Cancelled` 并返回 [`EngineError::Cancelled`]。
pub fn prerender(
    simulation: &mut Simulation,
    config: &PrerenderConfig,
    events: &EventDispatcher,
) -> EngineResult<FrameBuffer> {
    let total_days = simulation.total_days();
    let started = Instant::now();
    events.emit(RunEvent::Started { total_days });

    let mut buffer = FrameBuffer::new();
    let mut next_record = config.record_interval_days;
    let mut last_percent = 0.0;
    let mut steps: u64 = 0;

    while !simulation.is_finished() {
        if simulation.is_cancelled() {
            events.emit(RunEvent::Cancelled {
                sim_day: simulation.sim_day(),
            });
            return Err(EngineError::Cancelled);
        }
        if let Err(e) = simulation.step_fixed(config.step_days) {
            events.emit(RunEvent::Failed {
                error: e.to_string(),
            });
            return Err(e);
        }
        steps += 1;

        if simulation.sim_day() + 1e-9 >= next_record || simulation.is_finished() {
            let frame = simulation.snapshot();
            events.emit(RunEvent::FrameRecorded {
                sim_day: frame.sim_day,
                index: buffer.len(),
            });
            buffer.push(frame);
            next_record += config.record_interval_days;
        }

        let percent = (simulation.sim_day() / total_days * 100.0).min(100.0);
        if percent - last_percent >= config.progress_step_percent {
            events.emit(RunEvent::Progress {
                percent,
                sim_day: simulation.sim_day(),
                active: simulation.active_count(),
                message: None,
            });
            last_percent = percent;
        }
    }

    events.emit(RunEvent::Completed {
        total_steps: steps,
        duration_secs: started.elapsed().as_secs_f64(),
    });
    Ok(buffer)
}
