// crates/mt_engine/src/simulation.rs

//! 模拟运行
//!
//! 一次运行的装配与步进循环。每个模拟步是原子的：
//! 时钟结算 δt → 释放到期粒子 → 对全部激活粒子积分 →
//! 统计与快照。任何数据层错误让运行停在上一个完成步。
//!
//! 守恒账目：`released == active + decayed` 恒成立；
//! 激活质量 + 累计损失质量 == 释放质量（浮点容差内）。

use crate::config::SimulationConfig;
use crate::context::FieldSource;
use crate::error::{EngineError, EngineResult};
use crate::snapshot::SnapshotFrame;
use chrono::NaiveDate;
use mt_core::clock::{date_for, SimulationClock};
use mt_core::geo::ReleaseOrigin;
use mt_core::pool::{EmitSettings, ParticlePool};
use mt_core::rng::DriftRng;
use mt_core::schedule::ReleaseSchedule;
use mt_core::tracer::TracerId;
use mt_physics::concentration::initial_concentration;
use mt_physics::stepper::{step_particles, StepSettings, StepStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 帧回调
pub type FrameCallback = Box<dyn FnMut(&SnapshotFrame) + Send>;

/// 一次模拟运行
pub struct Simulation {
    config: SimulationConfig,
    origin: ReleaseOrigin,
    tracer: TracerId,
    schedule: ReleaseSchedule,
    pool: ParticlePool,
    clock: SimulationClock,
    rng: DriftRng,
    fields: Box<dyn FieldSource>,
    step_settings: StepSettings,
    emit_settings: EmitSettings,
    cancel: Arc<AtomicBool>,
    total_days: f64,
    finished: bool,
    total_steps: u64,
    mass_lost_total: f64,
    last_stats: StepStats,
    on_frame: Option<FrameCallback>,
}

impl Simulation {
    /// 装配一次运行；配置校验失败时运行不启动
    pub fn new(config: SimulationConfig, fields: Box<dyn FieldSource>) -> EngineResult<Self> {
        let validated = config.validate()?;
        let pool = ParticlePool::new(config.particle_count, validated.tracer);
        let clock = SimulationClock::new(config.start_date, config.simulation_speed);
        let rng = match config.seed {
            Some(seed) => DriftRng::seeded(seed),
            None => DriftRng::from_entropy(),
        };
        let step_settings = config.step_settings();

        tracing::info!(
            "模拟装配完成: {} @ ({:.2}°E, {:.2}°N), {} 粒子, {} 天, 每粒子 {:.3} {}",
            validated.tracer.descriptor().name,
            config.release_lon,
            config.release_lat,
            config.particle_count,
            validated.total_days,
            validated.schedule.units_per_particle(),
            validated.tracer.descriptor().base_unit(),
        );

        Ok(Self {
            origin: validated.origin,
            tracer: validated.tracer,
            schedule: validated.schedule,
            total_days: validated.total_days,
            pool,
            clock,
            rng,
            fields,
            step_settings,
            emit_settings: EmitSettings::default(),
            cancel: Arc::new(AtomicBool::new(false)),
            finished: false,
            total_steps: 0,
            mass_lost_total: 0.0,
            last_stats: StepStats::default(),
            on_frame: None,
            config,
        })
    }

    // ------------------------------------------------------------
    // 控制接口
    // ------------------------------------------------------------

    /// 启动（或恢复）墙钟驱动
    pub fn start(&mut self) {
        self.clock.resume();
    }

    /// 暂停墙钟；恢复后不追赶暂停期间的时间
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// 恢复墙钟
    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// 是否处于暂停态
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// 回到起始时刻：清空粒子、归零累加器与计数、重播种子
    pub fn reset(&mut self) {
        self.pool.reset();
        self.schedule.reset();
        self.clock.reset();
        self.rng = match self.config.seed {
            Some(seed) => DriftRng::seeded(seed),
            None => DriftRng::from_entropy(),
        };
        self.finished = false;
        self.total_steps = 0;
        self.mass_lost_total = 0.0;
        self.last_stats = StepStats::default();
        tracing::info!("模拟已重置");
    }

    /// 取消句柄；置位后下一个步进入口返回 [`EngineError::Cancelled`]
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// 是否已请求取消
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// 注册帧回调，墙钟步进后调用
    pub fn on_frame(&mut self, callback: FrameCallback) {
        self.on_frame = Some(callback);
    }

    // ------------------------------------------------------------
    // 查询
    // ------------------------------------------------------------

    /// 当前模拟日
    #[must_use]
    pub fn sim_day(&self) -> f64 {
        self.clock.sim_day()
    }

    /// 当前模拟日历日期
    #[must_use]
    pub fn current_date(&self) -> NaiveDate {
        self.clock.current_date()
    }

    /// 是否已跑完配置的日期范围
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 模拟总天数
    #[must_use]
    pub fn total_days(&self) -> f64 {
        self.total_days
    }

    /// 运行配置
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 累计步数
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// 累计损失质量（衰变/蒸发/退役残余）
    #[must_use]
    pub fn mass_lost_total(&self) -> f64 {
        self.mass_lost_total
    }

    /// 激活粒子的质量合计
    #[must_use]
    pub fn active_mass(&self) -> f64 {
        self.pool.iter_active().map(|p| p.mass).sum()
    }

    /// 当前激活粒子数
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// 守恒计数（释放/退役）
    #[must_use]
    pub fn counters(&self) -> mt_core::pool::PoolCounters {
        self.pool.counters()
    }

    /// 释放位置采样参数（测试与标定可覆盖）
    pub fn set_emit_settings(&mut self, settings: EmitSettings) {
        self.emit_settings = settings;
    }

    /// 捕获当前快照
    #[must_use]
    pub fn snapshot(&self) -> SnapshotFrame {
        SnapshotFrame::capture(
            &self.pool,
            self.sim_day(),
            self.current_date(),
            self.last_stats.particles_on_land,
            self.last_stats.max_depth_m,
            self.last_stats.max_concentration,
        )
    }

    // ------------------------------------------------------------
    // 步进
    // ------------------------------------------------------------

    /// 墙钟驱动的一步
    ///
    /// 暂停中 δt 为零时返回 `Ok(None)`。步完成后调用帧回调。
    pub fn step(&mut self) -> EngineResult<Option<SnapshotFrame>> {
        if self.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let dt = self.clock.step();
        if dt <= 0.0 || self.finished {
            return Ok(None);
        }
        let day_start = self.clock.sim_day() - dt;
        self.run_step(day_start, dt)?;

        let frame = self.snapshot();
        if let Some(callback) = &mut self.on_frame {
            callback(&frame);
        }
        Ok(Some(frame))
    }

    /// 固定步长的一步（批处理/测试路径，不经墙钟）
    pub fn step_fixed(&mut self, dt_days: f64) -> EngineResult<()> {
        if self.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if self.finished || dt_days <= 0.0 {
            return Ok(());
        }
        let day_start = self.clock.sim_day();
        self.clock.advance_manual(dt_days);
        self.run_step(day_start, dt_days)
    }

    /// 一个原子模拟步：释放 → 积分 → 统计
    fn run_step(&mut self, day_start: f64, dt_days: f64) -> EngineResult<()> {
        let date = date_for(self.config.start_date, day_start);
        let pinned = self.fields.pin_day(date)?;

        // 释放到期粒子；池满或陆地放弃的份额退还累加器
        let due = self.schedule.advance(day_start, dt_days);
        if due > 0 {
            let mass = self.schedule.units_per_particle();
            let concentration = initial_concentration(mass, self.tracer.descriptor());
            let currents = &*pinned.currents;
            let emitted = self.pool.emit_many(
                due,
                &mut self.rng,
                &self.origin,
                self.tracer,
                mass,
                concentration,
                &self.emit_settings,
                |lon, lat| currents.is_ocean(lon, lat, 0.0),
            );
            if emitted < due {
                self.schedule.refund(due - emitted);
            }
        }

        let stats = step_particles(
            &mut self.pool,
            &*pinned.currents,
            pinned.diffusivity.as_deref(),
            &self.origin,
            date,
            dt_days,
            &mut self.rng,
            &self.step_settings,
        );
        self.mass_lost_total += stats.mass_lost;
        self.last_stats = stats;
        self.total_steps += 1;

        if day_start + dt_days >= self.total_days {
            self.finished = true;
            tracing::info!(
                "模拟到达结束日: {} 步, 释放 {}, 退役 {}",
                self.total_steps,
                self.pool.counters().released,
                self.pool.counters().decayed
            );
        }
        Ok(())
    }
}
