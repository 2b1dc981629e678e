// crates/mt_data/src/cache.rs

//! 日数据包 LRU 缓存
//!
//! 最多驻留 N 个日数据包。最近激活的一天视为"活动日"，
//! 永不淘汰；溢出时丢弃最久未激活的一天。同一天的并发加载
//! 去重：后到的请求等待先到请求的共享结果。加载失败时
//! 清除在途标记并向上传播错误，不留半成品条目。

use crate::error::DataResult;
use chrono::NaiveDate;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// 默认驻留天数
pub const DEFAULT_CAPACITY: usize = 3;

struct CacheState<T> {
    entries: HashMap<NaiveDate, Arc<T>>,
    /// 激活顺序，队首为活动日
    recency: VecDeque<NaiveDate>,
    /// 在途加载的日期
    loading: HashSet<NaiveDate>,
}

/// 日数据包 LRU 缓存
pub struct LruDayCache<T> {
    capacity: usize,
    state: Mutex<CacheState<T>>,
    cond: Condvar,
}

impl<T> LruDayCache<T> {
    /// 创建容量为 `capacity`（至少 1）的缓存
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                recency: VecDeque::new(),
                loading: HashSet::new(),
            }),
            cond: Condvar::new(),
        }
    }

    /// 取出某天的数据包，缺失时用 `load` 加载
    ///
    /// 加载在锁外执行；同一天的并发请求共享一次加载。
    pub fn get_or_load<F>(&self, date: NaiveDate, load: F) -> DataResult<Arc<T>>
    where
        F: FnOnce() -> DataResult<T>,
    {
        let mut st = self.state.lock();
        loop {
            if let Some(v) = st.entries.get(&date) {
                let v = v.clone();
                Self::touch(&mut st, date);
                return Ok(v);
            }
            if st.loading.contains(&date) {
                self.cond.wait(&mut st);
                continue;
            }
            break;
        }
        st.loading.insert(date);
        drop(st);

        let result = load();

        let mut st = self.state.lock();
        st.loading.remove(&date);
        match result {
            Ok(bundle) => {
                let arc = Arc::new(bundle);
                st.entries.insert(date, arc.clone());
                Self::touch(&mut st, date);
                while st.entries.len() > self.capacity {
                    // 队首是活动日，只会从队尾淘汰
                    if let Some(old) = st.recency.pop_back() {
                        st.entries.remove(&old);
                        tracing::debug!("日缓存淘汰: {}", old);
                    } else {
                        break;
                    }
                }
                self.cond.notify_all();
                Ok(arc)
            }
            Err(e) => {
                self.cond.notify_all();
                Err(e)
            }
        }
    }

    fn touch(st: &mut CacheState<T>, date: NaiveDate) {
        if let Some(pos) = st.recency.iter().position(|d| *d == date) {
            st.recency.remove(pos);
        }
        st.recency.push_front(date);
    }

    /// 当前活动日
    #[must_use]
    pub fn active_day(&self) -> Option<NaiveDate> {
        self.state.lock().recency.front().copied()
    }

    /// 某天是否驻留
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.state.lock().entries.contains_key(&date)
    }

    /// 驻留天数
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空缓存
    pub fn clear(&self) {
        let mut st = self.state.lock();
        st.entries.clear();
        st.recency.clear();
    }
}
