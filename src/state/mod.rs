use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::utils::DeskResult;

/// 请求序号，单调递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// 视图当前所处的阶段。区分“还没加载”和“加载失败”。
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

struct SlotInner<T> {
    latest: u64,
    phase: Phase,
    data: Option<T>,
}

/// 单个视图持有的数据槽。
///
/// 每次发请求前调用 [`ViewSlot::begin`] 领取序号，响应回来时只有序号等于最新序号才会写入；
/// 慢的旧请求晚到时直接丢弃，不会覆盖新数据。失败时保留上一次成功的数据。
pub struct ViewSlot<T: Clone> {
    inner: Arc<RwLock<SlotInner<T>>>,
}

impl<T: Clone> Clone for ViewSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Default for ViewSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ViewSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SlotInner {
                latest: 0,
                phase: Phase::Idle,
                data: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SlotInner<T>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SlotInner<T>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self) -> Ticket {
        let mut inner = self.write();
        inner.latest += 1;
        inner.phase = Phase::Loading;
        Ticket(inner.latest)
    }

    /// 写入响应，返回是否被采纳
    pub fn resolve<E: Display>(&self, ticket: Ticket, result: Result<T, E>) -> bool {
        let mut inner = self.write();
        if ticket.0 != inner.latest {
            debug!("丢弃过期响应: 序号 {} (最新 {})", ticket.0, inner.latest);
            return false;
        }

        match result {
            Ok(data) => {
                inner.data = Some(data);
                inner.phase = Phase::Loaded;
            }
            Err(e) => {
                inner.phase = Phase::Failed(e.to_string());
            }
        }
        true
    }

    pub fn state(&self) -> LoadState<T> {
        let inner = self.read();
        match (&inner.phase, &inner.data) {
            (Phase::Idle, _) => LoadState::Idle,
            (Phase::Loading, _) => LoadState::Loading,
            (Phase::Loaded, Some(data)) => LoadState::Loaded(data.clone()),
            (Phase::Loaded, None) => LoadState::Idle,
            (Phase::Failed(message), _) => LoadState::Failed(message.clone()),
        }
    }

    /// 最近一次被采纳的数据（失败后仍保留）
    pub fn data(&self) -> Option<T> {
        self.read().data.clone()
    }
}

/// 按固定周期刷新一个视图，直到 `shutdown` 完成。
///
/// 同一时间只有一个请求在途：上一次还没返回时跳过本轮，不领取新序号，
/// 否则后端比周期慢时每个响应都会被下一轮作废，视图永远停在 Loading。
/// 每次有响应被采纳就调用一次 `on_update`。
pub async fn refresh_every<T, F, Fut, S>(
    slot: &ViewSlot<T>,
    period: Duration,
    fetch: F,
    mut on_update: impl FnMut(&ViewSlot<T>),
    shutdown: S,
) where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = DeskResult<T>> + Send + 'static,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<bool>();
    let mut in_flight = false;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if in_flight {
                    debug!("上一次刷新尚未返回，跳过本轮");
                } else {
                    in_flight = true;
                    let ticket = slot.begin();
                    let slot = slot.clone();
                    let done_tx = done_tx.clone();
                    let request = fetch();
                    tokio::spawn(async move {
                        let result = request.await;
                        if let Err(ref e) = result {
                            warn!("刷新失败: {}", e);
                        }
                        let accepted = slot.resolve(ticket, result);
                        let _ = done_tx.send(accepted);
                    });
                }
            }
            Some(accepted) = done_rx.recv() => {
                in_flight = false;
                if accepted {
                    on_update(slot);
                }
            }
            _ = &mut shutdown => {
                debug!("停止刷新");
                break;
            }
        }
    }
}
