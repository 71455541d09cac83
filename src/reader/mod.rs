//! # Reader Session
//!
//! Async adapter over `WindowBuffer` for hosts that trigger loads from
//! independent signals (e.g. "near the top" and "near the bottom" of a
//! scroll view firing at the same time).
//!
//! Each extension runs on its own tokio task and reports back through an
//! unbounded channel, the same way the rest of the host's background work
//! would:
//!
//! ```text
//! request_more() ──spawn──► task: begin → fetch → apply ──► WindowEvent::Updated
//! request_previous() ─spawn─► task: ...                 ──► WindowEvent::Updated
//! jump_to() ── abort both tasks, replace window (generation + 1)
//! ```
//!
//! A task that was already past `begin` when a jump happened still finishes,
//! but `WindowBuffer` drops its result and the task sends nothing.

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use crate::core::corpus::{CorpusError, CorpusIndex, FlatChapterRef};
use crate::core::window::{Direction, JumpOutcome, WindowBuffer, WindowState};

/// What a background load reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Updated {
        direction: Direction,
        window: WindowState,
    },
    Failed {
        direction: Direction,
        error: CorpusError,
    },
}

pub struct WindowSession {
    buffer: Arc<WindowBuffer>,
    tx: UnboundedSender<WindowEvent>,
    forward_task: Option<JoinHandle<()>>,
    backward_task: Option<JoinHandle<()>>,
}

impl WindowSession {
    pub fn new(buffer: Arc<WindowBuffer>) -> (Self, UnboundedReceiver<WindowEvent>) {
        let (tx, rx) = unbounded_channel();
        let session = Self {
            buffer,
            tx,
            forward_task: None,
            backward_task: None,
        };
        (session, rx)
    }

    pub fn index(&self) -> &Arc<CorpusIndex> {
        self.buffer.index()
    }

    pub fn snapshot(&self) -> WindowState {
        self.buffer.snapshot()
    }

    pub fn initialize(&mut self, start_count: usize) -> Result<WindowState, CorpusError> {
        self.abort_all();
        self.buffer.initialize(start_count)
    }

    /// Spawns a forward load. Returns `false` when the request is a no-op
    /// (already loading forward, or nothing left).
    ///
    /// `true` means a task was spawned, not that an event will follow: the
    /// task claims the direction when it runs, and sends nothing if another
    /// caller claimed it first.
    pub fn request_more(&mut self) -> bool {
        self.request(Direction::Forward)
    }

    /// Spawns a backward load. Same return contract as `request_more`.
    pub fn request_previous(&mut self) -> bool {
        self.request(Direction::Backward)
    }

    /// Replaces the window around `target`. In-flight loads are aborted or,
    /// if already running, have their results discarded.
    pub fn jump_to(
        &mut self,
        target: FlatChapterRef,
        lookback: usize,
        window_count: usize,
    ) -> Result<JumpOutcome, CorpusError> {
        self.abort_all();
        self.buffer.jump_to(target, lookback, window_count)
    }

    /// Waits for any spawned loads to finish.
    pub async fn settle(&mut self) {
        let handles: Vec<_> = self
            .forward_task
            .take()
            .into_iter()
            .chain(self.backward_task.take())
            .collect();
        for result in join_all(handles).await {
            if let Err(e) = result {
                debug!("Load task ended without result: {}", e);
            }
        }
    }

    fn slot(&mut self, direction: Direction) -> &mut Option<JoinHandle<()>> {
        match direction {
            Direction::Forward => &mut self.forward_task,
            Direction::Backward => &mut self.backward_task,
        }
    }

    fn request(&mut self, direction: Direction) -> bool {
        if self
            .slot(direction)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            debug!("{direction:?} request ignored: task still running");
            return false;
        }

        let state = self.buffer.snapshot();
        let (busy, available) = match direction {
            Direction::Forward => (state.forward_busy, state.has_more),
            Direction::Backward => (state.backward_busy, state.has_prev),
        };
        if busy || !available {
            return false;
        }

        info!("Spawning {direction:?} load");
        let handle = spawn_load(self.buffer.clone(), direction, self.tx.clone());
        *self.slot(direction) = Some(handle);
        true
    }

    fn abort_all(&mut self) {
        for handle in [self.forward_task.take(), self.backward_task.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

impl Drop for WindowSession {
    fn drop(&mut self) {
        self.abort_all();
    }
}

fn spawn_load(
    buffer: Arc<WindowBuffer>,
    direction: Direction,
    tx: UnboundedSender<WindowEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Lost the race to another caller; it will report instead.
        let Some(pending) = buffer.begin(direction) else {
            return;
        };
        let generation = pending.generation();

        let event = match buffer.run(pending) {
            Ok(window) if window.generation != generation => {
                debug!("{direction:?} load finished after a jump, not reporting");
                return;
            }
            Ok(window) => WindowEvent::Updated { direction, window },
            Err(error) => {
                warn!("{direction:?} load failed: {}", error);
                WindowEvent::Failed { direction, error }
            }
        };

        if tx.send(event).is_err() {
            warn!("Failed to send {direction:?} load result: receiver dropped");
        }
    })
}
