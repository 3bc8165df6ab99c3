use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::TimerError;
use crate::models::content::ContentRef;
use crate::models::session::{format_clock, SessionState, SessionStatus};

/// One-shot side effect run when a session expires.
///
/// Called while the timer is locked; it must not call back into the
/// `TimerHandle` that owns it.
pub type Completion = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Countdown state machine for a single timed session.
///
/// `Idle -> Running -> {Expired, Cancelled}`. Remaining time is always
/// derived from the arm instant, never from a tick count, so a host that
/// was suspended catches up on the next tick instead of drifting.
pub struct SessionTimer {
    content: ContentRef,
    status: SessionStatus,
    duration_seconds: u64,
    remaining_seconds: u64,
    armed_at: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    completed: bool,
    on_complete: Completion,
}

impl SessionTimer {
    pub fn new(content: ContentRef, on_complete: Completion) -> Self {
        let duration_seconds = content.duration_seconds;
        Self {
            content,
            status: SessionStatus::Idle,
            duration_seconds,
            remaining_seconds: duration_seconds,
            armed_at: None,
            started_at: None,
            completed: false,
            on_complete,
        }
    }

    /// Starts the countdown. Allowed from `Idle` and `Expired`.
    pub fn arm(&mut self, duration_seconds: u64, now: Instant) -> Result<(), TimerError> {
        match self.status {
            SessionStatus::Running => return Err(TimerError::AlreadyRunning),
            SessionStatus::Cancelled => return Err(TimerError::Cancelled),
            SessionStatus::Idle | SessionStatus::Expired => {}
        }

        self.status = SessionStatus::Running;
        self.duration_seconds = duration_seconds;
        self.remaining_seconds = duration_seconds;
        self.armed_at = Some(now);
        self.started_at = Some(Utc::now());
        self.completed = false;

        tracing::info!(
            "⏱️ Session armed for {} {} ({}s)",
            self.content.kind,
            self.content.slug,
            duration_seconds
        );
        Ok(())
    }

    /// Recomputes the remaining time and expires the session at zero.
    ///
    /// Safe to call any number of times; the completion fires at most once
    /// per arm.
    pub fn tick(&mut self, now: Instant) -> SessionStatus {
        if self.status != SessionStatus::Running {
            return self.status;
        }

        let Some(armed_at) = self.armed_at else {
            return self.status;
        };

        let elapsed = now.saturating_duration_since(armed_at).as_secs();
        self.remaining_seconds = self.duration_seconds.saturating_sub(elapsed);

        if self.remaining_seconds == 0 {
            self.status = SessionStatus::Expired;
            if !self.completed {
                self.completed = true;
                tracing::info!("⏰ Session expired: {} {}", self.content.kind, self.content.slug);
                let state = self.state();
                (self.on_complete)(&state);
            }
        }

        self.status
    }

    /// Stops a running session. The completion will never fire afterwards.
    ///
    /// Returns `false` if the session was not running.
    pub fn cancel(&mut self) -> bool {
        if self.status != SessionStatus::Running {
            return false;
        }
        self.status = SessionStatus::Cancelled;
        tracing::info!("🛑 Session cancelled: {} {}", self.content.kind, self.content.slug);
        true
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// `mm:ss` countdown.
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            content: self.content.clone(),
            remaining_seconds: self.remaining_seconds,
            started_at: self.started_at,
            status: self.status,
        }
    }
}

/// A running `SessionTimer` plus the task that ticks it once per second.
///
/// Dropping the handle cancels the session.
pub struct TimerHandle {
    timer: Arc<Mutex<SessionTimer>>,
    ticker: JoinHandle<()>,
}

impl TimerHandle {
    /// Arms a timer for `content.duration_seconds` and starts ticking.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(content: ContentRef, on_complete: Completion) -> Result<Self, TimerError> {
        let duration = content.duration_seconds;
        let mut timer = SessionTimer::new(content, on_complete);
        timer.arm(duration, Instant::now())?;

        let timer = Arc::new(Mutex::new(timer));
        let ticker = tokio::spawn(run_ticker(Arc::clone(&timer)));

        Ok(Self { timer, ticker })
    }

    /// Current state, refreshed against the clock.
    pub fn state(&self) -> SessionState {
        let mut timer = lock(&self.timer);
        timer.tick(Instant::now());
        timer.state()
    }

    /// Cancels the session and releases the ticker.
    pub fn cancel(&self) -> bool {
        let cancelled = lock(&self.timer).cancel();
        self.ticker.abort();
        cancelled
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_ticker(timer: Arc<Mutex<SessionTimer>>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let status = lock(&timer).tick(Instant::now());
        if status.is_finished() {
            break;
        }
    }
}

fn lock(timer: &Mutex<SessionTimer>) -> MutexGuard<'_, SessionTimer> {
    timer.lock().unwrap_or_else(PoisonError::into_inner)
}
