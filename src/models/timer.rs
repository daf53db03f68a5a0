use crate::models::Clock;
use serde::Serialize;
use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::{
    sync::{broadcast, Notify},
    task::JoinHandle,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Waiting { starts_in_secs: u64 },
    Tick { remaining_secs: u64 },
    Expired,
}

impl TimerEvent {
    /// What a countdown clock shows for this event.
    pub fn display(&self) -> String {
        match *self {
            TimerEvent::Waiting { starts_in_secs } => Timer::format_time(starts_in_secs),
            TimerEvent::Tick { remaining_secs } => Timer::format_time(remaining_secs),
            TimerEvent::Expired => Timer::format_time(0),
        }
    }
}

/// Once-a-second countdown for a match window, broadcast to whoever is
/// displaying it. The session never depends on it; it reads its own clock.
#[derive(Debug)]
pub struct Timer {
    cancel_token: Arc<Notify>,
    tx: broadcast::Sender<TimerEvent>,
}

impl Timer {
    pub fn new(tx: broadcast::Sender<TimerEvent>) -> Self {
        Self {
            cancel_token: Arc::new(Notify::new()),
            tx,
        }
    }

    pub fn start<C: Clock + 'static>(
        &self,
        clock: C,
        start: SystemTime,
        end: SystemTime,
    ) -> JoinHandle<()> {
        let timer_tx = self.tx.clone();
        let cancel_token = Arc::clone(&self.cancel_token);

        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(Duration::from_secs(1));

            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let event = Timer::event_at(clock.now(), start, end);

                        if let Err(e) = timer_tx.send(event) {
                            debug!("No one listening for timer updates: {}", e);
                        }

                        if event == TimerEvent::Expired {
                            break;
                        }
                    },
                    _ = cancel_token.notified() => {
                        debug!("Timer cancelled");
                        break;
                    }
                }
            }
        })
    }

    pub fn event_at(now: SystemTime, start: SystemTime, end: SystemTime) -> TimerEvent {
        if let Ok(until_start) = start.duration_since(now) {
            if !until_start.is_zero() {
                return TimerEvent::Waiting {
                    starts_in_secs: until_start.as_secs(),
                };
            }
        }

        match end.duration_since(now) {
            Ok(remaining) => TimerEvent::Tick {
                remaining_secs: remaining.as_secs(),
            },
            Err(_) => TimerEvent::Expired,
        }
    }

    pub fn format_time(duration: u64) -> String {
        let minutes = duration / 60;
        let seconds = duration % 60;
        format!("{}:{:02}", minutes, seconds)
    }

    pub fn cancel(&self) {
        self.cancel_token.notify_one();
    }
}
