//! Tokio-backed host timer facility: each registration is a one-shot
//! sleep task that delivers a fire event into the runtime channel;
//! cancellation aborts the task.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use sw_domain::Result;
use sw_engine::HostTimer;

use crate::runtime::Event;

pub struct TokioTimer {
    events: UnboundedSender<Event>,
}

impl TokioTimer {
    pub fn new(events: UnboundedSender<Event>) -> Self {
        Self { events }
    }
}

impl HostTimer for TokioTimer {
    type Handle = JoinHandle<()>;

    fn register(&mut self, interval_ms: u64) -> Result<JoinHandle<()>> {
        let events = self.events.clone();
        Ok(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            let _ = events.send(Event::TimerFired);
        }))
    }

    fn cancel(&mut self, handle: JoinHandle<()>) {
        handle.abort();
    }
}
