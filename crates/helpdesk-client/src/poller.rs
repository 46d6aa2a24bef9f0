//! Background refresh of an open ticket.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::controller::{TicketBackend, TicketController};

/// Handle to a running poller. [`PollHandle::stop`] ends it gracefully;
/// dropping the handle aborts it.
#[derive(Debug)]
pub struct PollHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Signals the poller and waits for it to finish its current refresh.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
            && err.is_panic()
        {
            warn!("ticket poller panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub struct Poller;

impl Poller {
    /// Refreshes `controller` every `period` until stopped or until the
    /// controller is closed. The first refresh happens one period after
    /// spawning. Ticks that land while the initial load is still running are
    /// skipped, and refresh failures are logged and otherwise ignored.
    pub fn spawn<B>(controller: Arc<TicketController<B>>, period: Duration) -> PollHandle
    where
        B: TicketBackend + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if controller.is_closed() {
                            break;
                        }
                        if controller.is_loading() {
                            debug!(ticket_id = controller.ticket_id(), "load in flight, skipping poll");
                            continue;
                        }
                        if let Err(err) = controller.refresh().await {
                            warn!(ticket_id = controller.ticket_id(), error = %err, "background refresh failed");
                        }
                    }
                }
            }
            debug!(ticket_id = controller.ticket_id(), "ticket poller stopped");
        });

        PollHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}
