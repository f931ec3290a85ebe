use crate::device_client::DeviceGateway;
use calid_ui_core::TelemetryState;
use log::debug;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

/// Periodic `/data` poller for the monitoring view.
///
/// The first poll goes out immediately. Polling stops when the poller is
/// stopped or dropped, or when the receiver handed out by [`start`] and all
/// its clones are gone.
///
/// [`start`]: TelemetryPoller::start
pub struct TelemetryPoller {
    task: JoinHandle<()>,
}

impl TelemetryPoller {
    /// Spawn the poll loop. The receiver sees every applied poll.
    pub fn start<G>(gateway: Arc<G>, period: Duration) -> (Self, watch::Receiver<TelemetryState>)
    where
        G: DeviceGateway + Send + Sync + 'static,
    {
        let mut state = TelemetryState::default();
        state.interval_ms = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
        let generation = state.start().unwrap_or(state.generation);
        let (tx, rx) = watch::channel(state.clone());

        let task = tokio::spawn(poll(gateway, period, state, generation, tx));

        (TelemetryPoller { task }, rx)
    }

    pub fn stop(self) {
        debug!("stopping telemetry poller");
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll<G>(
    gateway: Arc<G>,
    period: Duration,
    mut state: TelemetryState,
    generation: u32,
    tx: watch::Sender<TelemetryState>,
) where
    G: DeviceGateway + Send + Sync + 'static,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let sequence = state.next_request();
        let snapshot = gateway.fetch_current_data().await;

        if state.accept(generation, sequence, snapshot) && tx.send(state.clone()).is_err() {
            debug!("telemetry has no subscribers left");
            break;
        }
    }
}
