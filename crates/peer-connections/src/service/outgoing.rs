//! Outbound path: dial, back off, retry.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use super::core::{AttemptSlot, ConnectionManager};
use super::error::ConnectionManagerError;
use super::events::ManagerEvent;
use crate::domain::{AttemptAction, AttemptId, AttemptInfo, ConnectionRole, OutgoingAttempt, OutgoingTarget};
use crate::ports::TimerError;

impl ConnectionManager {
    /// Create one attempt per target and issue each first connect.
    pub(crate) fn add_targets(&mut self, targets: Vec<OutgoingTarget>) -> Vec<AttemptInfo> {
        let mut infos = Vec::with_capacity(targets.len());
        for target in targets {
            let id = AttemptId::new(self.attempts.len() as u32);
            let mut machine = OutgoingAttempt::new(id, target, self.retry_policy);
            let action = machine.start();

            info!(attempt = %id, target = %machine.target(), "starting outgoing connection");
            self.attempts.push(AttemptSlot {
                machine,
                dial_task: None,
                timer_task: None,
            });
            self.apply(id, action);

            if let Some(slot) = self.attempts.get(id.as_u32() as usize) {
                infos.push(slot.machine.info());
            }
        }
        infos
    }

    /// Carry out the side effect a transition asked for.
    pub(crate) fn apply(&mut self, id: AttemptId, action: AttemptAction) {
        match action {
            AttemptAction::Dial => self.dial(id),
            AttemptAction::ScheduleRetry { delay, generation } => self.arm_retry(id, delay, generation),
        }
    }

    /// Issue a connect toward the attempt's target.
    pub(crate) fn dial(&mut self, id: AttemptId) {
        let Some(slot) = self.attempts.get_mut(id.as_u32() as usize) else {
            return;
        };
        let target = slot.machine.target().clone();
        let dialer = Arc::clone(&self.ports.dialer);
        let events = self.events_tx.clone();

        debug!(attempt = %id, target = %target, dial = slot.machine.dial_count(), "dialing");
        slot.dial_task = Some(tokio::spawn(async move {
            let result = dialer.dial(&target).await;
            let _ = events.send(ManagerEvent::ConnectCompleted { attempt: id, result });
        }));
    }

    fn arm_retry(&mut self, id: AttemptId, delay: Duration, generation: u64) {
        let Some(slot) = self.attempts.get_mut(id.as_u32() as usize) else {
            return;
        };
        let timer = Arc::clone(&self.ports.retry_timer);
        let events = self.events_tx.clone();

        debug!(attempt = %id, target = %slot.machine.target(), ?delay, generation, "retry scheduled");
        if let Some(stale) = slot.timer_task.take() {
            stale.abort();
        }
        slot.timer_task = Some(tokio::spawn(async move {
            let result = timer.wait(delay).await;
            let _ = events.send(ManagerEvent::RetryElapsed {
                attempt: id,
                generation,
                result,
            });
        }));
    }

    pub(crate) fn on_connect_completed(&mut self, id: AttemptId, result: io::Result<TcpStream>) {
        let Some(slot) = self.attempts.get_mut(id.as_u32() as usize) else {
            error!(attempt = %id, "connect completed for unknown attempt");
            return;
        };
        slot.dial_task = None;

        match result {
            Ok(socket) => {
                if !slot.machine.is_connecting() {
                    error!(attempt = %id, state = %slot.machine.state(), "unexpected connect completion dropped");
                    return;
                }
                if let Some(timer) = slot.timer_task.take() {
                    timer.abort();
                }

                let handle = self.register_connection(ConnectionRole::Outbound { attempt: id }, socket, None);
                let Some(slot) = self.attempts.get_mut(id.as_u32() as usize) else {
                    return;
                };
                match slot.machine.on_connected(handle) {
                    Ok(()) => info!(attempt = %id, target = %slot.machine.target(), handle = %handle, "Connection good!"),
                    Err(e) => error!(attempt = %id, handle = %handle, error = %e, "connect completion ignored"),
                }
            }
            Err(e) => {
                let failure = ConnectionManagerError::ConnectFailed {
                    target: slot.machine.target().to_string(),
                    reason: e.to_string(),
                };
                warn!(attempt = %id, error = %failure, "connection failed");

                match slot.machine.on_connect_failed(e.to_string()) {
                    Ok(action) => self.apply(id, action),
                    Err(e) => error!(attempt = %id, error = %e, "connect failure ignored"),
                }
            }
        }
    }

    /// Timer finished. Stale expiries are dropped; a broken timer is fatal.
    pub(crate) fn on_retry_elapsed(
        &mut self,
        id: AttemptId,
        generation: u64,
        result: Result<(), TimerError>,
    ) -> Result<(), ConnectionManagerError> {
        let Some(slot) = self.attempts.get_mut(id.as_u32() as usize) else {
            return Ok(());
        };
        if generation != slot.machine.timer_generation() {
            debug!(attempt = %id, generation, "stale retry timer ignored");
            return Ok(());
        }
        slot.timer_task = None;

        if let Err(e) = result {
            let failure = ConnectionManagerError::TimerSchedulingFailed {
                target: slot.machine.target().to_string(),
                reason: e.to_string(),
            };
            error!(attempt = %id, error = %failure, "retry timer failed");
            return Err(failure);
        }

        match slot.machine.on_retry_elapsed(generation) {
            Some(action) => self.apply(id, action),
            None => debug!(attempt = %id, state = %slot.machine.state(), "retry expiry ignored"),
        }
        Ok(())
    }
}
