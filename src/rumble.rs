use crate::driver::{RumbleState, Slot, VirtualBus};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Background poller for a slot's rumble motors.
///
/// The driver only reports motor speeds when asked, so a thread polls
/// `GetVibration` and pushes a [`RumbleState`] whenever it changes. Dropping
/// the monitor stops the thread.
pub struct RumbleMonitor {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RumbleMonitor {
    pub fn spawn<B: VirtualBus + ?Sized + 'static>(
        bus: Arc<B>,
        slot: Slot,
        interval: Duration,
    ) -> (Self, Receiver<RumbleState>) {
        let (rumble_tx, rumble_rx) = crossbeam_channel::unbounded();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let thread = std::thread::spawn(move || {
            log::debug!("Rumble polling started for slot {}", slot);
            let mut last: Option<RumbleState> = None;

            loop {
                match bus.vibration(slot) {
                    Some(vibration) => {
                        let state = RumbleState::from(vibration);
                        if last != Some(state) {
                            log::trace!(
                                "Rumble update on slot {}: large={:.2}, small={:.2}",
                                slot,
                                state.large_motor,
                                state.small_motor
                            );
                            if rumble_tx.send(state).is_err() {
                                break; // receiver gone
                            }
                            last = Some(state);
                        }
                    }
                    None => log::trace!("GetVibration failed for slot {}", slot),
                }

                // Sleeps for one interval; a dropped sender wakes us immediately
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }

            log::debug!("Rumble polling stopped for slot {}", slot);
        });

        (
            Self {
                stop_tx: Some(stop_tx),
                thread: Some(thread),
            },
            rumble_rx,
        )
    }

    pub fn stop(&mut self) {
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            if let Err(e) = thread.join() {
                log::error!("Rumble polling thread panicked: {:?}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for RumbleMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockBus;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn plugged_bus(slot: Slot) -> Arc<MockBus> {
        let bus = Arc::new(MockBus::new());
        assert!(bus.plug_in(slot));
        bus
    }

    #[test]
    fn reports_initial_state_and_changes() {
        let slot = Slot::new(1).unwrap();
        let bus = plugged_bus(slot);
        let (_monitor, rx) = RumbleMonitor::spawn(Arc::clone(&bus), slot, Duration::from_millis(5));

        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), RumbleState::default());

        bus.set_vibration(slot, u16::MAX, 0);
        let update = rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(update.large_motor, 1.0);
        assert_eq!(update.small_motor, 0.0);
    }

    #[test]
    fn unchanged_levels_are_not_repeated() {
        let slot = Slot::new(2).unwrap();
        let bus = plugged_bus(slot);
        let (_monitor, rx) = RumbleMonitor::spawn(Arc::clone(&bus), slot, Duration::from_millis(2));

        rx.recv_timeout(TIMEOUT).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stop_joins_the_thread() {
        let slot = Slot::new(3).unwrap();
        let bus = plugged_bus(slot);
        let (mut monitor, rx) = RumbleMonitor::spawn(bus, slot, Duration::from_secs(60));
        rx.recv_timeout(TIMEOUT).unwrap();

        monitor.stop();
        assert!(!monitor.is_running());
        // Sender side is gone once the thread exits
        assert!(rx.recv_timeout(TIMEOUT).is_err());
    }

    #[test]
    fn failed_polls_are_skipped() {
        let slot = Slot::new(4).unwrap();
        let bus = Arc::new(MockBus::new());
        let (_monitor, rx) = RumbleMonitor::spawn(Arc::clone(&bus), slot, Duration::from_millis(2));

        // Not plugged yet, so nothing arrives
        assert!(rx.recv_timeout(Duration::from_millis(30)).is_err());

        bus.plug_in(slot);
        bus.set_vibration(slot, 0, u16::MAX);
        // A neutral reading may land between plug-in and the vibration change
        let update = std::iter::from_fn(|| rx.recv_timeout(TIMEOUT).ok())
            .find(|state| state.small_motor == 1.0);
        assert!(update.is_some());
    }
}
