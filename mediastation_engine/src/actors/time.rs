use std::rc::Rc;

use log::warn;
use serde::Serialize;

use super::ActorCx;
use crate::script::{EventHandler, EventHandlerTable, EventType};

/// Activation window of a time-driven actor.
///
/// While active, `last_processed_time` is the elapsed time seen by the
/// previous poll and never decreases; it returns to 0 whenever the actor is
/// stopped or completes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeState {
    active: bool,
    start_time: u64,
    last_processed_time: u64,
    #[serde(skip)]
    polled: bool,
}

impl TimeState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn last_processed_time(&self) -> u64 {
        self.last_processed_time
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.start_time)
    }

    /// Begins an activation at `now`. Already-running actors are left alone.
    pub fn play(&mut self, actor_id: u32, now: u64) -> bool {
        if self.active {
            warn!("actor {actor_id}: play requested while already playing");
            return false;
        }
        self.restart(now);
        true
    }

    /// Stops an activation on request. Returns false (and warns) if the
    /// actor was not running.
    pub fn stop(&mut self, actor_id: u32) -> bool {
        if !self.active {
            warn!("actor {actor_id}: stop requested while not playing");
            return false;
        }
        self.reset();
        true
    }

    pub(crate) fn restart(&mut self, now: u64) {
        self.active = true;
        self.start_time = now;
        self.last_processed_time = 0;
        self.polled = false;
    }

    /// Deactivates without a warning, as on natural completion.
    pub fn reset(&mut self) {
        self.active = false;
        self.start_time = 0;
        self.last_processed_time = 0;
        self.polled = false;
    }

    /// Timer handlers whose threshold was crossed since the previous poll.
    ///
    /// A handler at `T` ms is due once `elapsed >= T`; it is returned only by
    /// the first poll where that holds, so each fires at most once per
    /// activation however the polls are spaced.
    pub fn poll(&mut self, handlers: &EventHandlerTable, elapsed: u64) -> Vec<Rc<EventHandler>> {
        let previous = self.last_processed_time;
        let first_poll = !self.polled;
        let due = handlers
            .of(EventType::Timer)
            .iter()
            .filter(|handler| match handler.timer_threshold_ms() {
                Some(threshold) if threshold <= elapsed => {
                    if first_poll {
                        threshold >= previous
                    } else {
                        threshold > previous
                    }
                }
                _ => false,
            })
            .cloned()
            .collect();
        self.last_processed_time = elapsed.max(previous);
        self.polled = true;
        due
    }

    /// Polls timers at the context's clock reading, queueing due handlers.
    /// Returns the elapsed time of this activation.
    pub fn advance(&mut self, handlers: &EventHandlerTable, cx: &mut ActorCx<'_>) -> u64 {
        let elapsed = self.elapsed(cx.now());
        for handler in self.poll(handlers, elapsed) {
            cx.fire(handler);
        }
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{ScriptBuilder, ScriptValue};

    fn timers(seconds: &[f64]) -> EventHandlerTable {
        let mut table = EventHandlerTable::new();
        for (index, value) in seconds.iter().enumerate() {
            let mut code = ScriptBuilder::new();
            code.int(index as i32);
            table
                .add(
                    1,
                    EventHandler::new(EventType::Timer, Some(ScriptValue::Float(*value)), code.build()),
                )
                .unwrap();
        }
        table
    }

    #[test]
    fn handler_fires_on_first_poll_past_threshold() {
        let table = timers(&[2.5]);
        let mut time = TimeState::default();
        time.restart(0);
        assert!(time.poll(&table, 1000).is_empty());
        assert!(time.poll(&table, 2000).is_empty());
        assert_eq!(time.poll(&table, 2600).len(), 1);
        assert!(time.poll(&table, 3200).is_empty());
        assert_eq!(time.last_processed_time(), 3200);
    }

    #[test]
    fn zero_threshold_fires_on_first_poll_only() {
        let table = timers(&[0.0]);
        let mut time = TimeState::default();
        time.restart(500);
        assert_eq!(time.poll(&table, 0).len(), 1);
        assert!(time.poll(&table, 0).is_empty());
        assert!(time.poll(&table, 40).is_empty());
    }

    #[test]
    fn exact_threshold_poll_fires_once() {
        let table = timers(&[1.0, 2.0]);
        let mut time = TimeState::default();
        time.restart(0);
        assert_eq!(time.poll(&table, 1000).len(), 1);
        assert_eq!(time.poll(&table, 1000).len(), 0);
        // A late poll crossing the second threshold still delivers it once.
        assert_eq!(time.poll(&table, 5000).len(), 1);
    }

    #[test]
    fn restart_rearms_handlers() {
        let table = timers(&[1.0]);
        let mut time = TimeState::default();
        assert!(time.play(9, 0));
        assert!(!time.play(9, 10));
        assert_eq!(time.poll(&table, 1500).len(), 1);
        assert!(time.stop(9));
        assert!(!time.stop(9));
        assert_eq!(time.last_processed_time(), 0);
        assert!(time.play(9, 2000));
        assert_eq!(time.poll(&table, time.elapsed(3100)).len(), 1);
    }
}
