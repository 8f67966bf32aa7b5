use log::warn;

use super::{millis_arg, unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, TimeState};
use crate::script::{BuiltInMethod, EventType, ScriptResult, ScriptValue};
use crate::types::Point;

/// Moves a point from `start` to `end` in fixed steps.
///
/// `total_steps = duration_ms * step_rate / 1000`; one step elapses every
/// `1000 / step_rate` ms and fires `PathStep`.
#[derive(Debug)]
pub struct PathActor {
    header: ActorHeader,
    time: TimeState,
    start: Point,
    end: Point,
    duration_ms: u64,
    step_rate: u32,
    steps_taken: u64,
    percent_complete: f64,
}

impl PathActor {
    pub fn new(
        id: u32,
        context_id: u32,
        start: Point,
        end: Point,
        duration_ms: u64,
        step_rate: u32,
    ) -> Self {
        if step_rate == 0 {
            warn!("path {id}: step rate 0, treating as 1 step/s");
        }
        Self {
            header: ActorHeader::new(id, context_id),
            time: TimeState::default(),
            start,
            end,
            duration_ms,
            step_rate: step_rate.max(1),
            steps_taken: 0,
            percent_complete: 0.0,
        }
    }

    pub fn total_steps(&self) -> u64 {
        self.duration_ms * self.step_rate as u64 / 1000
    }

    fn step_interval_ms(&self) -> u64 {
        (1000 / self.step_rate as u64).max(1)
    }

    pub fn percent_complete(&self) -> f64 {
        self.percent_complete
    }

    pub fn current_point(&self) -> Point {
        self.start.lerp(self.end, self.percent_complete)
    }

    fn play(&mut self, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        if self.time.play(id, cx.now()) {
            self.steps_taken = 0;
            self.percent_complete = 0.0;
            cx.log(format!("actor.{id}.time_play"));
        }
    }

    fn stop(&mut self, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        if self.time.stop(id) {
            cx.log(format!("actor.{id}.time_stop"));
            cx.fire_event(self.header.handlers(), EventType::PathStopped, None);
        }
    }
}

impl Actor for PathActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Path
    }

    fn is_active(&self) -> bool {
        self.time.is_active()
    }

    fn process(&mut self, cx: &mut ActorCx<'_>) {
        if !self.time.is_active() {
            return;
        }
        let elapsed = self.time.advance(self.header.handlers(), cx);
        let total = self.total_steps();
        let crossed = (elapsed / self.step_interval_ms()).min(total);
        while self.steps_taken < crossed {
            self.steps_taken += 1;
            self.percent_complete = self.steps_taken as f64 / total as f64;
            cx.fire_event(self.header.handlers(), EventType::PathStep, None);
        }
        if self.steps_taken >= total {
            self.percent_complete = 1.0;
            self.time.reset();
            cx.log(format!("actor.{}.path_end", self.header.id()));
            cx.fire_event(self.header.handlers(), EventType::PathEnd, None);
        }
    }

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue> {
        match method {
            BuiltInMethod::TimePlay => self.play(cx),
            BuiltInMethod::TimeStop => self.stop(cx),
            BuiltInMethod::SetDuration => {
                self.duration_ms = millis_arg(args, 0, method)?;
                if self.time.is_active() {
                    warn!(
                        "path {}: duration changed while playing",
                        self.header.id()
                    );
                }
            }
            BuiltInMethod::PercentComplete => {
                return Ok(ScriptValue::Float(self.percent_complete))
            }
            BuiltInMethod::GetPathX => return Ok(ScriptValue::Int(self.current_point().x as i64)),
            BuiltInMethod::GetPathY => return Ok(ScriptValue::Int(self.current_point().y as i64)),
            BuiltInMethod::IsPlaying => return Ok(ScriptValue::Bool(self.time.is_active())),
            _ => return Err(unsupported(ActorKind::Path, self.header.id(), method)),
        }
        Ok(ScriptValue::Empty)
    }

    fn snapshot(&self) -> ActorSnapshot {
        let mut snapshot = ActorSnapshot::new(&self.header, ActorKind::Path, self.time.is_active());
        snapshot.percent_complete = Some(self.percent_complete);
        snapshot.position = Some(self.current_point());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::tests::with_cx;
    use crate::actors::ActorRegistry;
    use crate::script::{EventHandler, ScriptBuilder};

    fn path() -> PathActor {
        let mut path = PathActor::new(20, 1, Point::new(0, 0), Point::new(100, 50), 1000, 10);
        for event in [EventType::PathStep, EventType::PathEnd, EventType::PathStopped] {
            path.header_mut()
                .add_handler(EventHandler::new(event, None, ScriptBuilder::new().build()))
                .unwrap();
        }
        path
    }

    fn count(fired: &[std::rc::Rc<EventHandler>], event: EventType) -> usize {
        fired.iter().filter(|handler| handler.event() == event).count()
    }

    #[test]
    fn steps_then_ends_once() {
        let registry = ActorRegistry::new();
        let mut path = path();
        assert_eq!(path.total_steps(), 10);
        with_cx(0, &registry, |cx| path.call_method(BuiltInMethod::TimePlay, &[], cx).unwrap());

        let (_, _, _, fired) = with_cx(450, &registry, |cx| path.process(cx));
        assert_eq!(count(&fired, EventType::PathStep), 4);
        assert_eq!(path.current_point(), Point::new(40, 20));

        let mut ends = 0;
        let mut steps = 4;
        for now in [1000, 1100, 1200] {
            let (_, _, _, fired) = with_cx(now, &registry, |cx| path.process(cx));
            ends += count(&fired, EventType::PathEnd);
            steps += count(&fired, EventType::PathStep);
        }
        assert_eq!(steps, 10);
        assert_eq!(ends, 1);
        assert_eq!(path.percent_complete(), 1.0);
        assert!(!path.is_active());
    }

    #[test]
    fn explicit_stop_fires_path_stopped() {
        let registry = ActorRegistry::new();
        let mut path = path();
        let (_, _, _, fired) = with_cx(0, &registry, |cx| {
            path.call_method(BuiltInMethod::TimePlay, &[], cx).unwrap();
            path.call_method(BuiltInMethod::TimeStop, &[], cx).unwrap();
        });
        assert_eq!(count(&fired, EventType::PathStopped), 1);
        assert_eq!(count(&fired, EventType::PathEnd), 0);
    }

    #[test]
    fn set_duration_takes_seconds() {
        let registry = ActorRegistry::new();
        let mut path = path();
        with_cx(0, &registry, |cx| {
            path.call_method(BuiltInMethod::SetDuration, &[ScriptValue::Time(2.0)], cx)
                .unwrap()
        });
        assert_eq!(path.total_steps(), 20);
    }
}
