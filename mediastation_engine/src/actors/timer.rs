use super::{unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, TimeState};
use crate::script::{BuiltInMethod, ScriptResult, ScriptValue};

/// Invisible clock that only fires its timer handlers.
#[derive(Debug)]
pub struct TimerActor {
    header: ActorHeader,
    time: TimeState,
}

impl TimerActor {
    pub fn new(id: u32, context_id: u32) -> Self {
        Self {
            header: ActorHeader::new(id, context_id),
            time: TimeState::default(),
        }
    }

    pub fn time(&self) -> &TimeState {
        &self.time
    }
}

impl Actor for TimerActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Timer
    }

    fn is_active(&self) -> bool {
        self.time.is_active()
    }

    fn process(&mut self, cx: &mut ActorCx<'_>) {
        if self.time.is_active() {
            self.time.advance(self.header.handlers(), cx);
        }
    }

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        _args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue> {
        let id = self.header.id();
        match method {
            BuiltInMethod::TimePlay => {
                if self.time.play(id, cx.now()) {
                    cx.log(format!("actor.{id}.time_play"));
                }
            }
            BuiltInMethod::TimeStop => {
                if self.time.stop(id) {
                    cx.log(format!("actor.{id}.time_stop"));
                }
            }
            BuiltInMethod::IsPlaying => return Ok(ScriptValue::Bool(self.time.is_active())),
            _ => return Err(unsupported(ActorKind::Timer, id, method)),
        }
        Ok(ScriptValue::Empty)
    }

    fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot::new(&self.header, ActorKind::Timer, self.time.is_active())
    }
}
