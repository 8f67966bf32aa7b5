use super::{unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, TimeState};
use crate::script::{BuiltInMethod, EventType, ScriptResult, ScriptValue};

/// Audio asset of known length. Playback itself happens behind the
/// `AudioCallback` boundary.
#[derive(Debug)]
pub struct SoundActor {
    header: ActorHeader,
    time: TimeState,
    duration_ms: u64,
}

impl SoundActor {
    pub fn new(id: u32, context_id: u32, duration_ms: u64) -> Self {
        Self {
            header: ActorHeader::new(id, context_id),
            time: TimeState::default(),
            duration_ms,
        }
    }

    fn play(&mut self, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        if !self.time.play(id, cx.now()) {
            return;
        }
        if let Some(audio) = cx.audio() {
            audio.sound_play(id);
        }
        cx.log(format!("actor.{id}.time_play"));
        cx.fire_event(self.header.handlers(), EventType::SoundBegin, None);
    }

    fn stop(&mut self, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        if !self.time.stop(id) {
            return;
        }
        if let Some(audio) = cx.audio() {
            audio.sound_stop(id);
        }
        cx.log(format!("actor.{id}.time_stop"));
        cx.fire_event(self.header.handlers(), EventType::SoundStopped, None);
    }
}

impl Actor for SoundActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Sound
    }

    fn is_active(&self) -> bool {
        self.time.is_active()
    }

    fn process(&mut self, cx: &mut ActorCx<'_>) {
        if !self.time.is_active() {
            return;
        }
        let elapsed = self.time.advance(self.header.handlers(), cx);
        if elapsed >= self.duration_ms {
            self.time.reset();
            cx.log(format!("actor.{}.sound_end", self.header.id()));
            cx.fire_event(self.header.handlers(), EventType::SoundEnd, None);
        }
    }

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        _args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue> {
        match method {
            BuiltInMethod::TimePlay => self.play(cx),
            BuiltInMethod::TimeStop => self.stop(cx),
            BuiltInMethod::IsPlaying => return Ok(ScriptValue::Bool(self.time.is_active())),
            _ => return Err(unsupported(ActorKind::Sound, self.header.id(), method)),
        }
        Ok(ScriptValue::Empty)
    }

    fn release(&mut self, cx: &mut ActorCx<'_>) {
        if self.time.is_active() {
            self.time.reset();
            if let Some(audio) = cx.audio() {
                audio.sound_stop(self.header.id());
            }
        }
    }

    fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot::new(&self.header, ActorKind::Sound, self.time.is_active())
    }
}
