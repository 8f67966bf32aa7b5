use super::{unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot};
use crate::script::{BuiltInMethod, ScriptResult, ScriptValue};

/// Branch target. Carries the entry/exit and keyboard handlers of one screen.
#[derive(Debug)]
pub struct ScreenActor {
    header: ActorHeader,
}

impl ScreenActor {
    pub fn new(id: u32, context_id: u32) -> Self {
        Self {
            header: ActorHeader::new(id, context_id),
        }
    }
}

impl Actor for ScreenActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Screen
    }

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        _args: &[ScriptValue],
        _cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue> {
        Err(unsupported(ActorKind::Screen, self.header.id(), method))
    }

    fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot::new(&self.header, ActorKind::Screen, false)
    }
}
