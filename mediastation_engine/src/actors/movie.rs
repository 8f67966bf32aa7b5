use serde::Deserialize;

use super::{unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, SpatialState, TimeState};
use crate::script::{BuiltInMethod, EventType, ScriptResult, ScriptValue};
use crate::types::Rect;

/// Display interval of one decoded movie frame, relative to play start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MovieFrame {
    pub start_ms: u64,
    pub end_ms: u64,
}

#[derive(Debug)]
pub struct MovieActor {
    header: ActorHeader,
    spatial: SpatialState,
    time: TimeState,
    frames: Vec<MovieFrame>,
    /// Indices into `frames` not shown yet this activation.
    pending: Vec<usize>,
    on_screen: Vec<usize>,
}

impl MovieActor {
    pub fn new(id: u32, context_id: u32, spatial: SpatialState, mut frames: Vec<MovieFrame>) -> Self {
        frames.sort_by_key(|frame| (frame.start_ms, frame.end_ms));
        Self {
            header: ActorHeader::new(id, context_id),
            spatial,
            time: TimeState::default(),
            frames,
            pending: Vec::new(),
            on_screen: Vec::new(),
        }
    }

    pub fn frames_on_screen(&self) -> &[usize] {
        &self.on_screen
    }

    fn play(&mut self, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        if !self.time.play(id, cx.now()) {
            return;
        }
        self.pending = (0..self.frames.len()).collect();
        self.on_screen.clear();
        cx.log(format!("actor.{id}.time_play"));
        cx.fire_event(self.header.handlers(), EventType::MovieBegin, None);
    }

    fn stop(&mut self, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        if !self.time.stop(id) {
            return;
        }
        self.pending.clear();
        if !self.on_screen.is_empty() {
            self.on_screen.clear();
            self.spatial.invalidate(cx);
        }
        cx.log(format!("actor.{id}.time_stop"));
        cx.fire_event(self.header.handlers(), EventType::MovieStopped, None);
    }

    /// Moves frames between the pending and on-screen sets for `elapsed`.
    /// Returns whether anything changed.
    fn update_frames(&mut self, elapsed: u64) -> bool {
        let frames = &self.frames;
        let mut changed = false;

        let before = self.on_screen.len();
        self.on_screen
            .retain(|index| frames[*index].end_ms > elapsed);
        changed |= self.on_screen.len() != before;

        let mut still_pending = Vec::with_capacity(self.pending.len());
        for index in self.pending.drain(..) {
            let frame = frames[index];
            if frame.start_ms > elapsed {
                still_pending.push(index);
            } else if frame.end_ms > elapsed {
                self.on_screen.push(index);
                changed = true;
            } else {
                // Shown and gone between two polls.
                changed = true;
            }
        }
        self.pending = still_pending;
        changed
    }
}

impl Actor for MovieActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Movie
    }

    fn is_active(&self) -> bool {
        self.time.is_active()
    }

    fn process(&mut self, cx: &mut ActorCx<'_>) {
        if !self.time.is_active() {
            return;
        }
        let elapsed = self.time.advance(self.header.handlers(), cx);
        if self.update_frames(elapsed) {
            self.spatial.invalidate(cx);
        }
        if self.pending.is_empty() && self.on_screen.is_empty() {
            self.time.reset();
            cx.log(format!("actor.{}.movie_end", self.header.id()));
            cx.fire_event(self.header.handlers(), EventType::MovieEnd, None);
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
            BuiltInMethod::IsPlaying => return Ok(ScriptValue::Bool(self.time.is_active())),
            _ => {
                let id = self.header.id();
                return self
                    .spatial
                    .handle(id, method, args, cx)
                    .unwrap_or_else(|| Err(unsupported(ActorKind::Movie, id, method)));
            }
        }
        Ok(ScriptValue::Empty)
    }

    fn bounds(&self) -> Option<Rect> {
        Some(self.spatial.bounds())
    }

    fn z_index(&self) -> i32 {
        self.spatial.z_index()
    }

    fn is_visible(&self) -> bool {
        self.spatial.is_visible()
    }

    fn snapshot(&self) -> ActorSnapshot {
        let mut snapshot = ActorSnapshot::new(&self.header, ActorKind::Movie, self.time.is_active())
            .with_spatial(&self.spatial);
        snapshot.frames_on_screen = self.on_screen.clone();
        snapshot
    }
}
