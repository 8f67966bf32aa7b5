use log::warn;
use serde::Deserialize;

use super::{int_arg, unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, SpatialState, TimeState};
use crate::script::{BuiltInMethod, EventType, ScriptResult, ScriptValue};
use crate::types::Rect;

/// Named, inclusive range of sprite frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SpriteClip {
    pub id: u32,
    pub first_frame: u32,
    pub last_frame: u32,
}

#[derive(Debug)]
pub struct SpriteActor {
    header: ActorHeader,
    spatial: SpatialState,
    time: TimeState,
    frame_rate: u32,
    clips: Vec<SpriteClip>,
    current_clip: SpriteClip,
    current_frame: u32,
}

impl SpriteActor {
    /// `clips` may be empty, in which case one clip (id 0) spans all
    /// `frame_count` frames.
    pub fn new(
        id: u32,
        context_id: u32,
        spatial: SpatialState,
        frame_rate: u32,
        frame_count: u32,
        clips: Vec<SpriteClip>,
    ) -> Self {
        let clips = if clips.is_empty() {
            vec![SpriteClip {
                id: 0,
                first_frame: 0,
                last_frame: frame_count.saturating_sub(1),
            }]
        } else {
            clips
        };
        let current_clip = clips[0];
        if frame_rate == 0 {
            warn!("sprite {id}: frame rate 0, treating as 1 fps");
        }
        Self {
            header: ActorHeader::new(id, context_id),
            spatial,
            time: TimeState::default(),
            frame_rate: frame_rate.max(1),
            clips,
            current_frame: current_clip.first_frame,
            current_clip,
        }
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn current_clip_id(&self) -> u32 {
        self.current_clip.id
    }

    fn frame_interval_ms(&self) -> u64 {
        (1000 / self.frame_rate as u64).max(1)
    }

    fn show_frame(&mut self, frame: u32, cx: &mut ActorCx<'_>) {
        if frame != self.current_frame {
            self.current_frame = frame;
            self.spatial.invalidate(cx);
        }
    }

    fn set_clip(&mut self, clip_id: i64, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        let Some(clip) = self.clips.iter().find(|clip| clip.id as i64 == clip_id).copied() else {
            warn!("sprite {id}: no clip {clip_id}; ignored");
            return;
        };
        self.current_clip = clip;
        self.show_frame(clip.first_frame, cx);
        if self.time.is_active() {
            self.time.restart(cx.now());
        }
        cx.log(format!("actor.{id}.set_current_clip {}", clip.id));
    }

    fn step_frame(&mut self, forward: bool, cx: &mut ActorCx<'_>) {
        let SpriteClip {
            first_frame,
            last_frame,
            ..
        } = self.current_clip;
        let next = if forward {
            if self.current_frame >= last_frame {
                first_frame
            } else {
                self.current_frame + 1
            }
        } else if self.current_frame <= first_frame {
            last_frame
        } else {
            self.current_frame - 1
        };
        self.show_frame(next, cx);
    }
}

impl Actor for SpriteActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Sprite
    }

    fn is_active(&self) -> bool {
        self.time.is_active()
    }

    fn process(&mut self, cx: &mut ActorCx<'_>) {
        if !self.time.is_active() {
            return;
        }
        let elapsed = self.time.advance(self.header.handlers(), cx);
        let clip = self.current_clip;
        let advanced = elapsed / self.frame_interval_ms();
        let target = clip.first_frame as u64 + advanced;
        if target > clip.last_frame as u64 {
            self.show_frame(clip.last_frame, cx);
            self.time.reset();
            cx.log(format!("actor.{}.sprite_movie_end {}", self.header.id(), clip.id));
            cx.fire_event(
                self.header.handlers(),
                EventType::SpriteMovieEnd,
                Some(&ScriptValue::Int(clip.id as i64)),
            );
        } else {
            self.show_frame(target as u32, cx);
        }
    }

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue> {
        let id = self.header.id();
        match method {
            BuiltInMethod::TimePlay => {
                if self.time.play(id, cx.now()) {
                    let first = self.current_clip.first_frame;
                    self.show_frame(first, cx);
                    cx.log(format!("actor.{id}.time_play"));
                }
            }
            BuiltInMethod::TimeStop => {
                if self.time.stop(id) {
                    cx.log(format!("actor.{id}.time_stop"));
                }
            }
            BuiltInMethod::MovieReset => {
                self.time.reset();
                let first = self.current_clip.first_frame;
                self.show_frame(first, cx);
            }
            BuiltInMethod::SetCurrentClip => {
                let clip = int_arg(args, 0, method)?;
                self.set_clip(clip, cx);
            }
            BuiltInMethod::IncrementFrame => self.step_frame(true, cx),
            BuiltInMethod::DecrementFrame => self.step_frame(false, cx),
            BuiltInMethod::GetCurrentClipId => {
                return Ok(ScriptValue::Int(self.current_clip.id as i64))
            }
            BuiltInMethod::IsPlaying => return Ok(ScriptValue::Bool(self.time.is_active())),
            _ => {
                return self
                    .spatial
                    .handle(id, method, args, cx)
                    .unwrap_or_else(|| Err(unsupported(ActorKind::Sprite, id, method)))
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
        let mut snapshot = ActorSnapshot::new(&self.header, ActorKind::Sprite, self.time.is_active())
            .with_spatial(&self.spatial);
        snapshot.clip = Some(self.current_clip.id);
        snapshot.frame = Some(self.current_frame);
        snapshot
    }
}
