use log::warn;

use super::{int_arg, millis_arg, point_arg, unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, TimeState};
use crate::script::{BuiltInMethod, EventType, ScriptResult, ScriptValue};
use crate::types::{Point, Rect};

#[derive(Debug, Clone, Copy)]
enum PanProgress {
    Duration { duration_ms: u64 },
    Steps { steps: u64, interval_ms: u64 },
}

#[derive(Debug, Clone, Copy)]
struct Pan {
    from: Point,
    to: Point,
    progress: PanProgress,
}

impl Pan {
    fn percent_complete(&self, elapsed: u64) -> f64 {
        match self.progress {
            PanProgress::Duration { duration_ms } => {
                if duration_ms == 0 {
                    1.0
                } else {
                    (elapsed as f64 / duration_ms as f64).min(1.0)
                }
            }
            PanProgress::Steps { steps, interval_ms } => {
                if steps == 0 {
                    return 1.0;
                }
                let taken = (elapsed / interval_ms.max(1)).min(steps);
                taken as f64 / steps as f64
            }
        }
    }
}

/// Viewport onto a stage. Pans move the viewport origin over time.
#[derive(Debug)]
pub struct CameraActor {
    header: ActorHeader,
    stage_id: u32,
    viewport: Rect,
    time: TimeState,
    pan: Option<Pan>,
}

impl CameraActor {
    pub fn new(id: u32, context_id: u32, stage_id: u32, viewport: Rect) -> Self {
        Self {
            header: ActorHeader::new(id, context_id),
            stage_id,
            viewport,
            time: TimeState::default(),
            pan: None,
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    fn set_origin(&mut self, origin: Point, cx: &mut ActorCx<'_>) -> bool {
        if origin == self.viewport.origin() {
            return false;
        }
        cx.invalidate(self.viewport);
        self.viewport = self.viewport.with_origin(origin);
        cx.invalidate(self.viewport);
        true
    }

    fn start_pan(&mut self, to: Point, progress: PanProgress, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        let destination = self.viewport.with_origin(to);
        let extent = cx.actor(self.stage_id).and_then(|stage| stage.bounds());
        match extent {
            Some(extent) if extent.contains_rect(&destination) => {}
            _ => {
                warn!(
                    "camera {id}: pan to ({}, {}) leaves stage {}; aborted",
                    to.x, to.y, self.stage_id
                );
                cx.fire_event(self.header.handlers(), EventType::CameraPanAbort, None);
                return;
            }
        }
        self.pan = Some(Pan {
            from: self.viewport.origin(),
            to,
            progress,
        });
        self.time.restart(cx.now());
        cx.log(format!("actor.{id}.pan_to {} {}", to.x, to.y));
    }
}

impl Actor for CameraActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Camera
    }

    fn is_active(&self) -> bool {
        self.time.is_active()
    }

    fn process(&mut self, cx: &mut ActorCx<'_>) {
        let Some(pan) = self.pan else {
            return;
        };
        let elapsed = self.time.advance(self.header.handlers(), cx);
        let percent = pan.percent_complete(elapsed);
        if self.set_origin(pan.from.lerp(pan.to, percent), cx) {
            cx.fire_event(self.header.handlers(), EventType::CameraPanStep, None);
        }
        if percent >= 1.0 {
            self.pan = None;
            self.time.reset();
            cx.log(format!("actor.{}.pan_end", self.header.id()));
            cx.fire_event(self.header.handlers(), EventType::CameraPanEnd, None);
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
            BuiltInMethod::ViewportMoveTo => {
                let origin = point_arg(args, method)?;
                if self.set_origin(origin, cx) {
                    cx.log(format!("actor.{id}.viewport_move_to {} {}", origin.x, origin.y));
                }
            }
            BuiltInMethod::PanTo => {
                let to = point_arg(args, method)?;
                let duration_ms = millis_arg(args, 2, method)?;
                self.start_pan(to, PanProgress::Duration { duration_ms }, cx);
            }
            BuiltInMethod::PanToBySteps => {
                let to = point_arg(args, method)?;
                let steps = int_arg(args, 2, method)?.max(0) as u64;
                let interval_ms = millis_arg(args, 3, method)?;
                self.start_pan(to, PanProgress::Steps { steps, interval_ms }, cx);
            }
            BuiltInMethod::StopPan => {
                if self.pan.take().is_some() {
                    self.time.reset();
                    cx.log(format!("actor.{id}.stop_pan"));
                } else {
                    warn!("camera {id}: stop requested while not panning");
                }
            }
            BuiltInMethod::IsPanning => return Ok(ScriptValue::Bool(self.is_panning())),
            BuiltInMethod::GetViewportLeftX => {
                return Ok(ScriptValue::Int(self.viewport.left as i64))
            }
            BuiltInMethod::GetViewportTopY => return Ok(ScriptValue::Int(self.viewport.top as i64)),
            _ => return Err(unsupported(ActorKind::Camera, id, method)),
        }
        Ok(ScriptValue::Empty)
    }

    fn bounds(&self) -> Option<Rect> {
        Some(self.viewport)
    }

    fn snapshot(&self) -> ActorSnapshot {
        let mut snapshot = ActorSnapshot::new(&self.header, ActorKind::Camera, self.is_panning());
        snapshot.bounds = Some(self.viewport);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::tests::with_cx;
    use crate::actors::{ActorRegistry, SpatialState, StageActor};
    use crate::script::{EventHandler, ScriptBuilder};

    fn setup() -> (ActorRegistry, CameraActor) {
        let mut registry = ActorRegistry::new();
        registry
            .register(Box::new(StageActor::new(
                50,
                1,
                SpatialState::new(Rect::new(0, 0, 400, 200), 0, true),
            )))
            .unwrap();
        let mut camera = CameraActor::new(51, 1, 50, Rect::new(0, 0, 100, 100));
        for event in [EventType::CameraPanStep, EventType::CameraPanEnd, EventType::CameraPanAbort] {
            camera
                .header_mut()
                .add_handler(EventHandler::new(event, None, ScriptBuilder::new().build()))
                .unwrap();
        }
        (registry, camera)
    }

    #[test]
    fn timed_pan_interpolates_and_ends() {
        let (registry, mut camera) = setup();
        let args = [ScriptValue::Int(200), ScriptValue::Int(0), ScriptValue::Time(1.0)];
        with_cx(0, &registry, |cx| camera.call_method(BuiltInMethod::PanTo, &args, cx).unwrap());
        assert!(camera.is_panning());

        let (_, _, dirty, fired) = with_cx(500, &registry, |cx| camera.process(cx));
        assert_eq!(camera.viewport().left, 100);
        assert_eq!(dirty.len(), 2);
        assert_eq!(fired[0].event(), EventType::CameraPanStep);

        let (_, _, _, fired) = with_cx(1000, &registry, |cx| camera.process(cx));
        let events: Vec<EventType> = fired.iter().map(|handler| handler.event()).collect();
        assert_eq!(events, vec![EventType::CameraPanStep, EventType::CameraPanEnd]);
        assert!(!camera.is_panning());
        assert_eq!(camera.viewport().left, 200);
    }

    #[test]
    fn stepped_pan_moves_in_whole_steps() {
        let (registry, mut camera) = setup();
        let args = [
            ScriptValue::Int(100),
            ScriptValue::Int(100),
            ScriptValue::Int(4),
            ScriptValue::Time(0.1),
        ];
        with_cx(0, &registry, |cx| {
            camera.call_method(BuiltInMethod::PanToBySteps, &args, cx).unwrap()
        });
        with_cx(250, &registry, |cx| camera.process(cx));
        assert_eq!(camera.viewport().origin(), Point::new(50, 50));
    }

    #[test]
    fn pan_outside_stage_aborts() {
        let (registry, mut camera) = setup();
        let args = [ScriptValue::Int(350), ScriptValue::Int(0), ScriptValue::Time(1.0)];
        let (_, _, _, fired) = with_cx(0, &registry, |cx| {
            camera.call_method(BuiltInMethod::PanTo, &args, cx).unwrap()
        });
        assert!(!camera.is_panning());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].event(), EventType::CameraPanAbort);
    }
}
