use log::warn;
use serde::Deserialize;

use super::{float_arg, int_arg, point_arg, ActorCx};
use crate::script::{BuiltInMethod, ScriptResult, ScriptValue};
use crate::types::{Point, Rect};

/// Placement and visibility of an on-screen actor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpatialState {
    bounds: Rect,
    z_index: i32,
    visible: bool,
    dissolve_factor: f64,
}

impl Default for SpatialState {
    fn default() -> Self {
        Self {
            bounds: Rect::default(),
            z_index: 0,
            visible: false,
            dissolve_factor: 1.0,
        }
    }
}

impl SpatialState {
    pub fn new(bounds: Rect, z_index: i32, visible: bool) -> Self {
        Self {
            bounds,
            z_index,
            visible,
            dissolve_factor: 1.0,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn dissolve_factor(&self) -> f64 {
        self.dissolve_factor
    }

    /// Marks the current bounds for redraw if the actor is on screen.
    pub fn invalidate(&self, cx: &mut ActorCx<'_>) {
        if self.visible {
            cx.invalidate(self.bounds);
        }
    }

    pub fn show(&mut self, actor_id: u32, cx: &mut ActorCx<'_>) {
        if self.visible {
            warn!("actor {actor_id}: show requested while already visible");
            return;
        }
        self.visible = true;
        cx.invalidate(self.bounds);
        cx.log(format!("actor.{actor_id}.show"));
    }

    pub fn hide(&mut self, actor_id: u32, cx: &mut ActorCx<'_>) {
        if !self.visible {
            warn!("actor {actor_id}: hide requested while already hidden");
            return;
        }
        cx.invalidate(self.bounds);
        self.visible = false;
        cx.log(format!("actor.{actor_id}.hide"));
    }

    pub fn move_to(&mut self, actor_id: u32, origin: Point, cx: &mut ActorCx<'_>) {
        if origin == self.bounds.origin() {
            return;
        }
        self.invalidate(cx);
        self.bounds = self.bounds.with_origin(origin);
        self.invalidate(cx);
        cx.log(format!("actor.{actor_id}.move_to {} {}", origin.x, origin.y));
    }

    /// Runs one of the spatial methods shared by visible actors. `None` means
    /// `method` is not spatial and the caller should keep looking.
    pub fn handle(
        &mut self,
        actor_id: u32,
        method: BuiltInMethod,
        args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> Option<ScriptResult<ScriptValue>> {
        let result = match method {
            BuiltInMethod::SpatialShow => {
                self.show(actor_id, cx);
                Ok(ScriptValue::Empty)
            }
            BuiltInMethod::SpatialHide => {
                self.hide(actor_id, cx);
                Ok(ScriptValue::Empty)
            }
            BuiltInMethod::SpatialMoveTo => point_arg(args, method).map(|origin| {
                self.move_to(actor_id, origin, cx);
                ScriptValue::Empty
            }),
            BuiltInMethod::SpatialMoveToByOffset => point_arg(args, method).map(|offset| {
                let origin = self.bounds.origin();
                self.move_to(actor_id, Point::new(origin.x + offset.x, origin.y + offset.y), cx);
                ScriptValue::Empty
            }),
            BuiltInMethod::SpatialCenterMoveTo => point_arg(args, method).map(|center| {
                let origin = Point::new(
                    center.x - self.bounds.width / 2,
                    center.y - self.bounds.height / 2,
                );
                self.move_to(actor_id, origin, cx);
                ScriptValue::Empty
            }),
            BuiltInMethod::SpatialZMoveTo => int_arg(args, 0, method).map(|z| {
                self.z_index = z as i32;
                self.invalidate(cx);
                cx.log(format!("actor.{actor_id}.z_move_to {z}"));
                ScriptValue::Empty
            }),
            BuiltInMethod::SetDissolveFactor => float_arg(args, 0, method).map(|factor| {
                self.dissolve_factor = factor.clamp(0.0, 1.0);
                self.invalidate(cx);
                ScriptValue::Empty
            }),
            BuiltInMethod::GetLeftX => Ok(ScriptValue::Int(self.bounds.left as i64)),
            BuiltInMethod::GetTopY => Ok(ScriptValue::Int(self.bounds.top as i64)),
            BuiltInMethod::GetWidth => Ok(ScriptValue::Int(self.bounds.width as i64)),
            BuiltInMethod::GetHeight => Ok(ScriptValue::Int(self.bounds.height as i64)),
            BuiltInMethod::IsVisible => Ok(ScriptValue::Bool(self.visible)),
            _ => return None,
        };
        Some(result)
    }
}
