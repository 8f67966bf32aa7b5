use super::{unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, SpatialState};
use crate::script::{BuiltInMethod, ScriptResult, ScriptValue};
use crate::types::Rect;

/// Clickable region. Receives mouse events while visible and mouse-active.
#[derive(Debug)]
pub struct HotspotActor {
    header: ActorHeader,
    spatial: SpatialState,
    mouse_active: bool,
}

impl HotspotActor {
    pub fn new(id: u32, context_id: u32, spatial: SpatialState, mouse_active: bool) -> Self {
        Self {
            header: ActorHeader::new(id, context_id),
            spatial,
            mouse_active,
        }
    }

    pub fn is_mouse_active(&self) -> bool {
        self.mouse_active
    }
}

impl Actor for HotspotActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Hotspot
    }

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue> {
        let id = self.header.id();
        match method {
            BuiltInMethod::MouseActivate | BuiltInMethod::MouseDeactivate => {
                self.mouse_active = method == BuiltInMethod::MouseActivate;
                cx.log(format!("actor.{id}.{method}"));
                Ok(ScriptValue::Empty)
            }
            _ => self
                .spatial
                .handle(id, method, args, cx)
                .unwrap_or_else(|| Err(unsupported(ActorKind::Hotspot, id, method))),
        }
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

    fn accepts_mouse(&self) -> bool {
        self.mouse_active && self.spatial.is_visible()
    }

    fn snapshot(&self) -> ActorSnapshot {
        let mut snapshot =
            ActorSnapshot::new(&self.header, ActorKind::Hotspot, self.spatial.is_visible())
                .with_spatial(&self.spatial);
        snapshot.mouse_active = Some(self.mouse_active);
        snapshot
    }
}
