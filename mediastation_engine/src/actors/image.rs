use super::{unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, SpatialState};
use crate::script::{BuiltInMethod, ScriptResult, ScriptValue};
use crate::types::Rect;

/// Static bitmap. Only the spatial methods apply.
#[derive(Debug)]
pub struct ImageActor {
    header: ActorHeader,
    spatial: SpatialState,
}

impl ImageActor {
    pub fn new(id: u32, context_id: u32, spatial: SpatialState) -> Self {
        Self {
            header: ActorHeader::new(id, context_id),
            spatial,
        }
    }
}

impl Actor for ImageActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Image
    }

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue> {
        let id = self.header.id();
        self.spatial
            .handle(id, method, args, cx)
            .unwrap_or_else(|| Err(unsupported(ActorKind::Image, id, method)))
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
        ActorSnapshot::new(&self.header, ActorKind::Image, self.spatial.is_visible())
            .with_spatial(&self.spatial)
    }
}
