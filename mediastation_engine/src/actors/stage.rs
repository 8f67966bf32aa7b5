use log::warn;

use super::{unsupported, Actor, ActorCx, ActorHeader, ActorKind, ActorSnapshot, SpatialState};
use crate::script::{required_arg, BuiltInMethod, ScriptResult, ScriptValue};
use crate::types::Rect;

/// Scrollable container. Its bounds are the extent cameras may pan over;
/// children are kept in insertion order.
#[derive(Debug)]
pub struct StageActor {
    header: ActorHeader,
    spatial: SpatialState,
    children: Vec<u32>,
}

impl StageActor {
    pub fn new(id: u32, context_id: u32, spatial: SpatialState) -> Self {
        Self {
            header: ActorHeader::new(id, context_id),
            spatial,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[u32] {
        &self.children
    }

    fn add_child(&mut self, child: u32, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        if cx.actor(child).is_none() {
            warn!("stage {id}: cannot add unknown actor {child}");
        } else if self.children.contains(&child) {
            warn!("stage {id}: actor {child} already on stage");
        } else {
            self.children.push(child);
            self.spatial.invalidate(cx);
            cx.log(format!("actor.{id}.add_actor {child}"));
        }
    }

    fn remove_child(&mut self, child: u32, cx: &mut ActorCx<'_>) {
        let id = self.header.id();
        let before = self.children.len();
        self.children.retain(|other| *other != child);
        if self.children.len() == before {
            warn!("stage {id}: actor {child} is not on stage");
            return;
        }
        self.spatial.invalidate(cx);
        cx.log(format!("actor.{id}.remove_actor {child}"));
    }
}

impl Actor for StageActor {
    fn header(&self) -> &ActorHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ActorHeader {
        &mut self.header
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Stage
    }

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue> {
        let id = self.header.id();
        match method {
            BuiltInMethod::AddActorToStage => {
                let child = required_arg(args, 0, method.as_str())?.as_asset_id()?;
                self.add_child(child, cx);
                Ok(ScriptValue::Empty)
            }
            BuiltInMethod::RemoveActorFromStage => {
                let child = required_arg(args, 0, method.as_str())?.as_asset_id()?;
                self.remove_child(child, cx);
                Ok(ScriptValue::Empty)
            }
            _ => self
                .spatial
                .handle(id, method, args, cx)
                .unwrap_or_else(|| Err(unsupported(ActorKind::Stage, id, method))),
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

    fn forget_actor(&mut self, id: u32) {
        self.children.retain(|child| *child != id);
    }

    fn snapshot(&self) -> ActorSnapshot {
        let mut snapshot = ActorSnapshot::new(&self.header, ActorKind::Stage, self.spatial.is_visible())
            .with_spatial(&self.spatial);
        snapshot.children = self.children.clone();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::tests::with_cx;
    use crate::actors::{ActorRegistry, ImageActor};

    #[test]
    fn children_must_exist_and_be_unique() {
        let mut registry = ActorRegistry::new();
        registry
            .register(Box::new(ImageActor::new(61, 1, SpatialState::default())))
            .unwrap();
        let mut stage = StageActor::new(60, 1, SpatialState::default());
        with_cx(0, &registry, |cx| {
            for child in [61, 61, 99] {
                stage
                    .call_method(BuiltInMethod::AddActorToStage, &[ScriptValue::AssetId(child)], cx)
                    .unwrap();
            }
        });
        assert_eq!(stage.children(), &[61]);

        with_cx(0, &registry, |cx| {
            stage
                .call_method(BuiltInMethod::RemoveActorFromStage, &[ScriptValue::AssetId(61)], cx)
                .unwrap()
        });
        assert!(stage.children().is_empty());
    }

    #[test]
    fn forgotten_actors_leave_the_stage() {
        let mut registry = ActorRegistry::new();
        for child in [61, 62] {
            registry
                .register(Box::new(ImageActor::new(child, 1, SpatialState::default())))
                .unwrap();
        }
        let mut stage = StageActor::new(60, 1, SpatialState::default());
        with_cx(0, &registry, |cx| {
            for child in [61, 62] {
                stage
                    .call_method(BuiltInMethod::AddActorToStage, &[ScriptValue::AssetId(child)], cx)
                    .unwrap();
            }
        });
        stage.forget_actor(61);
        assert_eq!(stage.children(), &[62]);
        assert_eq!(stage.snapshot().children, vec![62]);
    }
}
