//! Stateful title entities and the per-tick context they run in.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::audio_bridge::AudioCallback;
use crate::script::{
    required_arg, BuiltInMethod, EventHandler, EventHandlerTable, EventType, ScriptError,
    ScriptResult, ScriptValue,
};
use crate::types::{Point, Rect};

pub mod camera;
pub mod hotspot;
pub mod image;
pub mod movie;
pub mod path;
pub mod screen;
pub mod sound;
pub mod spatial;
pub mod sprite;
pub mod stage;
pub mod time;
pub mod timer;

pub use camera::CameraActor;
pub use hotspot::HotspotActor;
pub use image::ImageActor;
pub use movie::{MovieActor, MovieFrame};
pub use path::PathActor;
pub use screen::ScreenActor;
pub use sound::SoundActor;
pub use spatial::SpatialState;
pub use sprite::{SpriteActor, SpriteClip};
pub use stage::StageActor;
pub use time::TimeState;
pub use timer::TimerActor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Image,
    Timer,
    Movie,
    Sprite,
    Path,
    Camera,
    Stage,
    Hotspot,
    Sound,
    Screen,
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActorKind::Image => "image",
            ActorKind::Timer => "timer",
            ActorKind::Movie => "movie",
            ActorKind::Sprite => "sprite",
            ActorKind::Path => "path",
            ActorKind::Camera => "camera",
            ActorKind::Stage => "stage",
            ActorKind::Hotspot => "hotspot",
            ActorKind::Sound => "sound",
            ActorKind::Screen => "screen",
        };
        f.write_str(label)
    }
}

/// Identity and handlers shared by every actor kind.
#[derive(Debug)]
pub struct ActorHeader {
    id: u32,
    context_id: u32,
    handlers: EventHandlerTable,
}

impl ActorHeader {
    pub fn new(id: u32, context_id: u32) -> Self {
        Self {
            id,
            context_id,
            handlers: EventHandlerTable::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    pub fn handlers(&self) -> &EventHandlerTable {
        &self.handlers
    }

    pub fn add_handler(&mut self, handler: EventHandler) -> ScriptResult<()> {
        self.handlers.add(self.id, handler)
    }
}

/// Serializable view of an actor for state dumps and tests.
#[derive(Debug, Clone, Serialize)]
pub struct ActorSnapshot {
    pub id: u32,
    pub context_id: u32,
    pub kind: ActorKind,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouse_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames_on_screen: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<u32>,
}

impl ActorSnapshot {
    pub fn new(header: &ActorHeader, kind: ActorKind, active: bool) -> Self {
        Self {
            id: header.id,
            context_id: header.context_id,
            kind,
            active,
            visible: None,
            bounds: None,
            z_index: None,
            mouse_active: None,
            clip: None,
            frame: None,
            frames_on_screen: Vec::new(),
            percent_complete: None,
            position: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn with_spatial(mut self, spatial: &SpatialState) -> Self {
        self.visible = Some(spatial.is_visible());
        self.bounds = Some(spatial.bounds());
        self.z_index = Some(spatial.z_index());
        self
    }
}

/// Everything an actor may touch while it runs: the clock reading for this
/// tick, a read-only view of its peers and the runtime's output sinks.
/// Handlers an actor fires are queued here and run once it is back in the
/// registry.
pub struct ActorCx<'a> {
    now: u64,
    actors: &'a ActorRegistry,
    events: &'a mut Vec<String>,
    dirty: &'a mut Vec<Rect>,
    fired: &'a mut Vec<Rc<EventHandler>>,
    audio: Option<&'a dyn AudioCallback>,
}

impl<'a> ActorCx<'a> {
    pub(crate) fn new(
        now: u64,
        actors: &'a ActorRegistry,
        events: &'a mut Vec<String>,
        dirty: &'a mut Vec<Rect>,
        fired: &'a mut Vec<Rc<EventHandler>>,
        audio: Option<&'a dyn AudioCallback>,
    ) -> Self {
        Self {
            now,
            actors,
            events,
            dirty,
            fired,
            audio,
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn log(&mut self, message: String) {
        self.events.push(message);
    }

    pub fn invalidate(&mut self, rect: Rect) {
        self.dirty.push(rect);
    }

    pub fn actor(&self, id: u32) -> Option<&dyn Actor> {
        self.actors.get(id)
    }

    pub fn audio(&self) -> Option<&dyn AudioCallback> {
        self.audio
    }

    pub fn fire(&mut self, handler: Rc<EventHandler>) {
        self.fired.push(handler);
    }

    /// Queues the handler `handlers` selects for `event`; false if none does.
    pub fn fire_event(
        &mut self,
        handlers: &EventHandlerTable,
        event: EventType,
        value: Option<&ScriptValue>,
    ) -> bool {
        match handlers.find(event, value) {
            Some(handler) => {
                self.fired.push(handler);
                true
            }
            None => false,
        }
    }
}

pub trait Actor: fmt::Debug {
    fn header(&self) -> &ActorHeader;
    fn header_mut(&mut self) -> &mut ActorHeader;
    fn kind(&self) -> ActorKind;

    fn id(&self) -> u32 {
        self.header().id()
    }

    fn context_id(&self) -> u32 {
        self.header().context_id()
    }

    fn handlers(&self) -> &EventHandlerTable {
        self.header().handlers()
    }

    /// Whether `process` has work to do this tick.
    fn is_active(&self) -> bool {
        false
    }

    fn process(&mut self, _cx: &mut ActorCx<'_>) {}

    fn call_method(
        &mut self,
        method: BuiltInMethod,
        args: &[ScriptValue],
        cx: &mut ActorCx<'_>,
    ) -> ScriptResult<ScriptValue>;

    fn bounds(&self) -> Option<Rect> {
        None
    }

    fn z_index(&self) -> i32 {
        0
    }

    fn is_visible(&self) -> bool {
        false
    }

    /// Whether the actor currently takes part in mouse hit testing.
    fn accepts_mouse(&self) -> bool {
        false
    }

    /// Called once before the actor is dropped from the registry.
    fn release(&mut self, _cx: &mut ActorCx<'_>) {}

    /// Called on every remaining actor after `id` has been destroyed.
    fn forget_actor(&mut self, _id: u32) {}

    fn snapshot(&self) -> ActorSnapshot;
}

pub(crate) fn unsupported(kind: ActorKind, id: u32, method: BuiltInMethod) -> ScriptError {
    ScriptError::UnsupportedMethod {
        target: format!("{kind} {id}"),
        method,
    }
}

pub(crate) fn int_arg(args: &[ScriptValue], index: usize, method: BuiltInMethod) -> ScriptResult<i64> {
    required_arg(args, index, method.as_str())?.as_int()
}

pub(crate) fn float_arg(args: &[ScriptValue], index: usize, method: BuiltInMethod) -> ScriptResult<f64> {
    required_arg(args, index, method.as_str())?.as_float()
}

pub(crate) fn point_arg(args: &[ScriptValue], method: BuiltInMethod) -> ScriptResult<Point> {
    let x = int_arg(args, 0, method)?;
    let y = int_arg(args, 1, method)?;
    Ok(Point::new(x as i32, y as i32))
}

/// Seconds argument converted to whole milliseconds.
pub(crate) fn millis_arg(args: &[ScriptValue], index: usize, method: BuiltInMethod) -> ScriptResult<u64> {
    let seconds = float_arg(args, index, method)?;
    Ok((seconds * 1000.0).max(0.0) as u64)
}

/// Id-indexed actor storage that remembers registration order.
///
/// An actor can be taken out while it runs; its slot in the order list is
/// kept so it is restored in place.
#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: BTreeMap<u32, Box<dyn Actor>>,
    order: Vec<u32>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn register(&mut self, actor: Box<dyn Actor>) -> ScriptResult<()> {
        let id = actor.id();
        if self.order.contains(&id) {
            return Err(ScriptError::DuplicateActor(id));
        }
        self.order.push(id);
        self.actors.insert(id, actor);
        Ok(())
    }

    pub fn contains(&self, id: u32) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn get(&self, id: u32) -> Option<&dyn Actor> {
        self.actors.get(&id).map(|actor| actor.as_ref())
    }

    /// Ids in registration order.
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Actor> + '_ {
        self.order.iter().filter_map(move |id| self.get(*id))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Actor>> + '_ {
        self.actors.values_mut()
    }

    pub fn ids_in_context(&self, context_id: u32) -> Vec<u32> {
        self.iter()
            .filter(|actor| actor.context_id() == context_id)
            .map(|actor| actor.id())
            .collect()
    }

    pub(crate) fn take(&mut self, id: u32) -> Option<Box<dyn Actor>> {
        self.actors.remove(&id)
    }

    pub(crate) fn restore(&mut self, actor: Box<dyn Actor>) {
        self.actors.insert(actor.id(), actor);
    }

    /// Forgets an actor entirely; returns it if it was present.
    pub(crate) fn remove(&mut self, id: u32) -> Option<Box<dyn Actor>> {
        self.order.retain(|other| *other != id);
        self.actors.remove(&id)
    }

    pub fn snapshots(&self) -> Vec<ActorSnapshot> {
        self.iter().map(|actor| actor.snapshot()).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Runs `f` with a context backed by throwaway sinks.
    pub(crate) fn with_cx<T>(
        now: u64,
        registry: &ActorRegistry,
        f: impl FnOnce(&mut ActorCx<'_>) -> T,
    ) -> (T, Vec<String>, Vec<Rect>, Vec<Rc<EventHandler>>) {
        let mut events = Vec::new();
        let mut dirty = Vec::new();
        let mut fired = Vec::new();
        let result = {
            let mut cx = ActorCx::new(now, registry, &mut events, &mut dirty, &mut fired, None);
            f(&mut cx)
        };
        (result, events, dirty, fired)
    }

    #[test]
    fn registry_keeps_order_across_take_and_restore() {
        let mut registry = ActorRegistry::new();
        registry
            .register(Box::new(ImageActor::new(7, 2, SpatialState::default())))
            .unwrap();
        registry
            .register(Box::new(TimerActor::new(3, 2)))
            .unwrap();
        assert!(matches!(
            registry.register(Box::new(TimerActor::new(3, 2))),
            Err(ScriptError::DuplicateActor(3))
        ));

        let taken = registry.take(7).unwrap();
        assert!(!registry.contains(7));
        registry.restore(taken);
        let ids: Vec<u32> = registry.iter().map(|actor| actor.id()).collect();
        assert_eq!(ids, vec![7, 3]);
        assert_eq!(registry.ids_in_context(2), vec![7, 3]);

        registry.remove(7);
        assert_eq!(registry.order(), &[3]);
    }
}
