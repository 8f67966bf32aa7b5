use std::rc::Rc;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::actors::{Actor, ActorCx, ActorRegistry, ActorSnapshot};
use crate::audio_bridge::AudioCallback;
use crate::clock::Clock;
use crate::script::{
    EventHandler, EventType, FunctionManager, GlobalTable, ScriptError, ScriptResult, ScriptValue,
};
use crate::types::Rect;

mod dispatch;
mod document;
mod input;

pub use document::DocumentState;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Knobs the host sets before loading a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeConfig {
    /// Seed for `Random`, `GetUniqueRandom` and collection jumbles.
    pub seed: u64,
    /// Nesting limit for script invocations (functions and handlers).
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// The running title: variables, functions, actors and the output sinks
/// everything reports to. Passed explicitly to the interpreter and to
/// every dispatch path.
pub struct EngineContext {
    config: RuntimeConfig,
    clock: Rc<dyn Clock>,
    started_at: u64,
    globals: GlobalTable,
    functions: FunctionManager,
    actors: ActorRegistry,
    document: DocumentState,
    audio: Option<Rc<dyn AudioCallback>>,
    events: Vec<String>,
    dirty: Vec<Rect>,
    rng: StdRng,
    hovered: Option<u32>,
    call_depth: usize,
}

impl EngineContext {
    pub fn new(clock: Rc<dyn Clock>, config: RuntimeConfig) -> Self {
        let started_at = clock.now_ms();
        Self {
            config,
            clock,
            started_at,
            globals: GlobalTable::new(),
            functions: FunctionManager::new(),
            actors: ActorRegistry::new(),
            document: DocumentState::default(),
            audio: None,
            events: Vec::new(),
            dirty: Vec::new(),
            rng: StdRng::seed_from_u64(config.seed),
            hovered: None,
            call_depth: 0,
        }
    }

    pub fn set_audio_callback(&mut self, audio: Option<Rc<dyn AudioCallback>>) {
        self.audio = audio;
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Milliseconds since the context was created.
    pub fn run_time_ms(&self) -> u64 {
        self.now().saturating_sub(self.started_at)
    }

    pub fn time_of_day_secs(&self) -> f64 {
        self.clock.time_of_day_secs()
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn globals(&self) -> &GlobalTable {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut GlobalTable {
        &mut self.globals
    }

    pub fn functions(&self) -> &FunctionManager {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionManager {
        &mut self.functions
    }

    pub fn actors(&self) -> &ActorRegistry {
        &self.actors
    }

    pub fn actor(&self, id: u32) -> Option<&dyn Actor> {
        self.actors.get(id)
    }

    pub fn snapshot(&self, id: u32) -> Option<ActorSnapshot> {
        self.actors.get(id).map(|actor| actor.snapshot())
    }

    pub fn snapshots(&self) -> Vec<ActorSnapshot> {
        self.actors.snapshots()
    }

    pub fn register_actor(&mut self, actor: Box<dyn Actor>) -> ScriptResult<()> {
        debug!("registering {} {}", actor.kind(), actor.id());
        self.actors.register(actor)
    }

    /// Drops an actor, letting it release external resources first.
    pub fn destroy_actor(&mut self, id: u32) -> ScriptResult<()> {
        let mut actor = self.actors.remove(id).ok_or(ScriptError::UnknownActor(id))?;
        let now = self.now();
        let mut ignored = Vec::new();
        {
            let mut cx = ActorCx::new(
                now,
                &self.actors,
                &mut self.events,
                &mut self.dirty,
                &mut ignored,
                self.audio.as_deref(),
            );
            actor.release(&mut cx);
        }
        if actor.is_visible() {
            if let Some(bounds) = actor.bounds() {
                self.dirty.push(bounds);
            }
        }
        for other in self.actors.iter_mut() {
            other.forget_actor(id);
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        self.document.forget_screen(id);
        self.log_event(format!("actor.{id}.destroy"));
        Ok(())
    }

    pub fn log_event(&mut self, message: String) {
        self.events.push(message);
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }

    pub fn dirty_rects(&self) -> &[Rect] {
        &self.dirty
    }

    pub fn take_dirty_rects(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn enter_call(&mut self) -> ScriptResult<()> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(ScriptError::CallDepthExceeded(self.config.max_call_depth));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    pub fn call_function(&mut self, id: u32, args: &[ScriptValue]) -> ScriptResult<ScriptValue> {
        FunctionManager::call(self, id, args)
    }

    /// Runs the handler `actor_id` selects for `event`, if any. Returns
    /// whether one ran.
    pub fn dispatch_event(
        &mut self,
        actor_id: u32,
        event: EventType,
        value: Option<&ScriptValue>,
    ) -> ScriptResult<bool> {
        let handler = self
            .actors
            .get(actor_id)
            .and_then(|actor| actor.handlers().find(event, value));
        match handler {
            Some(handler) => {
                handler.execute(self, actor_id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Takes actor `id` out of the registry, runs `f` on it and puts it back,
    /// then runs whatever handlers it queued.
    pub(crate) fn with_actor<T>(
        &mut self,
        id: u32,
        f: impl FnOnce(&mut dyn Actor, &mut ActorCx<'_>) -> T,
    ) -> ScriptResult<T> {
        let mut actor = self.actors.take(id).ok_or(ScriptError::UnknownActor(id))?;
        let now = self.now();
        let mut fired = Vec::new();
        let result = {
            let mut cx = ActorCx::new(
                now,
                &self.actors,
                &mut self.events,
                &mut self.dirty,
                &mut fired,
                self.audio.as_deref(),
            );
            f(actor.as_mut(), &mut cx)
        };
        self.actors.restore(actor);
        self.run_fired(id, fired)?;
        Ok(result)
    }

    fn run_fired(&mut self, actor_id: u32, fired: Vec<Rc<EventHandler>>) -> ScriptResult<()> {
        for handler in fired {
            if !self.actors.contains(actor_id) {
                debug!("actor {actor_id} destroyed by its own handler; dropping the rest");
                break;
            }
            handler.execute(self, actor_id)?;
        }
        Ok(())
    }

    /// One scheduler tick: every active actor in registration order, then
    /// any screen branch requested during the tick.
    pub fn process_tick(&mut self) -> ScriptResult<()> {
        let order = self.actors.order().to_vec();
        for id in order {
            let active = self.actors.get(id).is_some_and(|actor| actor.is_active());
            if active {
                self.with_actor(id, |actor, cx| actor.process(cx))?;
            }
        }
        self.apply_pending_branch()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::actors::{ImageActor, SpatialState, StageActor, TimerActor};
    use crate::clock::ManualClock;
    use crate::script::{BuiltInMethod, ScriptBuilder, VariableScope};

    pub(crate) fn test_context() -> (EngineContext, ManualClock) {
        let clock = ManualClock::new();
        let ctx = EngineContext::new(Rc::new(clock.clone()), RuntimeConfig::default());
        (ctx, clock)
    }

    #[test]
    fn recursion_is_bounded() {
        let clock = ManualClock::new();
        let config = RuntimeConfig {
            seed: 1,
            max_call_depth: 8,
        };
        let mut ctx = EngineContext::new(Rc::new(clock), config);
        let mut code = ScriptBuilder::new();
        code.call_function(900, |_| {});
        ctx.functions_mut().register(1, 900, code.build()).unwrap();
        let err = ctx.call_function(900, &[]).unwrap_err();
        assert!(matches!(err, ScriptError::CallDepthExceeded(8)));

        // The depth counter unwinds even on failure.
        let mut ok = ScriptBuilder::new();
        ok.return_value(|value| value.int(1));
        ctx.functions_mut().register(1, 901, ok.build()).unwrap();
        assert!(ctx.call_function(901, &[]).is_ok());
    }

    #[test]
    fn handlers_see_restored_actor_state() {
        let (mut ctx, clock) = test_context();
        ctx.globals_mut().declare(1, ScriptValue::Empty).unwrap();

        let mut timer = TimerActor::new(5, 2);
        let mut code = ScriptBuilder::new();
        code.assign(1, VariableScope::Global, |value| {
            value.call_method(BuiltInMethod::IsPlaying.raw(), |target| target.asset(5), |_| {})
        });
        timer
            .header_mut()
            .add_handler(EventHandler::new(
                EventType::Timer,
                Some(ScriptValue::Float(0.1)),
                code.build(),
            ))
            .unwrap();
        ctx.register_actor(Box::new(timer)).unwrap();
        ctx.call_method(&ScriptValue::AssetId(5), BuiltInMethod::TimePlay.raw(), &[])
            .unwrap();

        clock.advance(200);
        ctx.process_tick().unwrap();
        assert!(ctx.globals().value(1).unwrap().as_bool().unwrap());
    }

    #[test]
    fn destroying_a_visible_actor_dirties_its_bounds() {
        let (mut ctx, _clock) = test_context();
        let spatial = SpatialState::new(Rect::new(1, 2, 3, 4), 0, true);
        ctx.register_actor(Box::new(ImageActor::new(9, 3, spatial)))
            .unwrap();
        ctx.destroy_actor(9).unwrap();
        assert_eq!(ctx.take_dirty_rects(), vec![Rect::new(1, 2, 3, 4)]);
        assert!(ctx.actor(9).is_none());
        assert!(matches!(
            ctx.destroy_actor(9),
            Err(ScriptError::UnknownActor(9))
        ));
    }

    #[test]
    fn destroying_an_actor_removes_it_from_stages() {
        let (mut ctx, _clock) = test_context();
        ctx.register_actor(Box::new(StageActor::new(50, 3, SpatialState::default())))
            .unwrap();
        ctx.register_actor(Box::new(ImageActor::new(7, 3, SpatialState::default())))
            .unwrap();
        ctx.call_method(
            &ScriptValue::AssetId(50),
            BuiltInMethod::AddActorToStage.raw(),
            &[ScriptValue::AssetId(7)],
        )
        .unwrap();
        assert_eq!(ctx.snapshot(50).unwrap().children, vec![7]);

        ctx.destroy_actor(7).unwrap();
        assert!(ctx.snapshot(50).unwrap().children.is_empty());
    }
}
