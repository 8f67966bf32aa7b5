use std::rc::Rc;

use mediastation_engine::actors::{
    Actor, ActorHeader, ImageActor, PathActor, SpatialState, TimerActor,
};
use mediastation_engine::clock::ManualClock;
use mediastation_engine::scheduler::{InputQueue, TickScheduler};
use mediastation_engine::script::{
    BuiltInMethod, EventHandler, EventType, Opcode, ScriptBuilder, ScriptValue, VariableScope,
};
use mediastation_engine::types::{Point, Rect};
use mediastation_engine::{EngineContext, RuntimeConfig};

fn runtime() -> (EngineContext, ManualClock) {
    let clock = ManualClock::new();
    let ctx = EngineContext::new(Rc::new(clock.clone()), RuntimeConfig::default());
    (ctx, clock)
}

/// `global[id] = global[id] + 1`
fn increment(id: u16) -> ScriptBuilder {
    let mut code = ScriptBuilder::new();
    code.assign(id, VariableScope::Global, |value| {
        value.binary(Opcode::Add, |lhs| lhs.global(id), |rhs| rhs.int(1))
    });
    code
}

fn on(header: &mut ActorHeader, event: EventType, argument: Option<ScriptValue>, code: &ScriptBuilder) {
    header
        .add_handler(EventHandler::new(event, argument, code.build()))
        .unwrap();
}

fn global_int(ctx: &EngineContext, id: u32) -> i64 {
    ctx.globals().value(id).unwrap().as_int().unwrap()
}

fn call(ctx: &mut EngineContext, target: u32, method: BuiltInMethod, args: &[ScriptValue]) -> ScriptValue {
    ctx.call_method(&ScriptValue::AssetId(target), method.raw(), args)
        .unwrap()
}

#[test]
fn timer_fires_once_on_first_poll_past_threshold() {
    let (mut ctx, clock) = runtime();
    ctx.globals_mut().declare(1, ScriptValue::Int(0)).unwrap();
    let mut timer = TimerActor::new(5, 2);
    on(timer.header_mut(), EventType::Timer, Some(ScriptValue::Time(2.5)), &increment(1));
    ctx.register_actor(Box::new(timer)).unwrap();

    const START_MS: u64 = 1000;
    clock.set(START_MS);
    call(&mut ctx, 5, BuiltInMethod::TimePlay, &[]);
    let mut fired_at = Vec::new();
    for elapsed in [1000, 2400, 2600, 5000] {
        clock.set(START_MS + elapsed);
        let before = global_int(&ctx, 1);
        ctx.process_tick().unwrap();
        if global_int(&ctx, 1) > before {
            fired_at.push(elapsed);
        }
    }
    assert_eq!(fired_at, vec![2600]);

    // A fresh activation re-arms the handler relative to the new start.
    call(&mut ctx, 5, BuiltInMethod::TimeStop, &[]);
    call(&mut ctx, 5, BuiltInMethod::TimePlay, &[]);
    let restart = START_MS + 5000;
    let mut refired_at = Vec::new();
    for elapsed in [1000, 2400, 2600, 3000] {
        clock.set(restart + elapsed);
        let before = global_int(&ctx, 1);
        ctx.process_tick().unwrap();
        if global_int(&ctx, 1) > before {
            refired_at.push(elapsed);
        }
    }
    assert_eq!(refired_at, vec![2600]);
    assert_eq!(global_int(&ctx, 1), 2);
}

#[test]
fn repeated_increment_accumulates() {
    let (mut ctx, _clock) = runtime();
    ctx.globals_mut().declare(1, ScriptValue::Int(0)).unwrap();
    ctx.functions_mut().register(1, 400, increment(1).build()).unwrap();
    for _ in 0..3 {
        ctx.call_function(400, &[]).unwrap();
    }
    assert_eq!(global_int(&ctx, 1), 3);
}

#[test]
fn showing_a_hidden_image_only_dirties_its_bounds() {
    let (mut ctx, _clock) = runtime();
    let bounds = Rect::new(10, 20, 30, 40);
    ctx.register_actor(Box::new(ImageActor::new(7, 2, SpatialState::new(bounds, 0, false))))
        .unwrap();

    call(&mut ctx, 7, BuiltInMethod::SpatialShow, &[]);
    assert!(ctx.actor(7).unwrap().is_visible());
    assert_eq!(ctx.take_dirty_rects(), vec![bounds]);
    assert!(!ctx.events().iter().any(|event| event.starts_with("handler.")));

    // Showing again is a tolerated no-op.
    call(&mut ctx, 7, BuiltInMethod::SpatialShow, &[]);
    assert!(ctx.dirty_rects().is_empty());
}

#[test]
fn send_hides_each_element_in_order() {
    let (mut ctx, _clock) = runtime();
    for id in [21, 22, 23] {
        let spatial = SpatialState::new(Rect::new(0, 0, 4, 4), 0, true);
        ctx.register_actor(Box::new(ImageActor::new(id, 2, spatial)))
            .unwrap();
    }
    ctx.take_events();

    let list = ScriptValue::collection(vec![
        ScriptValue::AssetId(21),
        ScriptValue::AssetId(22),
        ScriptValue::AssetId(23),
    ]);
    ctx.call_method(
        &list,
        BuiltInMethod::Send.raw(),
        &[ScriptValue::MethodId(BuiltInMethod::SpatialHide.raw())],
    )
    .unwrap();
    assert_eq!(
        ctx.events(),
        &["actor.21.hide", "actor.22.hide", "actor.23.hide"]
    );
}

#[test]
fn path_steps_ten_times_and_ends_once() {
    let (mut ctx, clock) = runtime();
    ctx.globals_mut().declare(1, ScriptValue::Int(0)).unwrap();
    ctx.globals_mut().declare(2, ScriptValue::Int(0)).unwrap();
    let mut path = PathActor::new(30, 2, Point::new(0, 0), Point::new(100, 0), 1000, 10);
    on(path.header_mut(), EventType::PathStep, None, &increment(1));
    on(path.header_mut(), EventType::PathEnd, None, &increment(2));
    ctx.register_actor(Box::new(path)).unwrap();
    call(&mut ctx, 30, BuiltInMethod::TimePlay, &[]);

    let mut scheduler = TickScheduler::new(clock, 50, InputQueue::default());
    scheduler.run(&mut ctx, 40).unwrap();

    assert_eq!(global_int(&ctx, 1), 10);
    assert_eq!(global_int(&ctx, 2), 1);
    let percent = call(&mut ctx, 30, BuiltInMethod::PercentComplete, &[]);
    assert_eq!(percent.as_float().unwrap(), 1.0);
    let x = call(&mut ctx, 30, BuiltInMethod::GetPathX, &[]);
    assert_eq!(x.as_int().unwrap(), 100);
}

#[test]
fn chunks_rerun_with_fresh_locals() {
    let (mut ctx, _clock) = runtime();
    // local1 = local1 + param1; return local1
    let mut code = ScriptBuilder::new();
    code.declare_locals(1);
    code.assign(1, VariableScope::Local, |value| value.int(0));
    code.assign(1, VariableScope::Local, |value| {
        value.binary(Opcode::Add, |lhs| lhs.local(1), |rhs| rhs.parameter(1))
    });
    code.return_value(|value| value.local(1));
    ctx.functions_mut().register(1, 410, code.build()).unwrap();

    for _ in 0..3 {
        let result = ctx.call_function(410, &[ScriptValue::Int(5)]).unwrap();
        assert_eq!(result.as_int().unwrap(), 5);
    }
    let promoted = ctx.call_function(410, &[ScriptValue::Float(0.5)]).unwrap();
    assert!(matches!(promoted, ScriptValue::Float(value) if value == 0.5));
}
