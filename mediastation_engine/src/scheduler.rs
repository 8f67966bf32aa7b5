use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, ManualClock};
use crate::context::EngineContext;
use crate::script::ScriptResult;
use crate::types::Point;

/// One host input occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    MouseDown { x: i32, y: i32 },
    MouseUp { x: i32, y: i32 },
    MouseMoved { x: i32, y: i32 },
    KeyDown { code: i64 },
}

impl InputEvent {
    pub fn deliver(&self, ctx: &mut EngineContext) -> ScriptResult<()> {
        match *self {
            InputEvent::MouseDown { x, y } => {
                ctx.mouse_down(Point::new(x, y))?;
            }
            InputEvent::MouseUp { x, y } => {
                ctx.mouse_up(Point::new(x, y))?;
            }
            InputEvent::MouseMoved { x, y } => ctx.mouse_moved(Point::new(x, y))?,
            InputEvent::KeyDown { code } => {
                ctx.key_down(code)?;
            }
        }
        Ok(())
    }
}

/// Input event stamped with the clock reading it becomes due at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInput {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: InputEvent,
}

/// Pending input in delivery order, plus everything already delivered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InputQueue {
    pending: VecDeque<ScheduledInput>,
    history: Vec<ScheduledInput>,
}

impl InputQueue {
    /// Events are ordered by due time; equal times keep their given order.
    pub fn new<I>(events: I) -> Self
    where
        I: IntoIterator<Item = ScheduledInput>,
    {
        let mut events: Vec<ScheduledInput> = events.into_iter().collect();
        events.sort_by_key(|input| input.at_ms);
        InputQueue {
            pending: events.into(),
            history: Vec::new(),
        }
    }

    pub fn push(&mut self, input: ScheduledInput) {
        let index = self
            .pending
            .iter()
            .position(|queued| queued.at_ms > input.at_ms)
            .unwrap_or(self.pending.len());
        self.pending.insert(index, input);
    }

    /// Pops the next event if it is due at `now`.
    pub fn next_due(&mut self, now: u64) -> Option<ScheduledInput> {
        if self.pending.front()?.at_ms > now {
            return None;
        }
        let input = self.pending.pop_front()?;
        self.history.push(input);
        Some(input)
    }

    pub fn peek(&self) -> Option<&ScheduledInput> {
        self.pending.front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = &ScheduledInput> {
        self.pending.iter()
    }

    pub fn history(&self) -> &[ScheduledInput] {
        &self.history
    }
}

/// Fixed-step host loop over a `ManualClock`, so runs replay identically.
#[derive(Debug)]
pub struct TickScheduler {
    clock: ManualClock,
    tick_ms: u64,
    ticks: u64,
    input: InputQueue,
}

impl TickScheduler {
    pub fn new(clock: ManualClock, tick_ms: u64, input: InputQueue) -> Self {
        TickScheduler {
            clock,
            tick_ms,
            ticks: 0,
            input,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn input(&self) -> &InputQueue {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputQueue {
        &mut self.input
    }

    /// Advances the clock one step, delivers the input due by then and runs
    /// the actors.
    pub fn tick(&mut self, ctx: &mut EngineContext) -> ScriptResult<()> {
        self.clock.advance(self.tick_ms);
        self.ticks += 1;
        let now = self.clock.now_ms();
        while let Some(input) = self.input.next_due(now) {
            debug!("tick {}: delivering {:?}", self.ticks, input.event);
            input.event.deliver(ctx)?;
        }
        ctx.process_tick()
    }

    pub fn run(&mut self, ctx: &mut EngineContext, ticks: u64) -> ScriptResult<()> {
        for _ in 0..ticks {
            self.tick(ctx)?;
        }
        Ok(())
    }
}
