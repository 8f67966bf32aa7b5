use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, warn};

use super::code_chunk::CodeChunk;
use super::constants::EventType;
use super::error::{ScriptError, ScriptResult};
use super::value::ScriptValue;
use crate::context::EngineContext;

/// Compiled reaction to one event type, optionally gated on an argument.
#[derive(Debug)]
pub struct EventHandler {
    event: EventType,
    argument: Option<ScriptValue>,
    code: CodeChunk,
}

impl EventHandler {
    pub fn new(event: EventType, argument: Option<ScriptValue>, code: CodeChunk) -> Self {
        Self {
            event,
            argument: argument.map(|value| value.literal()),
            code,
        }
    }

    pub fn event(&self) -> EventType {
        self.event
    }

    pub fn argument(&self) -> Option<&ScriptValue> {
        self.argument.as_ref()
    }

    pub fn code(&self) -> &CodeChunk {
        &self.code
    }

    /// Timer threshold in whole milliseconds, for timer handlers carrying a
    /// numeric argument.
    pub fn timer_threshold_ms(&self) -> Option<u64> {
        if self.event != EventType::Timer {
            return None;
        }
        let seconds = self.argument.as_ref()?.as_float().ok()?;
        Some((seconds * 1000.0).max(0.0) as u64)
    }

    fn describe_argument(&self) -> String {
        match &self.argument {
            Some(value) => value.to_string(),
            None => "*".to_string(),
        }
    }

    /// Runs the handler's code for `actor_id` with the stored argument as the
    /// single parameter.
    pub fn execute(&self, ctx: &mut EngineContext, actor_id: u32) -> ScriptResult<ScriptValue> {
        let argument = self.argument.clone().unwrap_or_default();
        debug!(
            "actor {actor_id}: running {} handler ({})",
            self.event,
            self.describe_argument()
        );
        ctx.log_event(format!(
            "handler.{actor_id}.{} {}",
            self.event,
            self.describe_argument()
        ));
        self.code.execute(ctx, &[argument])
    }
}

/// Handlers of one actor, grouped by event type in declaration order.
#[derive(Debug, Default)]
pub struct EventHandlerTable {
    handlers: BTreeMap<EventType, Vec<Rc<EventHandler>>>,
}

impl EventHandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Adds a handler, rejecting a second unconditional handler or a second
    /// handler with an equal argument for the same event.
    pub fn add(&mut self, actor_id: u32, handler: EventHandler) -> ScriptResult<()> {
        let existing = self.handlers.entry(handler.event).or_default();
        let conflict = existing.iter().any(|other| match (&other.argument, &handler.argument) {
            (None, None) => true,
            (Some(a), Some(b)) => a.equals(b).unwrap_or(false),
            _ => false,
        });
        if conflict {
            return Err(ScriptError::DuplicateHandler {
                actor: actor_id,
                event: handler.event,
                argument: handler.describe_argument(),
            });
        }
        existing.push(Rc::new(handler));
        Ok(())
    }

    pub fn of(&self, event: EventType) -> &[Rc<EventHandler>] {
        self.handlers
            .get(&event)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Picks the handler for an incoming event: the first whose argument
    /// equals `value`, else the unconditional one.
    pub fn find(&self, event: EventType, value: Option<&ScriptValue>) -> Option<Rc<EventHandler>> {
        let candidates = self.of(event);
        if let Some(value) = value {
            for handler in candidates {
                let Some(argument) = &handler.argument else {
                    continue;
                };
                match argument.equals(value) {
                    Ok(true) => return Some(handler.clone()),
                    Ok(false) => {}
                    Err(err) => warn!("{event} handler argument not comparable, skipped: {err}"),
                }
            }
        }
        candidates
            .iter()
            .find(|handler| handler.argument.is_none())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::builder::ScriptBuilder;

    fn handler(event: EventType, argument: Option<ScriptValue>, marker: i32) -> EventHandler {
        let mut code = ScriptBuilder::new();
        code.return_value(|value| value.int(marker));
        EventHandler::new(event, argument, code.build())
    }

    fn marker(handler: &EventHandler) -> Vec<u8> {
        handler.code().body().to_vec()
    }

    #[test]
    fn specific_argument_wins_over_unconditional() {
        let mut table = EventHandlerTable::new();
        let fallback = handler(EventType::KeyDown, None, 0);
        let enter = handler(EventType::KeyDown, Some(ScriptValue::Int(13)), 1);
        let fallback_body = marker(&fallback);
        let enter_body = marker(&enter);
        table.add(3, fallback).unwrap();
        table.add(3, enter).unwrap();

        let found = table
            .find(EventType::KeyDown, Some(&ScriptValue::Int(13)))
            .unwrap();
        assert_eq!(marker(&found), enter_body);
        let found = table
            .find(EventType::KeyDown, Some(&ScriptValue::Int(27)))
            .unwrap();
        assert_eq!(marker(&found), fallback_body);
    }

    #[test]
    fn incomparable_arguments_are_skipped() {
        let mut table = EventHandlerTable::new();
        table
            .add(3, handler(EventType::KeyDown, Some(ScriptValue::string("a")), 1))
            .unwrap();
        assert!(table
            .find(EventType::KeyDown, Some(&ScriptValue::Int(65)))
            .is_none());
        assert!(table.find(EventType::MouseDown, None).is_none());
    }

    #[test]
    fn duplicate_handlers_are_rejected() {
        let mut table = EventHandlerTable::new();
        table.add(4, handler(EventType::MouseDown, None, 0)).unwrap();
        let err = table
            .add(4, handler(EventType::MouseDown, None, 1))
            .unwrap_err();
        assert!(matches!(err, ScriptError::DuplicateHandler { actor: 4, .. }));

        table
            .add(4, handler(EventType::Timer, Some(ScriptValue::Float(1.0)), 0))
            .unwrap();
        assert!(table
            .add(4, handler(EventType::Timer, Some(ScriptValue::Int(1)), 1))
            .is_err());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn timer_threshold_truncates_to_milliseconds() {
        let timer = handler(EventType::Timer, Some(ScriptValue::Float(2.5)), 0);
        assert_eq!(timer.timer_threshold_ms(), Some(2500));
        let odd = handler(EventType::Timer, Some(ScriptValue::Time(0.0019)), 0);
        assert_eq!(odd.timer_threshold_ms(), Some(1));
        let other = handler(EventType::MouseDown, None, 0);
        assert_eq!(other.timer_threshold_ms(), None);
    }
}
