use log::{debug, warn};
use serde::Serialize;

use super::EngineContext;
use crate::actors::ActorKind;
use crate::script::{required_arg, BuiltInMethod, EventType, ScriptError, ScriptResult, ScriptValue};

/// Title-level navigation state owned by the document (asset 1).
#[derive(Debug, Default, Clone, Serialize)]
pub struct DocumentState {
    current_screen: Option<u32>,
    pending_branch: Option<u32>,
}

impl DocumentState {
    pub fn current_screen(&self) -> Option<u32> {
        self.current_screen
    }

    pub fn pending_branch(&self) -> Option<u32> {
        self.pending_branch
    }

    pub(super) fn forget_screen(&mut self, id: u32) {
        if self.current_screen == Some(id) {
            self.current_screen = None;
        }
        if self.pending_branch == Some(id) {
            self.pending_branch = None;
        }
    }
}

impl EngineContext {
    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    pub fn current_screen(&self) -> Option<u32> {
        self.document.current_screen
    }

    /// Queues a branch to `screen`; it happens at the end of the tick.
    /// A later request in the same tick replaces an earlier one.
    pub fn branch_to_screen(&mut self, screen: u32) {
        if let Some(previous) = self.document.pending_branch.replace(screen) {
            debug!("branch to {previous} superseded by {screen}");
        }
        self.log_event(format!("document.branch_to_screen {screen}"));
    }

    /// Leaves the current screen and enters `screen` right away.
    pub fn enter_screen(&mut self, screen: u32) -> ScriptResult<()> {
        match self.actors.get(screen).map(|actor| actor.kind()) {
            Some(ActorKind::Screen) => {}
            Some(kind) => {
                warn!("branch target {screen} is a {kind}, not a screen; ignored");
                return Ok(());
            }
            None => {
                warn!("branch to unknown screen {screen}; ignored");
                return Ok(());
            }
        }
        if let Some(old) = self.document.current_screen.take() {
            self.log_event(format!("screen.{old}.exit"));
            self.dispatch_event(old, EventType::ScreenExit, None)?;
        }
        self.document.current_screen = Some(screen);
        self.log_event(format!("screen.{screen}.entry"));
        self.dispatch_event(screen, EventType::ScreenEntry, None)?;
        Ok(())
    }

    pub(super) fn apply_pending_branch(&mut self) -> ScriptResult<()> {
        match self.document.pending_branch.take() {
            Some(screen) => self.enter_screen(screen),
            None => Ok(()),
        }
    }

    /// Destroys every actor and function loaded by `context_id`.
    pub fn release_context(&mut self, context_id: u32) -> ScriptResult<()> {
        let actors = self.actors.ids_in_context(context_id);
        for id in &actors {
            self.destroy_actor(*id)?;
        }
        let functions = self.functions.delete_functions_for_context(context_id);
        self.log_event(format!(
            "context.{context_id}.release actors={} functions={functions}",
            actors.len()
        ));
        Ok(())
    }

    pub(super) fn call_document_method(
        &mut self,
        method: BuiltInMethod,
        args: &[ScriptValue],
    ) -> ScriptResult<ScriptValue> {
        match method {
            BuiltInMethod::BranchToScreen => {
                let screen = required_arg(args, 0, method.as_str())?.as_asset_id()?;
                self.branch_to_screen(screen);
            }
            BuiltInMethod::ReleaseContext => {
                let context = required_arg(args, 0, method.as_str())?.as_asset_id()?;
                self.release_context(context)?;
            }
            _ => {
                return Err(ScriptError::UnsupportedMethod {
                    target: "document".to_string(),
                    method,
                })
            }
        }
        Ok(ScriptValue::Empty)
    }
}

#[cfg(test)]
mod tests {
    use crate::actors::{Actor, ScreenActor, TimerActor};
    use crate::context::tests::test_context;
    use crate::script::{
        BuiltInMethod, EventHandler, EventType, ScriptBuilder, ScriptValue, DOCUMENT_ACTOR_ID,
    };

    fn screen(id: u32, context_id: u32) -> Box<ScreenActor> {
        let mut screen = ScreenActor::new(id, context_id);
        for event in [EventType::ScreenEntry, EventType::ScreenExit] {
            screen
                .header_mut()
                .add_handler(EventHandler::new(event, None, ScriptBuilder::new().build()))
                .unwrap();
        }
        Box::new(screen)
    }

    #[test]
    fn branch_waits_for_end_of_tick() {
        let (mut ctx, _clock) = test_context();
        ctx.register_actor(screen(100, 1)).unwrap();
        ctx.register_actor(screen(200, 2)).unwrap();
        ctx.enter_screen(100).unwrap();

        let document = ScriptValue::AssetId(DOCUMENT_ACTOR_ID);
        ctx.call_method(
            &document,
            BuiltInMethod::BranchToScreen.raw(),
            &[ScriptValue::AssetId(200)],
        )
        .unwrap();
        assert_eq!(ctx.current_screen(), Some(100));

        ctx.take_events();
        ctx.process_tick().unwrap();
        assert_eq!(ctx.current_screen(), Some(200));
        assert_eq!(
            ctx.events(),
            &[
                "screen.100.exit",
                "handler.100.screen_exit *",
                "screen.200.entry",
                "handler.200.screen_entry *",
            ]
        );
    }

    #[test]
    fn unknown_screen_is_ignored() {
        let (mut ctx, _clock) = test_context();
        ctx.register_actor(screen(100, 1)).unwrap();
        ctx.register_actor(Box::new(TimerActor::new(5, 1))).unwrap();
        ctx.enter_screen(100).unwrap();
        ctx.enter_screen(5).unwrap();
        ctx.branch_to_screen(404);
        ctx.process_tick().unwrap();
        assert_eq!(ctx.current_screen(), Some(100));
    }

    #[test]
    fn release_context_drops_its_actors_and_functions() {
        let (mut ctx, _clock) = test_context();
        ctx.register_actor(screen(100, 1)).unwrap();
        ctx.register_actor(Box::new(TimerActor::new(5, 2))).unwrap();
        ctx.register_actor(Box::new(TimerActor::new(6, 2))).unwrap();
        ctx.functions_mut()
            .register(2, 700, ScriptBuilder::new().build())
            .unwrap();
        ctx.functions_mut()
            .register(1, 701, ScriptBuilder::new().build())
            .unwrap();

        ctx.call_method(
            &ScriptValue::AssetId(DOCUMENT_ACTOR_ID),
            BuiltInMethod::ReleaseContext.raw(),
            &[ScriptValue::Int(2)],
        )
        .unwrap();
        assert!(ctx.actor(5).is_none());
        assert!(ctx.actor(6).is_none());
        assert!(ctx.actor(100).is_some());
        assert!(!ctx.functions().contains(700));
        assert!(ctx.functions().contains(701));
        assert_eq!(
            ctx.events().last().map(String::as_str),
            Some("context.2.release actors=2 functions=1")
        );
    }
}
