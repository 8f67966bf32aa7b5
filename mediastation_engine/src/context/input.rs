use log::{debug, warn};

use super::EngineContext;
use crate::script::{EventType, ScriptResult, ScriptValue};
use crate::types::Point;

impl EngineContext {
    /// Topmost mouse-accepting actor under `point`. Higher z wins; among
    /// equal z the later registration wins.
    pub fn hotspot_at(&self, point: Point) -> Option<u32> {
        let mut best: Option<(i32, u32)> = None;
        for actor in self.actors.iter() {
            if !actor.accepts_mouse() {
                continue;
            }
            let Some(bounds) = actor.bounds() else {
                continue;
            };
            if !bounds.contains_point(point) {
                continue;
            }
            let z = actor.z_index();
            if best.map_or(true, |(best_z, _)| z >= best_z) {
                best = Some((z, actor.id()));
            }
        }
        best.map(|(_, id)| id)
    }

    pub fn hovered(&self) -> Option<u32> {
        self.hovered
    }

    pub fn mouse_down(&mut self, point: Point) -> ScriptResult<bool> {
        self.mouse_button(point, EventType::MouseDown)
    }

    pub fn mouse_up(&mut self, point: Point) -> ScriptResult<bool> {
        self.mouse_button(point, EventType::MouseUp)
    }

    fn mouse_button(&mut self, point: Point, event: EventType) -> ScriptResult<bool> {
        let Some(target) = self.hotspot_at(point) else {
            debug!("{event} at ({}, {}) hit nothing", point.x, point.y);
            return Ok(false);
        };
        self.log_event(format!("input.{event} {} {} -> {target}", point.x, point.y));
        self.dispatch_event(target, event, None)
    }

    pub fn mouse_moved(&mut self, point: Point) -> ScriptResult<()> {
        let target = self.hotspot_at(point);
        if target != self.hovered {
            if let Some(old) = self.hovered.take() {
                self.dispatch_event(old, EventType::MouseExited, None)?;
            }
            self.hovered = target;
            if let Some(new) = target {
                self.log_event(format!("input.hover {new}"));
                self.dispatch_event(new, EventType::MouseEntered, None)?;
            }
        }
        if let Some(id) = target {
            self.dispatch_event(id, EventType::MouseMoved, None)?;
        }
        Ok(())
    }

    /// Delivers a key press to the current screen, matched on the key code.
    pub fn key_down(&mut self, code: i64) -> ScriptResult<bool> {
        let Some(screen) = self.document.current_screen() else {
            warn!("key {code} pressed with no screen entered; dropped");
            return Ok(false);
        };
        self.log_event(format!("input.key_down {code} -> {screen}"));
        self.dispatch_event(screen, EventType::KeyDown, Some(&ScriptValue::Int(code)))
    }
}

#[cfg(test)]
mod tests {
    use crate::actors::{Actor, HotspotActor, ScreenActor, SpatialState};
    use crate::context::tests::test_context;
    use crate::context::EngineContext;
    use crate::script::{EventHandler, EventType, ScriptBuilder, ScriptValue, VariableScope};
    use crate::types::{Point, Rect};

    fn hotspot(id: u32, bounds: Rect, z: i32, mouse_active: bool) -> Box<HotspotActor> {
        let mut hotspot = HotspotActor::new(id, 1, SpatialState::new(bounds, z, true), mouse_active);
        for event in [
            EventType::MouseDown,
            EventType::MouseUp,
            EventType::MouseEntered,
            EventType::MouseExited,
            EventType::MouseMoved,
        ] {
            hotspot
                .header_mut()
                .add_handler(EventHandler::new(event, None, ScriptBuilder::new().build()))
                .unwrap();
        }
        Box::new(hotspot)
    }

    fn handler_events(ctx: &mut EngineContext) -> Vec<String> {
        ctx.take_events()
            .into_iter()
            .filter(|event| event.starts_with("handler."))
            .collect()
    }

    #[test]
    fn clicks_go_to_the_topmost_hotspot() {
        let (mut ctx, _clock) = test_context();
        ctx.register_actor(hotspot(1, Rect::new(0, 0, 50, 50), 2, true)).unwrap();
        ctx.register_actor(hotspot(2, Rect::new(0, 0, 50, 50), 5, true)).unwrap();
        ctx.register_actor(hotspot(3, Rect::new(0, 0, 50, 50), 5, true)).unwrap();
        ctx.register_actor(hotspot(4, Rect::new(0, 0, 50, 50), 9, false)).unwrap();

        assert_eq!(ctx.hotspot_at(Point::new(10, 10)), Some(3));
        assert!(ctx.mouse_down(Point::new(10, 10)).unwrap());
        assert!(!ctx.mouse_up(Point::new(50, 50)).unwrap());
        assert_eq!(handler_events(&mut ctx), vec!["handler.3.mouse_down *"]);
    }

    #[test]
    fn hover_tracking_fires_exit_then_enter() {
        let (mut ctx, _clock) = test_context();
        ctx.register_actor(hotspot(1, Rect::new(0, 0, 10, 10), 0, true)).unwrap();
        ctx.register_actor(hotspot(2, Rect::new(20, 0, 10, 10), 0, true)).unwrap();

        ctx.mouse_moved(Point::new(5, 5)).unwrap();
        ctx.mouse_moved(Point::new(6, 5)).unwrap();
        ctx.mouse_moved(Point::new(25, 5)).unwrap();
        ctx.mouse_moved(Point::new(100, 100)).unwrap();
        assert_eq!(
            handler_events(&mut ctx),
            vec![
                "handler.1.mouse_entered *",
                "handler.1.mouse_moved *",
                "handler.1.mouse_moved *",
                "handler.1.mouse_exited *",
                "handler.2.mouse_entered *",
                "handler.2.mouse_moved *",
                "handler.2.mouse_exited *",
            ]
        );
        assert_eq!(ctx.hovered(), None);
    }

    #[test]
    fn key_codes_select_screen_handlers() {
        let (mut ctx, _clock) = test_context();
        ctx.globals_mut().declare(1, ScriptValue::Int(0)).unwrap();
        let mut screen = ScreenActor::new(100, 1);
        for (code, marker) in [(13, 1), (27, 2)] {
            let mut body = ScriptBuilder::new();
            body.assign(1, VariableScope::Global, |value| value.int(marker));
            screen
                .header_mut()
                .add_handler(EventHandler::new(
                    EventType::KeyDown,
                    Some(ScriptValue::Int(code)),
                    body.build(),
                ))
                .unwrap();
        }
        ctx.register_actor(Box::new(screen)).unwrap();

        assert!(!ctx.key_down(27).unwrap());
        ctx.enter_screen(100).unwrap();
        assert!(ctx.key_down(27).unwrap());
        assert_eq!(ctx.globals().value(1).unwrap().as_int().unwrap(), 2);
        assert!(!ctx.key_down(65).unwrap());
    }
}
