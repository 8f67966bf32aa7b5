use std::{cell::RefCell, rc::Rc};

use serde::Serialize;

/// Boundary to the host's audio mixer. Sound actors call it when playback
/// starts or is cut short; the default methods ignore the request.
pub trait AudioCallback {
    fn sound_play(&self, _asset_id: u32) {}
    fn sound_stop(&self, _asset_id: u32) {}
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioEvent {
    SoundPlay { asset_id: u32 },
    SoundStop { asset_id: u32 },
}

#[derive(Clone, Default)]
pub struct RecordingAudioCallback {
    events: Rc<RefCell<Vec<AudioEvent>>>,
}

impl RecordingAudioCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.events.borrow().clone()
    }
}

impl AudioCallback for RecordingAudioCallback {
    fn sound_play(&self, asset_id: u32) {
        self.events
            .borrow_mut()
            .push(AudioEvent::SoundPlay { asset_id });
    }

    fn sound_stop(&self, asset_id: u32) {
        self.events
            .borrow_mut()
            .push(AudioEvent::SoundStop { asset_id });
    }
}
