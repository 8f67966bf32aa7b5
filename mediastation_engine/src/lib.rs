pub mod actors;
pub mod audio_bridge;
pub mod cli;
pub mod clock;
pub mod context;
pub mod runtime;
pub mod scheduler;
pub mod script;
pub mod title;
pub mod types;

pub use context::{EngineContext, RuntimeConfig};
pub use script::{ScriptError, ScriptResult, ScriptValue};
