//! JSON description of a title: the globals, contexts, functions and actors
//! a real player would pull out of its container files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;
use mediastation_formats::BytecodeFile;
use serde::Deserialize;

use crate::actors::{
    Actor, CameraActor, HotspotActor, ImageActor, MovieActor, MovieFrame, PathActor, ScreenActor,
    SoundActor, SpatialState, SpriteActor, SpriteClip, StageActor, TimerActor,
};
use crate::context::EngineContext;
use crate::scheduler::{InputQueue, ScheduledInput};
use crate::script::{CodeChunk, EventHandler, EventType, ScriptValue};
use crate::types::{Point, Rect};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSpec {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Time(f64),
    String(String),
    Asset(u32),
    Function(u32),
    Method(u32),
    List(Vec<ValueSpec>),
}

impl ValueSpec {
    pub fn to_value(&self) -> ScriptValue {
        match self {
            ValueSpec::Empty => ScriptValue::Empty,
            ValueSpec::Bool(flag) => ScriptValue::Bool(*flag),
            ValueSpec::Int(number) => ScriptValue::Int(*number),
            ValueSpec::Float(number) => ScriptValue::Float(*number),
            ValueSpec::Time(seconds) => ScriptValue::Time(*seconds),
            ValueSpec::String(text) => ScriptValue::string(text),
            ValueSpec::Asset(id) => ScriptValue::AssetId(*id),
            ValueSpec::Function(id) => ScriptValue::FunctionId(*id),
            ValueSpec::Method(id) => ScriptValue::MethodId(*id),
            ValueSpec::List(items) => {
                ScriptValue::collection(items.iter().map(ValueSpec::to_value).collect())
            }
        }
    }
}

/// Where a bytecode body comes from: inline bytes, or a compiled chunk
/// file (length-prefixed) relative to the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSpec {
    Bytes(Vec<u8>),
    File(PathBuf),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalSpec {
    pub id: u32,
    #[serde(default)]
    pub value: ValueSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionSpec {
    pub id: u32,
    pub code: CodeSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerSpec {
    pub event: String,
    #[serde(default)]
    pub argument: Option<ValueSpec>,
    pub code: CodeSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorKindSpec {
    Image,
    Hotspot {
        #[serde(default = "enabled")]
        mouse_active: bool,
    },
    Timer,
    Screen,
    Stage,
    Movie {
        #[serde(default)]
        frames: Vec<MovieFrame>,
    },
    Sprite {
        frame_rate: u32,
        frame_count: u32,
        #[serde(default)]
        clips: Vec<SpriteClip>,
    },
    Path {
        start: Point,
        end: Point,
        duration_ms: u64,
        step_rate: u32,
    },
    Camera {
        stage: u32,
        viewport: Rect,
    },
    Sound {
        duration_ms: u64,
    },
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorSpec {
    pub id: u32,
    #[serde(flatten)]
    pub kind: ActorKindSpec,
    #[serde(default)]
    pub bounds: Option<Rect>,
    #[serde(default)]
    pub z_index: i32,
    /// Hotspots start visible unless told otherwise; everything else
    /// starts hidden.
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub handlers: Vec<HandlerSpec>,
}

impl ActorSpec {
    fn spatial(&self) -> SpatialState {
        let visible_by_default = matches!(self.kind, ActorKindSpec::Hotspot { .. });
        SpatialState::new(
            self.bounds.unwrap_or_default(),
            self.z_index,
            self.visible.unwrap_or(visible_by_default),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextSpec {
    pub id: u32,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub globals: Vec<GlobalSpec>,
    #[serde(default)]
    pub contexts: Vec<ContextSpec>,
    #[serde(default)]
    pub entry_screen: Option<u32>,
    #[serde(default)]
    pub input: Vec<ScheduledInput>,
}

/// A parsed manifest plus the directory its code files are resolved from.
#[derive(Debug, Clone)]
pub struct Title {
    manifest: TitleManifest,
    base_dir: PathBuf,
}

impl Title {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading title manifest {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json(&json, base_dir)
            .with_context(|| format!("loading title manifest {}", path.display()))
    }

    pub fn from_json(json: &str, base_dir: PathBuf) -> Result<Self> {
        let manifest: TitleManifest =
            serde_json::from_str(json).context("parsing title manifest JSON")?;
        Ok(Self { manifest, base_dir })
    }

    pub fn manifest(&self) -> &TitleManifest {
        &self.manifest
    }

    pub fn name(&self) -> &str {
        self.manifest.name.as_deref().unwrap_or("untitled")
    }

    pub fn input_queue(&self) -> InputQueue {
        InputQueue::new(self.manifest.input.iter().copied())
    }

    fn load_code(&self, spec: &CodeSpec) -> Result<CodeChunk> {
        match spec {
            CodeSpec::Bytes(bytes) => Ok(CodeChunk::new(bytes.clone())),
            CodeSpec::File(path) => {
                let file = BytecodeFile::open(self.base_dir.join(path))?;
                Ok(CodeChunk::new(file.body().to_vec()))
            }
        }
    }

    /// Every bytecode body in the manifest with a label naming its owner.
    pub fn code_chunks(&self) -> Result<Vec<(String, CodeChunk)>> {
        let mut chunks = Vec::new();
        for context in &self.manifest.contexts {
            for function in &context.functions {
                let code = self
                    .load_code(&function.code)
                    .with_context(|| format!("loading code of function {}", function.id))?;
                chunks.push((format!("function {}", function.id), code));
            }
            for actor in &context.actors {
                for handler in &actor.handlers {
                    let code = self.load_code(&handler.code).with_context(|| {
                        format!("loading {} handler of actor {}", handler.event, actor.id)
                    })?;
                    chunks.push((format!("actor {} {}", actor.id, handler.event), code));
                }
            }
        }
        Ok(chunks)
    }

    fn build_actor(&self, context_id: u32, spec: &ActorSpec) -> Result<Box<dyn Actor>> {
        let id = spec.id;
        let mut actor: Box<dyn Actor> = match &spec.kind {
            ActorKindSpec::Image => Box::new(ImageActor::new(id, context_id, spec.spatial())),
            ActorKindSpec::Hotspot { mouse_active } => Box::new(HotspotActor::new(
                id,
                context_id,
                spec.spatial(),
                *mouse_active,
            )),
            ActorKindSpec::Timer => Box::new(TimerActor::new(id, context_id)),
            ActorKindSpec::Screen => Box::new(ScreenActor::new(id, context_id)),
            ActorKindSpec::Stage => Box::new(StageActor::new(id, context_id, spec.spatial())),
            ActorKindSpec::Movie { frames } => Box::new(MovieActor::new(
                id,
                context_id,
                spec.spatial(),
                frames.clone(),
            )),
            ActorKindSpec::Sprite {
                frame_rate,
                frame_count,
                clips,
            } => Box::new(SpriteActor::new(
                id,
                context_id,
                spec.spatial(),
                *frame_rate,
                *frame_count,
                clips.clone(),
            )),
            ActorKindSpec::Path {
                start,
                end,
                duration_ms,
                step_rate,
            } => Box::new(PathActor::new(
                id,
                context_id,
                *start,
                *end,
                *duration_ms,
                *step_rate,
            )),
            ActorKindSpec::Camera { stage, viewport } => {
                Box::new(CameraActor::new(id, context_id, *stage, *viewport))
            }
            ActorKindSpec::Sound { duration_ms } => {
                Box::new(SoundActor::new(id, context_id, *duration_ms))
            }
        };

        for handler in &spec.handlers {
            let event = EventType::from_name(&handler.event)
                .ok_or_else(|| anyhow!("actor {id}: unknown event type {:?}", handler.event))?;
            let code = self
                .load_code(&handler.code)
                .with_context(|| format!("loading {event} handler of actor {id}"))?;
            let argument = handler.argument.as_ref().map(ValueSpec::to_value);
            actor
                .header_mut()
                .add_handler(EventHandler::new(event, argument, code))
                .with_context(|| format!("registering {event} handler of actor {id}"))?;
        }
        Ok(actor)
    }

    /// Declares the globals, registers every context's functions and actors,
    /// then enters the entry screen.
    pub fn install(&self, ctx: &mut EngineContext) -> Result<()> {
        for global in &self.manifest.globals {
            ctx.globals_mut()
                .declare(global.id, global.value.to_value())
                .with_context(|| format!("declaring global {}", global.id))?;
        }

        for context in &self.manifest.contexts {
            for function in &context.functions {
                let code = self
                    .load_code(&function.code)
                    .with_context(|| format!("loading code of function {}", function.id))?;
                ctx.functions_mut()
                    .register(context.id, function.id, code)
                    .with_context(|| format!("registering function {}", function.id))?;
            }
            for spec in &context.actors {
                let actor = self.build_actor(context.id, spec)?;
                ctx.register_actor(actor)
                    .with_context(|| format!("registering actor {}", spec.id))?;
            }
            info!(
                "loaded context {}: {} functions, {} actors",
                context.id,
                context.functions.len(),
                context.actors.len()
            );
        }

        if let Some(screen) = self.manifest.entry_screen {
            ctx.enter_screen(screen)
                .with_context(|| format!("entering screen {screen}"))?;
        }
        Ok(())
    }
}
