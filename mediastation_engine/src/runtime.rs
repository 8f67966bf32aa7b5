use std::{fs, path::Path, rc::Rc};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::actors::ActorSnapshot;
use crate::audio_bridge::{AudioCallback, RecordingAudioCallback};
use crate::cli::{DisassembleArgs, RunArgs};
use crate::clock::ManualClock;
use crate::context::{EngineContext, RuntimeConfig};
use crate::scheduler::TickScheduler;
use crate::script::disasm::disassemble;
use crate::script::ValueKind;
use crate::title::Title;
use crate::types::Rect;

#[derive(Serialize)]
struct EventLogEntry<'a> {
    sequence: usize,
    label: &'a str,
}

#[derive(Serialize)]
struct EventLog<'a> {
    title: &'a str,
    events: Vec<EventLogEntry<'a>>,
}

#[derive(Serialize)]
struct GlobalSnapshot {
    id: u32,
    kind: ValueKind,
    value: String,
}

#[derive(Serialize)]
struct StateSnapshot<'a> {
    title: &'a str,
    ticks: u64,
    now_ms: u64,
    current_screen: Option<u32>,
    globals: Vec<GlobalSnapshot>,
    actors: Vec<ActorSnapshot>,
    dirty_rects: &'a [Rect],
}

pub fn execute(args: RunArgs) -> Result<()> {
    let RunArgs {
        title,
        ticks,
        tick_ms,
        seed,
        max_call_depth,
        event_log_json,
        state_json,
        audio_log_json,
        verbose,
    } = args;

    let title = Title::open(&title)?;
    let clock = ManualClock::new();
    let config = RuntimeConfig {
        seed,
        max_call_depth,
    };
    let mut ctx = EngineContext::new(Rc::new(clock.clone()), config);

    let audio_recorder = audio_log_json
        .as_ref()
        .map(|_| Rc::new(RecordingAudioCallback::new()));
    ctx.set_audio_callback(
        audio_recorder
            .as_ref()
            .map(|recorder| recorder.clone() as Rc<dyn AudioCallback>),
    );
    if let Some(path) = audio_log_json.as_ref() {
        eprintln!(
            "[mediastation_engine] info: capturing audio events to {}",
            path.display()
        );
    }

    title
        .install(&mut ctx)
        .with_context(|| format!("installing title {}", title.name()))?;

    let mut scheduler = TickScheduler::new(clock, tick_ms, title.input_queue());
    scheduler
        .run(&mut ctx, ticks)
        .with_context(|| format!("title aborted at tick {}", scheduler.ticks()))?;
    if !scheduler.input().is_empty() {
        eprintln!(
            "[mediastation_engine] warning: {} scripted input events were never delivered",
            scheduler.input().len()
        );
    }

    println!(
        "Ran {} for {} ticks ({} ms): {} actors, {} events",
        title.name(),
        scheduler.ticks(),
        scheduler.now(),
        ctx.actors().len(),
        ctx.events().len()
    );
    if verbose {
        for event in ctx.events() {
            println!("  {event}");
        }
    }

    if let Some(path) = event_log_json.as_ref() {
        let log = EventLog {
            title: title.name(),
            events: ctx
                .events()
                .iter()
                .enumerate()
                .map(|(sequence, label)| EventLogEntry { sequence, label })
                .collect(),
        };
        write_json(path, &log, "runtime event log")?;
    }

    if let Some(path) = state_json.as_ref() {
        let state = StateSnapshot {
            title: title.name(),
            ticks: scheduler.ticks(),
            now_ms: scheduler.now(),
            current_screen: ctx.current_screen(),
            globals: ctx
                .globals()
                .iter()
                .map(|(id, value)| GlobalSnapshot {
                    id,
                    kind: value.literal_kind(),
                    value: value.to_string(),
                })
                .collect(),
            actors: ctx.snapshots(),
            dirty_rects: ctx.dirty_rects(),
        };
        write_json(path, &state, "runtime state")?;
    }

    if let (Some(path), Some(recorder)) = (audio_log_json.as_ref(), audio_recorder.as_ref()) {
        write_json(path, &recorder.events(), "audio event log")?;
    }

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).with_context(|| format!("serializing {what} to JSON"))?;
    fs::write(path, &json).with_context(|| format!("writing {what} to {}", path.display()))?;
    println!("Saved {what} to {}", path.display());
    Ok(())
}

pub fn disassemble_title(args: DisassembleArgs) -> Result<()> {
    let title = Title::open(&args.title)?;
    for (label, chunk) in title.code_chunks()? {
        let lines =
            disassemble(chunk.body()).with_context(|| format!("disassembling {label}"))?;
        println!("{label} ({} bytes):", chunk.len());
        for line in lines {
            println!("  {line}");
        }
    }
    Ok(())
}
