use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use mediastation_engine::script::{BuiltInMethod, Opcode, ScriptBuilder, VariableScope};
use serde::Deserialize;
use serde_json::{json, Value};
use tempfile::tempdir;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum AudioEvent {
    SoundPlay { asset_id: u32 },
    SoundStop { asset_id: u32 },
}

#[derive(Debug, Deserialize)]
struct EventLog {
    events: Vec<EventLogEntry>,
}

#[derive(Debug, Deserialize)]
struct EventLogEntry {
    sequence: usize,
    label: String,
}

fn method_call(method: BuiltInMethod, target: u16) -> Vec<u8> {
    let mut code = ScriptBuilder::new();
    code.call_method(method.raw(), |receiver| receiver.asset(target), |_| {});
    code.bytes().to_vec()
}

fn demo_manifest() -> Value {
    let mut increment = ScriptBuilder::new();
    increment.assign(1, VariableScope::Global, |value| {
        value.binary(Opcode::Add, |lhs| lhs.global(1), |rhs| rhs.int(1))
    });

    let mut entry = ScriptBuilder::new();
    entry.call_method(BuiltInMethod::TimePlay.raw(), |receiver| receiver.asset(5), |_| {});
    entry.call_method(BuiltInMethod::TimePlay.raw(), |receiver| receiver.asset(6), |_| {});

    json!({
        "name": "cli demo",
        "globals": [{ "id": 1, "value": { "int": 0 } }],
        "contexts": [{
            "id": 2,
            "actors": [
                {
                    "id": 5,
                    "kind": "timer",
                    "handlers": [{
                        "event": "timer",
                        "argument": { "time": 0.1 },
                        "code": { "bytes": increment.bytes() }
                    }]
                },
                { "id": 6, "kind": "sound", "duration_ms": 10000 },
                {
                    "id": 100,
                    "kind": "screen",
                    "handlers": [
                        { "event": "screen_entry", "code": { "bytes": entry.bytes() } },
                        {
                            "event": "key_down",
                            "argument": { "int": 13 },
                            "code": { "bytes": method_call(BuiltInMethod::TimeStop, 6) }
                        }
                    ]
                }
            ]
        }],
        "entry_screen": 100,
        "input": [{ "at_ms": 300, "kind": "key_down", "code": 13 }]
    })
}

#[test]
fn runs_a_title_and_writes_logs() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let title_path = temp_dir.path().join("title.json");
    let state_path = temp_dir.path().join("state.json");
    let events_path = temp_dir.path().join("events.json");
    let audio_path = temp_dir.path().join("audio.json");
    fs::write(&title_path, serde_json::to_string_pretty(&demo_manifest())?)?;

    let output = Command::new(env!("CARGO_BIN_EXE_mediastation_engine"))
        .arg("--title")
        .arg(&title_path)
        .args(["--ticks", "10", "--tick-ms", "50"])
        .arg("--state-json")
        .arg(&state_path)
        .arg("--event-log-json")
        .arg(&events_path)
        .arg("--audio-log-json")
        .arg(&audio_path)
        .output()
        .context("running mediastation_engine")?;
    assert!(
        output.status.success(),
        "engine failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ran cli demo for 10 ticks (500 ms)"));

    let state: Value = serde_json::from_str(&fs::read_to_string(&state_path)?)?;
    assert_eq!(state["current_screen"], json!(100));
    assert_eq!(state["globals"][0]["value"], json!("1"));

    let log: EventLog = serde_json::from_str(&fs::read_to_string(&events_path)?)?;
    let timer_fires = log
        .events
        .iter()
        .filter(|entry| entry.label.starts_with("handler.5.timer"))
        .count();
    assert_eq!(timer_fires, 1);
    assert!(log
        .events
        .iter()
        .enumerate()
        .all(|(index, entry)| entry.sequence == index));

    let audio: Vec<AudioEvent> = serde_json::from_str(&fs::read_to_string(&audio_path)?)?;
    assert_eq!(
        audio,
        vec![
            AudioEvent::SoundPlay { asset_id: 6 },
            AudioEvent::SoundStop { asset_id: 6 },
        ]
    );
    Ok(())
}

#[test]
fn disassembles_every_chunk() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let title_path = temp_dir.path().join("title.json");
    fs::write(&title_path, serde_json::to_string(&demo_manifest())?)?;

    let output = Command::new(env!("CARGO_BIN_EXE_mediastation_engine"))
        .arg("--title")
        .arg(&title_path)
        .arg("--disassemble")
        .output()
        .context("running mediastation_engine --disassemble")?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("actor 5 timer"));
    assert!(stdout.contains("actor 100 screen_entry"));
    assert!(stdout.contains("call_method"));
    Ok(())
}

#[test]
fn script_faults_exit_non_zero() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let title_path = temp_dir.path().join("title.json");
    let manifest = json!({
        "contexts": [{
            "id": 2,
            "actors": [{
                "id": 100,
                "kind": "screen",
                "handlers": [{
                    "event": "screen_entry",
                    "code": { "bytes": method_call(BuiltInMethod::TimePlay, 404) }
                }]
            }]
        }],
        "entry_screen": 100
    });
    fs::write(&title_path, serde_json::to_string(&manifest)?)?;

    let output = Command::new(env!("CARGO_BIN_EXE_mediastation_engine"))
        .arg("--title")
        .arg(&title_path)
        .output()
        .context("running mediastation_engine")?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no actor with id 404"));
    Ok(())
}
