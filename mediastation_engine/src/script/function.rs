use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::Rng;

use super::code_chunk::CodeChunk;
use super::constants::BuiltInFunction;
use super::error::{ScriptError, ScriptResult};
use super::value::ScriptValue;
use super::required_arg;
use crate::context::EngineContext;

#[derive(Debug, Clone)]
struct TitleFunction {
    context_id: u32,
    code: CodeChunk,
}

/// Title-defined functions keyed by id, remembering which context loaded each.
#[derive(Debug, Default)]
pub struct FunctionManager {
    functions: BTreeMap<u32, TitleFunction>,
}

impl FunctionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.functions.contains_key(&id)
    }

    pub fn register(&mut self, context_id: u32, id: u32, code: CodeChunk) -> ScriptResult<()> {
        if self.functions.contains_key(&id) {
            return Err(ScriptError::DuplicateFunction(id));
        }
        self.functions.insert(id, TitleFunction { context_id, code });
        Ok(())
    }

    pub fn lookup(&self, id: u32) -> Option<CodeChunk> {
        self.functions.get(&id).map(|function| function.code.clone())
    }

    /// Removes every function registered by `context_id`; returns how many.
    pub fn delete_functions_for_context(&mut self, context_id: u32) -> usize {
        let before = self.functions.len();
        self.functions
            .retain(|_, function| function.context_id != context_id);
        before - self.functions.len()
    }

    /// Resolves and runs function `id`: intrinsics first, then title
    /// functions, then the script built-ins.
    pub fn call(
        ctx: &mut EngineContext,
        id: u32,
        args: &[ScriptValue],
    ) -> ScriptResult<ScriptValue> {
        let builtin = BuiltInFunction::from_raw(id);
        if let Some(intrinsic) = builtin.filter(|function| function.is_intrinsic()) {
            return call_builtin(ctx, intrinsic, args);
        }
        if let Some(code) = ctx.functions().lookup(id) {
            debug!("calling title function {id} with {} args", args.len());
            return code.execute(ctx, args);
        }
        match builtin {
            Some(function) => call_builtin(ctx, function, args),
            None => Err(ScriptError::UnknownFunction(id)),
        }
    }
}

fn join_args(args: &[ScriptValue]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn int_range(function: BuiltInFunction, args: &[ScriptValue]) -> ScriptResult<(i64, i64)> {
    let low = required_arg(args, 0, function.as_str())?.as_int()?;
    let high = required_arg(args, 1, function.as_str())?.as_int()?;
    if low > high {
        warn!("{function}: range {low}..={high} is inverted; swapping");
        return Ok((high, low));
    }
    Ok((low, high))
}

/// Sorted, distinct integers among `excluded` that fall inside `low..=high`.
fn excluded_in_range(excluded: &[ScriptValue], low: i64, high: i64) -> Vec<i64> {
    let mut values: Vec<i64> = excluded
        .iter()
        .filter_map(|value| {
            let number = value.as_int().ok()?;
            value
                .equals(&ScriptValue::Int(number))
                .unwrap_or(false)
                .then_some(number)
        })
        .filter(|number| (low..=high).contains(number))
        .collect();
    values.sort_unstable();
    values.dedup();
    values
}

fn call_builtin(
    ctx: &mut EngineContext,
    function: BuiltInFunction,
    args: &[ScriptValue],
) -> ScriptResult<ScriptValue> {
    match function {
        BuiltInFunction::EffectTransition | BuiltInFunction::EffectTransitionOnSync => {
            debug!("{function} forwarded to renderer");
            ctx.log_event(format!("transition.{function} {}", join_args(args)));
            Ok(ScriptValue::Empty)
        }
        BuiltInFunction::Random => {
            let (low, high) = int_range(function, args)?;
            Ok(ScriptValue::Int(ctx.rng_mut().gen_range(low..=high)))
        }
        BuiltInFunction::GetUniqueRandom => {
            let (low, high) = int_range(function, args)?;
            let excluded = excluded_in_range(&args[2..], low, high);
            let span = i128::from(high) - i128::from(low) + 1;
            let available = span - excluded.len() as i128;
            if available <= 0 {
                warn!("{function}: every value in {low}..={high} is excluded");
                return Ok(ScriptValue::Empty);
            }
            // Map the k-th free slot past each exclusion at or below it.
            let mut choice = i128::from(low) + ctx.rng_mut().gen_range(0..available);
            for taken in excluded {
                if i128::from(taken) > choice {
                    break;
                }
                choice += 1;
            }
            Ok(ScriptValue::Int(choice as i64))
        }
        BuiltInFunction::TimeOfDay => Ok(ScriptValue::Float(ctx.time_of_day_secs())),
        BuiltInFunction::SquareRoot => {
            let value = required_arg(args, 0, function.as_str())?.as_float()?;
            if value < 0.0 {
                warn!("{function} of negative value {value}");
                return Ok(ScriptValue::Empty);
            }
            Ok(ScriptValue::Float(value.sqrt()))
        }
        BuiltInFunction::CurrentRunTime => {
            Ok(ScriptValue::Time(ctx.run_time_ms() as f64 / 1000.0))
        }
        BuiltInFunction::DebugPrint => {
            let message = join_args(args);
            info!("script: {message}");
            ctx.log_event(format!("debug_print {message}"));
            Ok(ScriptValue::Empty)
        }
    }
}
