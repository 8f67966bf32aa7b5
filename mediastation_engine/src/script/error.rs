use mediastation_formats::DatumError;
use thiserror::Error;

use super::constants::{BuiltInMethod, EventType, Opcode};
use super::value::ValueKind;

/// Faults that abort the running title.
///
/// Malformed bytecode and internal invariant violations land here; nothing in
/// the interpreter catches them.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("malformed bytecode: {0}")]
    Datum(#[from] DatumError),
    #[error("unknown instruction type {0:#06x}")]
    UnknownInstruction(u16),
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),
    #[error("unknown or non-literal operand type {0:#06x}")]
    UnknownOperandType(u16),
    #[error("unknown variable scope {0}")]
    UnknownVariableScope(u16),
    #[error("cannot apply {op} to {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: ValueKind,
        rhs: ValueKind,
    },
    #[error("expected {expected}, got {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: ValueKind,
    },
    #[error("integer {op} by zero")]
    DivisionByZero { op: &'static str },
    #[error("global variable {0} declared twice")]
    DuplicateGlobal(u32),
    #[error("global variable {0} is not declared")]
    UndeclaredGlobal(u32),
    #[error("local variable {id} referenced but only {declared} locals declared")]
    LocalOutOfRange { id: u32, declared: usize },
    #[error("locals declared twice in one invocation")]
    LocalsRedeclared,
    #[error("parameter {id} referenced but only {supplied} arguments supplied")]
    ParameterOutOfRange { id: u32, supplied: usize },
    #[error("cannot assign to parameter {0}")]
    AssignToParameter(u32),
    #[error("{0} used where a value is required")]
    MisplacedControlFlow(Opcode),
    #[error("unknown function {0}")]
    UnknownFunction(u32),
    #[error("function {0} registered twice")]
    DuplicateFunction(u32),
    #[error("unknown method {0}")]
    UnknownMethod(u32),
    #[error("{target} does not implement {method}")]
    UnsupportedMethod {
        target: String,
        method: BuiltInMethod,
    },
    #[error("method {method} needs {expected} arguments, got {supplied}")]
    MissingArgument {
        method: &'static str,
        expected: usize,
        supplied: usize,
    },
    #[error("actor {actor} declares {event} handler for {argument} twice")]
    DuplicateHandler {
        actor: u32,
        event: EventType,
        argument: String,
    },
    #[error("actor {0} registered twice")]
    DuplicateActor(u32),
    #[error("no actor with id {0}")]
    UnknownActor(u32),
    #[error("call depth exceeded {0}")]
    CallDepthExceeded(usize),
}

pub type ScriptResult<T> = Result<T, ScriptError>;
