//! MediaScript: values, variables, the bytecode interpreter and the function
//! and event-handler tables built on it.

pub mod builder;
pub mod code_chunk;
pub mod collection;
pub mod constants;
pub mod disasm;
pub mod error;
pub mod event_handler;
pub mod function;
pub mod value;
pub mod variable;

pub use builder::ScriptBuilder;
pub use code_chunk::CodeChunk;
pub use collection::Collection;
pub use constants::{
    BuiltInFunction, BuiltInMethod, EventType, InstructionType, Opcode, OperandType,
    VariableScope, DOCUMENT_ACTOR_ID,
};
pub use error::{ScriptError, ScriptResult};
pub use event_handler::{EventHandler, EventHandlerTable};
pub use function::FunctionManager;
pub use value::{ScriptValue, ValueKind};
pub use variable::{GlobalTable, Variable, VariableRef};

/// Argument `index` of a built-in call, or a fatal arity error naming `name`.
pub(crate) fn required_arg<'v>(
    args: &'v [ScriptValue],
    index: usize,
    name: &'static str,
) -> ScriptResult<&'v ScriptValue> {
    args.get(index).ok_or(ScriptError::MissingArgument {
        method: name,
        expected: index + 1,
        supplied: args.len(),
    })
}
