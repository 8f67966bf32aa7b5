use std::cmp::Ordering;
use std::rc::Rc;

use log::trace;
use mediastation_formats::ChunkReader;

use super::constants::{InstructionType, Opcode, OperandType, VariableScope};
use super::error::{ScriptError, ScriptResult};
use super::value::ScriptValue;
use super::variable::{Variable, VariableRef};
use crate::context::EngineContext;

/// An executable bytecode body.
///
/// The bytes are immutable and shared; every `execute` decodes from offset 0
/// with its own cursor, so a chunk can be re-run (or re-entered recursively)
/// any number of times.
#[derive(Debug, Clone)]
pub struct CodeChunk {
    body: Rc<[u8]>,
}

/// Outcome of one statement.
enum Step {
    Value(ScriptValue),
    Return(ScriptValue),
}

/// Per-invocation storage: declared locals and the caller's arguments.
struct Frame<'a> {
    locals: Option<Vec<VariableRef>>,
    args: &'a [ScriptValue],
}

impl CodeChunk {
    pub fn new(body: impl Into<Rc<[u8]>>) -> Self {
        Self { body: body.into() }
    }

    /// Builds a chunk from a typed length prefix followed by the body.
    pub fn from_framed(bytes: &[u8]) -> ScriptResult<Self> {
        let mut reader = ChunkReader::new(bytes);
        let body = reader.read_chunk()?;
        Ok(Self::new(body))
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Runs the chunk to completion. `args` become the Parameter scope; the
    /// result is the value of an explicit return, or `Empty`.
    pub fn execute(
        &self,
        ctx: &mut EngineContext,
        args: &[ScriptValue],
    ) -> ScriptResult<ScriptValue> {
        ctx.enter_call()?;
        let mut evaluator = Evaluator {
            ctx: &mut *ctx,
            frame: Frame { locals: None, args },
        };
        let outcome = evaluator.run_block(&self.body);
        ctx.exit_call();
        Ok(outcome?.unwrap_or_default())
    }
}

struct Evaluator<'c, 'a> {
    ctx: &'c mut EngineContext,
    frame: Frame<'a>,
}

impl Evaluator<'_, '_> {
    /// Executes every statement of a block; `Some` carries a return value.
    fn run_block(&mut self, body: &[u8]) -> ScriptResult<Option<ScriptValue>> {
        let mut reader = ChunkReader::new(body);
        while !reader.is_at_end() {
            if let Step::Return(value) = self.statement(&mut reader)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Evaluates a condition block; the last statement supplies the value.
    fn block_value(&mut self, body: &[u8]) -> ScriptResult<ScriptValue> {
        let mut reader = ChunkReader::new(body);
        let mut last = ScriptValue::Empty;
        while !reader.is_at_end() {
            last = self.value(&mut reader)?;
        }
        Ok(last)
    }

    fn statement(&mut self, reader: &mut ChunkReader<'_>) -> ScriptResult<Step> {
        let raw = reader.read_typed_u16()?;
        let instruction =
            InstructionType::from_raw(raw).ok_or(ScriptError::UnknownInstruction(raw))?;
        match instruction {
            InstructionType::Empty => Ok(Step::Value(ScriptValue::Empty)),
            InstructionType::Operand => self.operand(reader).map(Step::Value),
            InstructionType::VariableRef => self.variable(reader).map(Step::Value),
            InstructionType::FunctionCall => self.function_call(reader),
        }
    }

    fn value(&mut self, reader: &mut ChunkReader<'_>) -> ScriptResult<ScriptValue> {
        match self.statement(reader)? {
            Step::Value(value) => Ok(value),
            Step::Return(_) => Err(ScriptError::MisplacedControlFlow(Opcode::Return)),
        }
    }

    fn values(&mut self, reader: &mut ChunkReader<'_>, count: u16) -> ScriptResult<Vec<ScriptValue>> {
        (0..count).map(|_| self.value(reader)).collect()
    }

    fn operand(&mut self, reader: &mut ChunkReader<'_>) -> ScriptResult<ScriptValue> {
        let raw = reader.read_typed_u16()?;
        let kind = OperandType::from_raw(raw).ok_or(ScriptError::UnknownOperandType(raw))?;
        let value = match kind {
            OperandType::Empty => ScriptValue::Empty,
            OperandType::Bool => ScriptValue::Bool(reader.read_typed_u16()? != 0),
            OperandType::Int => ScriptValue::Int(reader.read_typed_i32()? as i64),
            OperandType::ParamToken => ScriptValue::ParamToken(reader.read_typed_u16()? as u32),
            OperandType::Float => ScriptValue::Float(reader.read_typed_double()?),
            OperandType::Time => ScriptValue::Time(reader.read_typed_double()?),
            OperandType::String => ScriptValue::string(reader.read_typed_string()?),
            OperandType::AssetId => ScriptValue::AssetId(reader.read_typed_u16()? as u32),
            OperandType::FunctionId => ScriptValue::FunctionId(reader.read_typed_u16()? as u32),
            OperandType::MethodId => ScriptValue::MethodId(reader.read_typed_u16()? as u32),
            OperandType::Variable | OperandType::Collection => {
                return Err(ScriptError::UnknownOperandType(raw))
            }
        };
        Ok(value)
    }

    fn read_scope(reader: &mut ChunkReader<'_>) -> ScriptResult<(u32, VariableScope)> {
        let id = reader.read_typed_u16()? as u32;
        let raw = reader.read_typed_u16()?;
        let scope = VariableScope::from_raw(raw).ok_or(ScriptError::UnknownVariableScope(raw))?;
        Ok((id, scope))
    }

    fn variable(&mut self, reader: &mut ChunkReader<'_>) -> ScriptResult<ScriptValue> {
        let (id, scope) = Self::read_scope(reader)?;
        match scope {
            VariableScope::Global => Ok(ScriptValue::Reference(self.ctx.globals().get(id)?)),
            VariableScope::Local => Ok(ScriptValue::Reference(self.local(id)?)),
            VariableScope::Parameter => self.parameter(id),
        }
    }

    fn local(&self, id: u32) -> ScriptResult<VariableRef> {
        let locals = self.frame.locals.as_deref().unwrap_or_default();
        id.checked_sub(1)
            .and_then(|index| locals.get(index as usize))
            .cloned()
            .ok_or(ScriptError::LocalOutOfRange {
                id,
                declared: locals.len(),
            })
    }

    fn parameter(&self, id: u32) -> ScriptResult<ScriptValue> {
        id.checked_sub(1)
            .and_then(|index| self.frame.args.get(index as usize))
            .cloned()
            .ok_or(ScriptError::ParameterOutOfRange {
                id,
                supplied: self.frame.args.len(),
            })
    }

    fn assign(&mut self, id: u32, scope: VariableScope, value: ScriptValue) -> ScriptResult<()> {
        let target = match scope {
            VariableScope::Global => self.ctx.globals().get(id)?,
            VariableScope::Local => self.local(id)?,
            VariableScope::Parameter => return Err(ScriptError::AssignToParameter(id)),
        };
        // Resolve before borrowing the target: `x = x` reads the same cell.
        let literal = value.literal();
        target.borrow_mut().put_value(&literal);
        Ok(())
    }

    fn binary(&mut self, reader: &mut ChunkReader<'_>) -> ScriptResult<(ScriptValue, ScriptValue)> {
        let lhs = self.value(reader)?;
        let rhs = self.value(reader)?;
        Ok((lhs, rhs))
    }

    fn compare(
        &mut self,
        reader: &mut ChunkReader<'_>,
        op: Opcode,
        accept: fn(Ordering) -> bool,
    ) -> ScriptResult<ScriptValue> {
        let (lhs, rhs) = self.binary(reader)?;
        let ordering = lhs.compare(&rhs, op.as_str())?;
        Ok(ScriptValue::Bool(accept(ordering)))
    }

    fn function_call(&mut self, reader: &mut ChunkReader<'_>) -> ScriptResult<Step> {
        let raw = reader.read_typed_u16()?;
        let opcode = Opcode::from_raw(raw).ok_or(ScriptError::UnknownOpcode(raw))?;
        trace!("opcode {opcode} at offset {}", reader.position());

        let value = match opcode {
            Opcode::If => {
                let condition = self.value(reader)?.as_bool()?;
                let body = reader.read_chunk()?;
                if condition {
                    if let Some(returned) = self.run_block(body)? {
                        return Ok(Step::Return(returned));
                    }
                }
                ScriptValue::Empty
            }
            Opcode::IfElse => {
                let condition = self.value(reader)?.as_bool()?;
                // Both bodies are consumed so the cursor lands after the else.
                let if_body = reader.read_chunk()?;
                let else_body = reader.read_chunk()?;
                let chosen = if condition { if_body } else { else_body };
                if let Some(returned) = self.run_block(chosen)? {
                    return Ok(Step::Return(returned));
                }
                ScriptValue::Empty
            }
            Opcode::While => {
                let condition = reader.read_chunk()?;
                let body = reader.read_chunk()?;
                while self.block_value(condition)?.as_bool()? {
                    if let Some(returned) = self.run_block(body)? {
                        return Ok(Step::Return(returned));
                    }
                }
                ScriptValue::Empty
            }
            Opcode::AssignVariable => {
                let (id, scope) = Self::read_scope(reader)?;
                let value = self.value(reader)?;
                self.assign(id, scope, value)?;
                ScriptValue::Empty
            }
            Opcode::Or => {
                let (lhs, rhs) = self.binary(reader)?;
                ScriptValue::Bool(lhs.as_bool()? || rhs.as_bool()?)
            }
            Opcode::Xor => {
                let (lhs, rhs) = self.binary(reader)?;
                ScriptValue::Bool(lhs.as_bool()? ^ rhs.as_bool()?)
            }
            Opcode::And => {
                let (lhs, rhs) = self.binary(reader)?;
                ScriptValue::Bool(lhs.as_bool()? && rhs.as_bool()?)
            }
            Opcode::Equals => {
                let (lhs, rhs) = self.binary(reader)?;
                ScriptValue::Bool(lhs.equals(&rhs)?)
            }
            Opcode::NotEquals => {
                let (lhs, rhs) = self.binary(reader)?;
                ScriptValue::Bool(!lhs.equals(&rhs)?)
            }
            Opcode::LessThan => self.compare(reader, opcode, Ordering::is_lt)?,
            Opcode::GreaterThan => self.compare(reader, opcode, Ordering::is_gt)?,
            Opcode::LessThanOrEqualTo => self.compare(reader, opcode, Ordering::is_le)?,
            Opcode::GreaterThanOrEqualTo => self.compare(reader, opcode, Ordering::is_ge)?,
            Opcode::Add => {
                let (lhs, rhs) = self.binary(reader)?;
                lhs.add(&rhs)?
            }
            Opcode::Subtract => {
                let (lhs, rhs) = self.binary(reader)?;
                lhs.sub(&rhs)?
            }
            Opcode::Multiply => {
                let (lhs, rhs) = self.binary(reader)?;
                lhs.mul(&rhs)?
            }
            Opcode::Divide => {
                let (lhs, rhs) = self.binary(reader)?;
                lhs.div(&rhs)?
            }
            Opcode::Modulo => {
                let (lhs, rhs) = self.binary(reader)?;
                lhs.rem(&rhs)?
            }
            Opcode::Negate => self.value(reader)?.negate()?,
            Opcode::Not => ScriptValue::Bool(!self.value(reader)?.as_bool()?),
            Opcode::CallFunction => {
                let function = reader.read_typed_u16()? as u32;
                let count = reader.read_typed_u16()?;
                let args = self.values(reader, count)?;
                self.ctx.call_function(function, &args)?
            }
            Opcode::CallMethod => {
                let method = reader.read_typed_u16()? as u32;
                let count = reader.read_typed_u16()?;
                let target = self.value(reader)?;
                let args = self.values(reader, count)?;
                self.ctx.call_method(&target, method, &args)?
            }
            Opcode::CallFunctionInVariable => {
                let count = reader.read_typed_u16()?;
                let function = self.value(reader)?.as_function_id()?;
                let args = self.values(reader, count)?;
                self.ctx.call_function(function, &args)?
            }
            Opcode::CallMethodInVariable => {
                let count = reader.read_typed_u16()?;
                let method = self.value(reader)?.as_method_id()?;
                let target = self.value(reader)?;
                let args = self.values(reader, count)?;
                self.ctx.call_method(&target, method, &args)?
            }
            Opcode::DeclareLocals => {
                let count = reader.read_typed_u16()? as u32;
                if self.frame.locals.is_some() {
                    return Err(ScriptError::LocalsRedeclared);
                }
                self.frame.locals = Some(
                    (1..=count)
                        .map(|id| Variable::shared(id, ScriptValue::Empty))
                        .collect(),
                );
                ScriptValue::Empty
            }
            Opcode::Return => {
                let value = self.value(reader)?;
                return Ok(Step::Return(value.literal()));
            }
            Opcode::ReturnNoValue => return Ok(Step::Return(ScriptValue::Empty)),
        };
        Ok(Step::Value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::test_context;
    use crate::script::builder::ScriptBuilder;
    use crate::script::constants::{BuiltInFunction, Opcode};

    fn global_int(ctx: &EngineContext, id: u32) -> i64 {
        ctx.globals().value(id).unwrap().as_int().unwrap()
    }

    #[test]
    fn increments_global_across_runs() {
        let (mut ctx, _clock) = test_context();
        ctx.globals_mut().declare(1, ScriptValue::Int(0)).unwrap();

        let mut code = ScriptBuilder::new();
        code.assign(1, VariableScope::Global, |value| {
            value.binary(Opcode::Add, |lhs| lhs.global(1), |rhs| rhs.int(1));
        });
        let chunk = code.build();

        for _ in 0..3 {
            chunk.execute(&mut ctx, &[]).unwrap();
        }
        assert_eq!(global_int(&ctx, 1), 3);
    }

    #[test]
    fn locals_are_fresh_each_invocation() {
        let (mut ctx, _clock) = test_context();
        let mut code = ScriptBuilder::new();
        code.declare_locals(1);
        // local1 starts empty; returning (local1 == empty) proves isolation.
        code.if_else(
            |cond| {
                cond.binary(Opcode::Equals, |lhs| lhs.local(1), |rhs| rhs.empty());
            },
            |then| {
                then.assign(1, VariableScope::Local, |value| {
                    value.int(5);
                });
                then.return_value(|value| {
                    value.local(1);
                });
            },
            |otherwise| {
                otherwise.return_value(|value| {
                    value.int(-1);
                });
            },
        );
        let chunk = code.build();

        let first = chunk.execute(&mut ctx, &[]).unwrap();
        let second = chunk.execute(&mut ctx, &[]).unwrap();
        assert!(matches!(first, ScriptValue::Int(5)));
        assert!(matches!(second, ScriptValue::Int(5)));
    }

    #[test]
    fn if_else_consumes_both_branches() {
        let (mut ctx, _clock) = test_context();
        ctx.globals_mut().declare(2, ScriptValue::Int(0)).unwrap();

        let mut code = ScriptBuilder::new();
        code.if_else(
            |cond| {
                cond.boolean(false);
            },
            |then| {
                then.assign(2, VariableScope::Global, |value| {
                    value.int(10);
                });
            },
            |otherwise| {
                otherwise.assign(2, VariableScope::Global, |value| {
                    value.int(20);
                });
            },
        );
        // Runs after the if/else; only reachable if both bodies were skipped over.
        code.assign(2, VariableScope::Global, |value| {
            value.binary(Opcode::Multiply, |lhs| lhs.global(2), |rhs| rhs.int(2));
        });
        code.build().execute(&mut ctx, &[]).unwrap();
        assert_eq!(global_int(&ctx, 2), 40);
    }

    #[test]
    fn while_loop_runs_until_condition_fails() {
        let (mut ctx, _clock) = test_context();
        let mut code = ScriptBuilder::new();
        code.declare_locals(1);
        code.assign(1, VariableScope::Local, |value| {
            value.int(0);
        });
        code.while_loop(
            |cond| {
                cond.binary(Opcode::LessThan, |lhs| lhs.local(1), |rhs| rhs.int(4));
            },
            |body| {
                body.assign(1, VariableScope::Local, |value| {
                    value.binary(Opcode::Add, |lhs| lhs.local(1), |rhs| rhs.int(1));
                });
            },
        );
        code.return_value(|value| {
            value.local(1);
        });
        let result = code.build().execute(&mut ctx, &[]).unwrap();
        assert!(matches!(result, ScriptValue::Int(4)));
    }

    #[test]
    fn parameters_are_read_only() {
        let (mut ctx, _clock) = test_context();
        let mut code = ScriptBuilder::new();
        code.return_value(|value| {
            value.binary(Opcode::Add, |lhs| lhs.parameter(1), |rhs| rhs.parameter(2));
        });
        let result = code
            .build()
            .execute(&mut ctx, &[ScriptValue::Int(2), ScriptValue::Float(0.5)])
            .unwrap();
        assert!(matches!(result, ScriptValue::Float(value) if value == 2.5));

        let mut assign = ScriptBuilder::new();
        assign.assign(1, VariableScope::Parameter, |value| {
            value.int(0);
        });
        let err = assign
            .build()
            .execute(&mut ctx, &[ScriptValue::Int(1)])
            .unwrap_err();
        assert!(matches!(err, ScriptError::AssignToParameter(1)));
    }

    #[test]
    fn unknown_opcode_is_fatal() {
        let (mut ctx, _clock) = test_context();
        let mut code = ScriptBuilder::new();
        code.raw_u16(InstructionType::FunctionCall.raw());
        code.raw_u16(0x0042);
        let err = code.build().execute(&mut ctx, &[]).unwrap_err();
        assert!(matches!(err, ScriptError::UnknownOpcode(0x42)));
    }

    #[test]
    fn type_mismatch_is_fatal() {
        let (mut ctx, _clock) = test_context();
        let mut code = ScriptBuilder::new();
        code.return_value(|value| {
            value.binary(Opcode::Add, |lhs| lhs.string("a"), |rhs| rhs.asset(3));
        });
        let err = code.build().execute(&mut ctx, &[]).unwrap_err();
        assert!(matches!(err, ScriptError::TypeMismatch { .. }));
    }

    #[test]
    fn declaring_locals_twice_is_fatal() {
        let (mut ctx, _clock) = test_context();
        let mut code = ScriptBuilder::new();
        code.declare_locals(1);
        code.declare_locals(2);
        let err = code.build().execute(&mut ctx, &[]).unwrap_err();
        assert!(matches!(err, ScriptError::LocalsRedeclared));
    }

    #[test]
    fn re_execution_is_idempotent() {
        let (mut ctx, _clock) = test_context();
        let mut code = ScriptBuilder::new();
        code.return_value(|value| {
            value.call_function(BuiltInFunction::SquareRoot.raw(), |args| {
                args.float(16.0);
            });
        });
        let chunk = code.build();
        let first = chunk.execute(&mut ctx, &[]).unwrap();
        let second = chunk.execute(&mut ctx, &[]).unwrap();
        assert!(first.equals(&second).unwrap());
        assert!(first.equals(&ScriptValue::Float(4.0)).unwrap());
    }

    #[test]
    fn framed_chunk_strips_length_prefix() {
        let mut code = ScriptBuilder::new();
        code.int(7);
        let framed = code.build_framed();
        let chunk = CodeChunk::from_framed(&framed).unwrap();
        assert_eq!(chunk.body(), code.build().body());
    }
}
