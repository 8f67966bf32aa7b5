use mediastation_formats::ChunkReader;

use super::constants::{
    BuiltInFunction, BuiltInMethod, InstructionType, Opcode, OperandType, VariableScope,
};
use super::error::{ScriptError, ScriptResult};

/// Renders a chunk body as an indented statement listing. Offsets are
/// relative to the enclosing block.
pub fn disassemble(body: &[u8]) -> ScriptResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut reader = ChunkReader::new(body);
    while !reader.is_at_end() {
        statement(&mut reader, 0, &mut lines)?;
    }
    Ok(lines)
}

fn block(body: &[u8], depth: usize, label: &str, lines: &mut Vec<String>) -> ScriptResult<()> {
    lines.push(format!("     {}{label}:", "  ".repeat(depth)));
    let mut reader = ChunkReader::new(body);
    while !reader.is_at_end() {
        statement(&mut reader, depth + 1, lines)?;
    }
    Ok(())
}

fn function_label(id: u16) -> String {
    match BuiltInFunction::from_raw(id as u32) {
        Some(function) => format!("{id} ({function})"),
        None => id.to_string(),
    }
}

fn method_label(id: u16) -> String {
    match BuiltInMethod::from_raw(id as u32) {
        Some(method) => format!("{id} ({method})"),
        None => id.to_string(),
    }
}

fn operand(reader: &mut ChunkReader<'_>) -> ScriptResult<String> {
    let raw = reader.read_typed_u16()?;
    let kind = OperandType::from_raw(raw).ok_or(ScriptError::UnknownOperandType(raw))?;
    let text = match kind {
        OperandType::Empty => "empty".to_string(),
        OperandType::Bool => format!("bool {}", reader.read_typed_u16()? != 0),
        OperandType::Int => format!("int {}", reader.read_typed_i32()?),
        OperandType::ParamToken => format!("param_token {}", reader.read_typed_u16()?),
        OperandType::Float => format!("float {}", reader.read_typed_double()?),
        OperandType::Time => format!("time {}", reader.read_typed_double()?),
        OperandType::String => format!("string {:?}", reader.read_typed_string()?),
        OperandType::AssetId => format!("asset {}", reader.read_typed_u16()?),
        OperandType::FunctionId => format!("function {}", function_label(reader.read_typed_u16()?)),
        OperandType::MethodId => format!("method {}", method_label(reader.read_typed_u16()?)),
        OperandType::Variable | OperandType::Collection => {
            return Err(ScriptError::UnknownOperandType(raw))
        }
    };
    Ok(text)
}

fn scope_label(reader: &mut ChunkReader<'_>) -> ScriptResult<String> {
    let id = reader.read_typed_u16()?;
    let raw = reader.read_typed_u16()?;
    let scope = VariableScope::from_raw(raw).ok_or(ScriptError::UnknownVariableScope(raw))?;
    Ok(format!("{scope} {id}"))
}

fn statement(reader: &mut ChunkReader<'_>, depth: usize, lines: &mut Vec<String>) -> ScriptResult<()> {
    let offset = reader.position();
    let pad = "  ".repeat(depth);
    let raw = reader.read_typed_u16()?;
    let instruction = InstructionType::from_raw(raw).ok_or(ScriptError::UnknownInstruction(raw))?;
    let opcode = match instruction {
        InstructionType::Empty => {
            lines.push(format!("{offset:04x} {pad}empty"));
            return Ok(());
        }
        InstructionType::Operand => {
            let text = operand(reader)?;
            lines.push(format!("{offset:04x} {pad}{text}"));
            return Ok(());
        }
        InstructionType::VariableRef => {
            let text = scope_label(reader)?;
            lines.push(format!("{offset:04x} {pad}{text}"));
            return Ok(());
        }
        InstructionType::FunctionCall => {
            let raw = reader.read_typed_u16()?;
            Opcode::from_raw(raw).ok_or(ScriptError::UnknownOpcode(raw))?
        }
    };

    let child = depth + 1;
    match opcode {
        Opcode::If => {
            lines.push(format!("{offset:04x} {pad}if"));
            statement(reader, child, lines)?;
            block(reader.read_chunk()?, child, "then", lines)?;
        }
        Opcode::IfElse => {
            lines.push(format!("{offset:04x} {pad}if_else"));
            statement(reader, child, lines)?;
            block(reader.read_chunk()?, child, "then", lines)?;
            block(reader.read_chunk()?, child, "else", lines)?;
        }
        Opcode::While => {
            lines.push(format!("{offset:04x} {pad}while"));
            block(reader.read_chunk()?, child, "condition", lines)?;
            block(reader.read_chunk()?, child, "body", lines)?;
        }
        Opcode::AssignVariable => {
            let target = scope_label(reader)?;
            lines.push(format!("{offset:04x} {pad}assign {target}"));
            statement(reader, child, lines)?;
        }
        Opcode::DeclareLocals => {
            let count = reader.read_typed_u16()?;
            lines.push(format!("{offset:04x} {pad}declare_locals {count}"));
        }
        Opcode::ReturnNoValue => lines.push(format!("{offset:04x} {pad}return_no_value")),
        Opcode::Return | Opcode::Negate | Opcode::Not => {
            lines.push(format!("{offset:04x} {pad}{opcode}"));
            statement(reader, child, lines)?;
        }
        Opcode::CallFunction => {
            let id = reader.read_typed_u16()?;
            let count = reader.read_typed_u16()?;
            lines.push(format!(
                "{offset:04x} {pad}call_function {} args={count}",
                function_label(id)
            ));
            for _ in 0..count {
                statement(reader, child, lines)?;
            }
        }
        Opcode::CallMethod => {
            let id = reader.read_typed_u16()?;
            let count = reader.read_typed_u16()?;
            lines.push(format!(
                "{offset:04x} {pad}call_method {} args={count}",
                method_label(id)
            ));
            for _ in 0..=count {
                statement(reader, child, lines)?;
            }
        }
        Opcode::CallFunctionInVariable | Opcode::CallMethodInVariable => {
            let count = reader.read_typed_u16()?;
            lines.push(format!("{offset:04x} {pad}{opcode} args={count}"));
            let leading = if opcode == Opcode::CallMethodInVariable { 2 } else { 1 };
            for _ in 0..(count as usize + leading) {
                statement(reader, child, lines)?;
            }
        }
        _ => {
            lines.push(format!("{offset:04x} {pad}{opcode}"));
            statement(reader, child, lines)?;
            statement(reader, child, lines)?;
        }
    }
    Ok(())
}
