use mediastation_formats::ChunkWriter;

use super::code_chunk::CodeChunk;
use super::constants::{InstructionType, Opcode, OperandType, VariableScope};

/// Assembles MediaScript bytecode statement by statement.
///
/// Nested operands are written through closures that receive a fresh
/// builder, so argument counts are derived from what the closure emitted.
/// Manifests, tests and the disassembler round-trips all go through this.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    writer: ChunkWriter,
    statements: u16,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top-level statements written so far.
    pub fn statement_count(&self) -> u16 {
        self.statements
    }

    pub fn bytes(&self) -> &[u8] {
        self.writer.as_bytes()
    }

    pub fn build(&self) -> CodeChunk {
        CodeChunk::new(self.writer.as_bytes().to_vec())
    }

    /// Body prefixed with its typed length, as stored in compiled titles.
    pub fn build_framed(&self) -> Vec<u8> {
        let mut framed = ChunkWriter::new();
        framed.write_chunk(self.writer.as_bytes());
        framed.into_bytes()
    }

    fn nested(emit: impl FnOnce(&mut ScriptBuilder)) -> ScriptBuilder {
        let mut sub = ScriptBuilder::new();
        emit(&mut sub);
        sub
    }

    fn splice(&mut self, sub: &ScriptBuilder) {
        self.writer.append_raw(sub.bytes());
    }

    fn begin(&mut self, instruction: InstructionType) {
        self.statements += 1;
        self.writer.write_u16(instruction.raw());
    }

    fn operand(&mut self, kind: OperandType) {
        self.begin(InstructionType::Operand);
        self.writer.write_u16(kind.raw());
    }

    fn opcode(&mut self, opcode: Opcode) {
        self.begin(InstructionType::FunctionCall);
        self.writer.write_u16(opcode.raw());
    }

    /// Writes an unchecked typed u16; used to produce deliberately malformed
    /// streams.
    pub fn raw_u16(&mut self, value: u16) {
        self.writer.write_u16(value);
    }

    pub fn empty(&mut self) {
        self.begin(InstructionType::Empty);
    }

    pub fn boolean(&mut self, value: bool) {
        self.operand(OperandType::Bool);
        self.writer.write_u16(value as u16);
    }

    pub fn int(&mut self, value: i32) {
        self.operand(OperandType::Int);
        self.writer.write_i32(value);
    }

    pub fn param_token(&mut self, value: u16) {
        self.operand(OperandType::ParamToken);
        self.writer.write_u16(value);
    }

    pub fn float(&mut self, value: f64) {
        self.operand(OperandType::Float);
        self.writer.write_double(value);
    }

    pub fn time(&mut self, seconds: f64) {
        self.operand(OperandType::Time);
        self.writer.write_double(seconds);
    }

    pub fn string(&mut self, value: &str) {
        self.operand(OperandType::String);
        self.writer.write_string(value);
    }

    pub fn asset(&mut self, id: u16) {
        self.operand(OperandType::AssetId);
        self.writer.write_u16(id);
    }

    pub fn function_id(&mut self, id: u16) {
        self.operand(OperandType::FunctionId);
        self.writer.write_u16(id);
    }

    pub fn method_id(&mut self, id: u16) {
        self.operand(OperandType::MethodId);
        self.writer.write_u16(id);
    }

    pub fn variable(&mut self, id: u16, scope: VariableScope) {
        self.begin(InstructionType::VariableRef);
        self.writer.write_u16(id);
        self.writer.write_u16(scope.raw());
    }

    pub fn global(&mut self, id: u16) {
        self.variable(id, VariableScope::Global)
    }

    pub fn local(&mut self, id: u16) {
        self.variable(id, VariableScope::Local)
    }

    pub fn parameter(&mut self, id: u16) {
        self.variable(id, VariableScope::Parameter)
    }

    pub fn assign(
        &mut self,
        id: u16,
        scope: VariableScope,
        value: impl FnOnce(&mut ScriptBuilder),
    ) {
        self.opcode(Opcode::AssignVariable);
        self.writer.write_u16(id);
        self.writer.write_u16(scope.raw());
        let value = Self::nested(value);
        self.splice(&value);
    }

    /// Two-operand opcode (logic, comparison or arithmetic).
    pub fn binary(
        &mut self,
        opcode: Opcode,
        lhs: impl FnOnce(&mut ScriptBuilder),
        rhs: impl FnOnce(&mut ScriptBuilder),
    ) {
        self.opcode(opcode);
        let lhs = Self::nested(lhs);
        let rhs = Self::nested(rhs);
        self.splice(&lhs);
        self.splice(&rhs);
    }

    pub fn unary(&mut self, opcode: Opcode, operand: impl FnOnce(&mut ScriptBuilder)) {
        self.opcode(opcode);
        let operand = Self::nested(operand);
        self.splice(&operand);
    }

    pub fn if_then(
        &mut self,
        condition: impl FnOnce(&mut ScriptBuilder),
        body: impl FnOnce(&mut ScriptBuilder),
    ) {
        self.opcode(Opcode::If);
        let condition = Self::nested(condition);
        let body = Self::nested(body);
        self.splice(&condition);
        self.writer.write_chunk(body.bytes());
    }

    pub fn if_else(
        &mut self,
        condition: impl FnOnce(&mut ScriptBuilder),
        then: impl FnOnce(&mut ScriptBuilder),
        otherwise: impl FnOnce(&mut ScriptBuilder),
    ) {
        self.opcode(Opcode::IfElse);
        let condition = Self::nested(condition);
        let then = Self::nested(then);
        let otherwise = Self::nested(otherwise);
        self.splice(&condition);
        self.writer.write_chunk(then.bytes());
        self.writer.write_chunk(otherwise.bytes());
    }

    pub fn while_loop(
        &mut self,
        condition: impl FnOnce(&mut ScriptBuilder),
        body: impl FnOnce(&mut ScriptBuilder),
    ) {
        self.opcode(Opcode::While);
        let condition = Self::nested(condition);
        let body = Self::nested(body);
        self.writer.write_chunk(condition.bytes());
        self.writer.write_chunk(body.bytes());
    }

    pub fn declare_locals(&mut self, count: u16) {
        self.opcode(Opcode::DeclareLocals);
        self.writer.write_u16(count);
    }

    pub fn return_value(&mut self, value: impl FnOnce(&mut ScriptBuilder)) {
        self.opcode(Opcode::Return);
        let value = Self::nested(value);
        self.splice(&value);
    }

    pub fn return_empty(&mut self) {
        self.opcode(Opcode::ReturnNoValue);
    }

    pub fn call_function(&mut self, id: u32, args: impl FnOnce(&mut ScriptBuilder)) {
        self.opcode(Opcode::CallFunction);
        let args = Self::nested(args);
        self.writer.write_u16(id as u16);
        self.writer.write_u16(args.statement_count());
        self.splice(&args);
    }

    pub fn call_method(
        &mut self,
        method: u32,
        target: impl FnOnce(&mut ScriptBuilder),
        args: impl FnOnce(&mut ScriptBuilder),
    ) {
        self.opcode(Opcode::CallMethod);
        let target = Self::nested(target);
        let args = Self::nested(args);
        self.writer.write_u16(method as u16);
        self.writer.write_u16(args.statement_count());
        self.splice(&target);
        self.splice(&args);
    }

    pub fn call_function_in_variable(
        &mut self,
        function: impl FnOnce(&mut ScriptBuilder),
        args: impl FnOnce(&mut ScriptBuilder),
    ) {
        self.opcode(Opcode::CallFunctionInVariable);
        let function = Self::nested(function);
        let args = Self::nested(args);
        self.writer.write_u16(args.statement_count());
        self.splice(&function);
        self.splice(&args);
    }

    pub fn call_method_in_variable(
        &mut self,
        method: impl FnOnce(&mut ScriptBuilder),
        target: impl FnOnce(&mut ScriptBuilder),
        args: impl FnOnce(&mut ScriptBuilder),
    ) {
        self.opcode(Opcode::CallMethodInVariable);
        let method = Self::nested(method);
        let target = Self::nested(target);
        let args = Self::nested(args);
        self.writer.write_u16(args.statement_count());
        self.splice(&method);
        self.splice(&target);
        self.splice(&args);
    }
}
