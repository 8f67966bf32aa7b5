use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::error::{ScriptError, ScriptResult};
use super::value::{ScriptValue, ValueKind};

pub type VariableRef = Rc<RefCell<Variable>>;

/// Storage cell addressed by id. Always holds a literal value.
#[derive(Debug, Clone)]
pub struct Variable {
    id: u32,
    value: ScriptValue,
}

impl Variable {
    pub fn new(id: u32, initial: ScriptValue) -> Self {
        Self {
            id,
            value: initial.literal(),
        }
    }

    pub fn shared(id: u32, initial: ScriptValue) -> VariableRef {
        Rc::new(RefCell::new(Self::new(id, initial)))
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn value(&self) -> &ScriptValue {
        &self.value
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Stores the resolved value, re-tagging the variable to whatever kind the
    /// incoming value has.
    pub fn put_value(&mut self, value: &ScriptValue) {
        self.value = value.literal();
    }
}

/// Process-wide variable table.
#[derive(Debug, Default)]
pub struct GlobalTable {
    variables: BTreeMap<u32, VariableRef>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, id: u32, initial: ScriptValue) -> ScriptResult<VariableRef> {
        if self.variables.contains_key(&id) {
            return Err(ScriptError::DuplicateGlobal(id));
        }
        let variable = Variable::shared(id, initial);
        self.variables.insert(id, variable.clone());
        Ok(variable)
    }

    pub fn get(&self, id: u32) -> ScriptResult<VariableRef> {
        self.variables
            .get(&id)
            .cloned()
            .ok_or(ScriptError::UndeclaredGlobal(id))
    }

    pub fn value(&self, id: u32) -> Option<ScriptValue> {
        self.variables
            .get(&id)
            .map(|variable| variable.borrow().value().clone())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, ScriptValue)> + '_ {
        self.variables
            .iter()
            .map(|(id, variable)| (*id, variable.borrow().value().clone()))
    }
}
