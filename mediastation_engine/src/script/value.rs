use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::collection::Collection;
use super::error::{ScriptError, ScriptResult};
use super::variable::VariableRef;

/// Tag of a runtime value, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Empty,
    Bool,
    Int,
    ParamToken,
    Float,
    Time,
    String,
    AssetId,
    FunctionId,
    MethodId,
    Collection,
    Reference,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueKind::Empty => "empty",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::ParamToken => "param token",
            ValueKind::Float => "float",
            ValueKind::Time => "time",
            ValueKind::String => "string",
            ValueKind::AssetId => "asset id",
            ValueKind::FunctionId => "function id",
            ValueKind::MethodId => "method id",
            ValueKind::Collection => "collection",
            ValueKind::Reference => "variable reference",
        };
        f.write_str(label)
    }
}

/// Runtime value produced and consumed by the interpreter.
///
/// Strings are immutable and shared; collections are shared by reference so
/// a method call on a variable's collection mutates the stored list.
#[derive(Debug, Clone, Default)]
pub enum ScriptValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    ParamToken(u32),
    Float(f64),
    Time(f64),
    String(Rc<str>),
    AssetId(u32),
    FunctionId(u32),
    MethodId(u32),
    Collection(Rc<RefCell<Collection>>),
    Reference(VariableRef),
}

enum Numeric {
    Int(i64),
    Float(f64),
}

impl ScriptValue {
    pub fn string(value: impl AsRef<str>) -> Self {
        ScriptValue::String(Rc::from(value.as_ref()))
    }

    pub fn collection(values: Vec<ScriptValue>) -> Self {
        ScriptValue::Collection(Rc::new(RefCell::new(Collection::from_values(values))))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ScriptValue::Empty => ValueKind::Empty,
            ScriptValue::Bool(_) => ValueKind::Bool,
            ScriptValue::Int(_) => ValueKind::Int,
            ScriptValue::ParamToken(_) => ValueKind::ParamToken,
            ScriptValue::Float(_) => ValueKind::Float,
            ScriptValue::Time(_) => ValueKind::Time,
            ScriptValue::String(_) => ValueKind::String,
            ScriptValue::AssetId(_) => ValueKind::AssetId,
            ScriptValue::FunctionId(_) => ValueKind::FunctionId,
            ScriptValue::MethodId(_) => ValueKind::MethodId,
            ScriptValue::Collection(_) => ValueKind::Collection,
            ScriptValue::Reference(_) => ValueKind::Reference,
        }
    }

    /// Kind after dereferencing a variable reference.
    pub fn literal_kind(&self) -> ValueKind {
        match self {
            ScriptValue::Reference(variable) => variable.borrow().value().kind(),
            other => other.kind(),
        }
    }

    /// Resolves one level of variable indirection. Variables never hold
    /// references, so the result is always a concrete value.
    pub fn literal(&self) -> ScriptValue {
        match self {
            ScriptValue::Reference(variable) => variable.borrow().value().clone(),
            other => other.clone(),
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            ScriptValue::Int(value) => Some(Numeric::Int(*value)),
            ScriptValue::ParamToken(value) => Some(Numeric::Int(*value as i64)),
            ScriptValue::Float(value) | ScriptValue::Time(value) => Some(Numeric::Float(*value)),
            _ => None,
        }
    }

    fn unexpected(&self, expected: &'static str) -> ScriptError {
        ScriptError::UnexpectedValue {
            expected,
            found: self.literal_kind(),
        }
    }

    pub fn as_bool(&self) -> ScriptResult<bool> {
        let value = self.literal();
        match value {
            ScriptValue::Bool(flag) => Ok(flag),
            ScriptValue::Int(number) => Ok(number != 0),
            ScriptValue::ParamToken(token) => Ok(token != 0),
            ScriptValue::Float(number) | ScriptValue::Time(number) => Ok(number != 0.0),
            other => Err(other.unexpected("bool")),
        }
    }

    pub fn as_int(&self) -> ScriptResult<i64> {
        let value = self.literal();
        match value.numeric() {
            Some(Numeric::Int(number)) => Ok(number),
            Some(Numeric::Float(number)) => Ok(number as i64),
            None => match value {
                ScriptValue::Bool(flag) => Ok(flag as i64),
                other => Err(other.unexpected("number")),
            },
        }
    }

    pub fn as_float(&self) -> ScriptResult<f64> {
        let value = self.literal();
        match value.numeric() {
            Some(Numeric::Int(number)) => Ok(number as f64),
            Some(Numeric::Float(number)) => Ok(number),
            None => Err(value.unexpected("number")),
        }
    }

    pub fn as_asset_id(&self) -> ScriptResult<u32> {
        let value = self.literal();
        match value {
            ScriptValue::AssetId(id) => Ok(id),
            ScriptValue::Int(id) if id >= 0 => Ok(id as u32),
            other => Err(other.unexpected("asset id")),
        }
    }

    pub fn as_function_id(&self) -> ScriptResult<u32> {
        let value = self.literal();
        match value {
            ScriptValue::FunctionId(id) => Ok(id),
            other => Err(other.unexpected("function id")),
        }
    }

    pub fn as_method_id(&self) -> ScriptResult<u32> {
        let value = self.literal();
        match value {
            ScriptValue::MethodId(id) => Ok(id),
            other => Err(other.unexpected("method id")),
        }
    }

    pub fn as_collection(&self) -> ScriptResult<Rc<RefCell<Collection>>> {
        let value = self.literal();
        match value {
            ScriptValue::Collection(list) => Ok(list),
            other => Err(other.unexpected("collection")),
        }
    }

    fn mismatch(op: &'static str, lhs: &ScriptValue, rhs: &ScriptValue) -> ScriptError {
        ScriptError::TypeMismatch {
            op,
            lhs: lhs.kind(),
            rhs: rhs.kind(),
        }
    }

    fn arithmetic(
        &self,
        other: &ScriptValue,
        op: &'static str,
        int_op: impl Fn(i64, i64) -> ScriptResult<i64>,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> ScriptResult<ScriptValue> {
        let lhs = self.literal();
        let rhs = other.literal();
        match (lhs.numeric(), rhs.numeric()) {
            (Some(Numeric::Int(a)), Some(Numeric::Int(b))) => Ok(ScriptValue::Int(int_op(a, b)?)),
            (Some(a), Some(b)) => {
                let a = match a {
                    Numeric::Int(value) => value as f64,
                    Numeric::Float(value) => value,
                };
                let b = match b {
                    Numeric::Int(value) => value as f64,
                    Numeric::Float(value) => value,
                };
                Ok(ScriptValue::Float(float_op(a, b)))
            }
            _ => Err(Self::mismatch(op, &lhs, &rhs)),
        }
    }

    pub fn add(&self, other: &ScriptValue) -> ScriptResult<ScriptValue> {
        self.arithmetic(other, "+", |a, b| Ok(a.wrapping_add(b)), |a, b| a + b)
    }

    pub fn sub(&self, other: &ScriptValue) -> ScriptResult<ScriptValue> {
        self.arithmetic(other, "-", |a, b| Ok(a.wrapping_sub(b)), |a, b| a - b)
    }

    pub fn mul(&self, other: &ScriptValue) -> ScriptResult<ScriptValue> {
        self.arithmetic(other, "*", |a, b| Ok(a.wrapping_mul(b)), |a, b| a * b)
    }

    pub fn div(&self, other: &ScriptValue) -> ScriptResult<ScriptValue> {
        self.arithmetic(
            other,
            "/",
            |a, b| {
                if b == 0 {
                    return Err(ScriptError::DivisionByZero { op: "division" });
                }
                Ok(a.wrapping_div(b))
            },
            |a, b| a / b,
        )
    }

    pub fn rem(&self, other: &ScriptValue) -> ScriptResult<ScriptValue> {
        self.arithmetic(
            other,
            "%",
            |a, b| {
                if b == 0 {
                    return Err(ScriptError::DivisionByZero { op: "modulo" });
                }
                Ok(a.wrapping_rem(b))
            },
            |a, b| a % b,
        )
    }

    pub fn negate(&self) -> ScriptResult<ScriptValue> {
        let value = self.literal();
        match value {
            ScriptValue::Int(number) => Ok(ScriptValue::Int(number.wrapping_neg())),
            ScriptValue::ParamToken(token) => Ok(ScriptValue::Int(-(token as i64))),
            ScriptValue::Float(number) => Ok(ScriptValue::Float(-number)),
            ScriptValue::Time(number) => Ok(ScriptValue::Time(-number)),
            other => Err(other.unexpected("number")),
        }
    }

    /// Literal equality with the interpreter's type rules. Incompatible kinds
    /// are an error rather than `false`.
    pub fn equals(&self, other: &ScriptValue) -> ScriptResult<bool> {
        let lhs = self.literal();
        let rhs = other.literal();
        let equal = match (&lhs, &rhs) {
            (ScriptValue::Empty, ScriptValue::Empty) => true,
            (ScriptValue::Bool(a), ScriptValue::Bool(b)) => a == b,
            (ScriptValue::String(a), ScriptValue::String(b)) => a == b,
            (ScriptValue::AssetId(a), ScriptValue::AssetId(b)) => a == b,
            (ScriptValue::AssetId(a), ScriptValue::Int(b))
            | (ScriptValue::Int(b), ScriptValue::AssetId(a)) => *a as i64 == *b,
            (ScriptValue::FunctionId(a), ScriptValue::FunctionId(b)) => a == b,
            (ScriptValue::MethodId(a), ScriptValue::MethodId(b)) => a == b,
            (ScriptValue::Collection(a), ScriptValue::Collection(b)) => {
                if Rc::ptr_eq(a, b) {
                    true
                } else {
                    a.borrow().literal_eq(&b.borrow())?
                }
            }
            _ => match (lhs.numeric(), rhs.numeric()) {
                (Some(Numeric::Int(a)), Some(Numeric::Int(b))) => a == b,
                (Some(_), Some(_)) => lhs.as_float()? == rhs.as_float()?,
                _ => return Err(Self::mismatch("==", &lhs, &rhs)),
            },
        };
        Ok(equal)
    }

    pub fn compare(&self, other: &ScriptValue, op: &'static str) -> ScriptResult<Ordering> {
        let lhs = self.literal();
        let rhs = other.literal();
        let ordering = match (&lhs, &rhs) {
            (ScriptValue::String(a), ScriptValue::String(b)) => a.cmp(b),
            (ScriptValue::AssetId(a), ScriptValue::AssetId(b)) => a.cmp(b),
            (ScriptValue::AssetId(a), ScriptValue::Int(b)) => (*a as i64).cmp(b),
            (ScriptValue::Int(a), ScriptValue::AssetId(b)) => a.cmp(&(*b as i64)),
            _ => match (lhs.numeric(), rhs.numeric()) {
                (Some(Numeric::Int(a)), Some(Numeric::Int(b))) => a.cmp(&b),
                (Some(_), Some(_)) => lhs
                    .as_float()?
                    .partial_cmp(&rhs.as_float()?)
                    .unwrap_or(Ordering::Equal),
                _ => return Err(Self::mismatch(op, &lhs, &rhs)),
            },
        };
        Ok(ordering)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        ScriptValue::Int(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Float(value)
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Empty => f.write_str("<empty>"),
            ScriptValue::Bool(flag) => write!(f, "{flag}"),
            ScriptValue::Int(number) => write!(f, "{number}"),
            ScriptValue::ParamToken(token) => write!(f, "token:{token}"),
            ScriptValue::Float(number) => write!(f, "{number}"),
            ScriptValue::Time(number) => write!(f, "{number}s"),
            ScriptValue::String(text) => f.write_str(text),
            ScriptValue::AssetId(id) => write!(f, "asset:{id}"),
            ScriptValue::FunctionId(id) => write!(f, "function:{id}"),
            ScriptValue::MethodId(id) => write!(f, "method:{id}"),
            ScriptValue::Collection(list) => {
                f.write_str("[")?;
                for (index, item) in list.borrow().iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ScriptValue::Reference(variable) => write!(f, "{}", variable.borrow().value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::variable::Variable;

    #[test]
    fn integer_arithmetic_stays_integer() {
        let a = ScriptValue::Int(7);
        let b = ScriptValue::Int(3);
        let sum = a.add(&b).unwrap();
        assert!(matches!(sum, ScriptValue::Int(10)));
        let back = sum.sub(&b).unwrap();
        assert!(back.equals(&a).unwrap());
        assert!(matches!(a.div(&b).unwrap(), ScriptValue::Int(2)));
        assert!(matches!(a.rem(&b).unwrap(), ScriptValue::Int(1)));
    }

    #[test]
    fn float_or_time_operand_promotes() {
        let sum = ScriptValue::Int(1).add(&ScriptValue::Time(0.5)).unwrap();
        assert!(matches!(sum, ScriptValue::Float(value) if value == 1.5));
        let product = ScriptValue::Float(2.0).mul(&ScriptValue::ParamToken(3)).unwrap();
        assert!(matches!(product, ScriptValue::Float(value) if value == 6.0));
    }

    #[test]
    fn string_and_asset_arithmetic_is_fatal() {
        let err = ScriptValue::string("a")
            .add(&ScriptValue::AssetId(4))
            .unwrap_err();
        assert!(matches!(
            err,
            ScriptError::TypeMismatch {
                op: "+",
                lhs: ValueKind::String,
                rhs: ValueKind::AssetId
            }
        ));
    }

    #[test]
    fn integer_division_by_zero_is_fatal() {
        let err = ScriptValue::Int(1).div(&ScriptValue::Int(0)).unwrap_err();
        assert!(matches!(err, ScriptError::DivisionByZero { .. }));
        let quotient = ScriptValue::Float(1.0).div(&ScriptValue::Int(0)).unwrap();
        assert!(matches!(quotient, ScriptValue::Float(value) if value.is_infinite()));
    }

    #[test]
    fn asset_ids_compare_with_integer_sentinel() {
        assert!(ScriptValue::AssetId(0).equals(&ScriptValue::Int(0)).unwrap());
        assert!(!ScriptValue::AssetId(5).equals(&ScriptValue::AssetId(6)).unwrap());
        assert!(ScriptValue::string("x").equals(&ScriptValue::Int(0)).is_err());
    }

    #[test]
    fn references_resolve_to_stored_value() {
        let variable = Variable::shared(1, ScriptValue::Int(41));
        let reference = ScriptValue::Reference(variable.clone());
        assert_eq!(reference.literal_kind(), ValueKind::Int);
        let next = reference.add(&ScriptValue::Int(1)).unwrap();
        variable.borrow_mut().put_value(&next);
        assert!(reference.equals(&ScriptValue::Int(42)).unwrap());
    }

    #[test]
    fn ordering_promotes_numbers() {
        let ordering = ScriptValue::Int(2)
            .compare(&ScriptValue::Float(2.5), "<")
            .unwrap();
        assert_eq!(ordering, Ordering::Less);
        assert!(ScriptValue::Bool(true)
            .compare(&ScriptValue::Bool(false), "<")
            .is_err());
    }
}
