use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use super::EngineContext;
use crate::script::{
    required_arg, BuiltInMethod, Collection, ScriptError, ScriptResult, ScriptValue,
    DOCUMENT_ACTOR_ID,
};

impl EngineContext {
    /// Routes a method call by the literal kind of its receiver: the
    /// document, a registered actor, or a collection.
    pub fn call_method(
        &mut self,
        target: &ScriptValue,
        method_id: u32,
        args: &[ScriptValue],
    ) -> ScriptResult<ScriptValue> {
        let method =
            BuiltInMethod::from_raw(method_id).ok_or(ScriptError::UnknownMethod(method_id))?;
        match target.literal() {
            ScriptValue::AssetId(DOCUMENT_ACTOR_ID) => self.call_document_method(method, args),
            ScriptValue::AssetId(id) => {
                debug!("actor {id}: {method} with {} args", args.len());
                self.with_actor(id, |actor, cx| actor.call_method(method, args, cx))?
            }
            ScriptValue::Collection(list) => self.call_collection_method(&list, method, args),
            other => Err(ScriptError::UnexpectedValue {
                expected: "method receiver",
                found: other.kind(),
            }),
        }
    }

    fn call_collection_method(
        &mut self,
        list: &Rc<RefCell<Collection>>,
        method: BuiltInMethod,
        args: &[ScriptValue],
    ) -> ScriptResult<ScriptValue> {
        let name = method.as_str();
        let result = match method {
            BuiltInMethod::Append => {
                let mut list = list.borrow_mut();
                for value in args {
                    list.append(value.clone());
                }
                ScriptValue::Empty
            }
            BuiltInMethod::PrependList => {
                // Snapshot first: a list may be prepended to itself.
                let other = required_arg(args, 0, name)?.as_collection()?;
                let values = other.borrow().snapshot();
                list.borrow_mut().prepend_all(values);
                ScriptValue::Empty
            }
            BuiltInMethod::InsertAt => {
                let value = required_arg(args, 0, name)?.clone();
                let index = required_arg(args, 1, name)?.as_int()?;
                list.borrow_mut().insert_at(index, value);
                ScriptValue::Empty
            }
            BuiltInMethod::ReplaceAt => {
                let value = required_arg(args, 0, name)?.clone();
                let index = required_arg(args, 1, name)?.as_int()?;
                list.borrow_mut().replace_at(index, value);
                ScriptValue::Empty
            }
            BuiltInMethod::DeleteAt => {
                let index = required_arg(args, 0, name)?.as_int()?;
                list.borrow_mut().delete_at(index)
            }
            BuiltInMethod::GetAt => {
                let index = required_arg(args, 0, name)?.as_int()?;
                list.borrow().get_at(index)
            }
            BuiltInMethod::DeleteFirst => list.borrow_mut().delete_first(),
            BuiltInMethod::DeleteLast => list.borrow_mut().delete_last(),
            BuiltInMethod::Count => ScriptValue::Int(list.borrow().len() as i64),
            BuiltInMethod::IsEmpty => ScriptValue::Bool(list.borrow().is_empty()),
            BuiltInMethod::Empty => {
                list.borrow_mut().clear();
                ScriptValue::Empty
            }
            BuiltInMethod::Seek => {
                let needle = required_arg(args, 0, name)?;
                ScriptValue::Int(list.borrow().seek(needle))
            }
            BuiltInMethod::Jumble => {
                list.borrow_mut().jumble(self.rng_mut());
                ScriptValue::Empty
            }
            BuiltInMethod::Sort => {
                list.borrow_mut().sort()?;
                ScriptValue::Empty
            }
            BuiltInMethod::Apply => {
                let function = required_arg(args, 0, name)?.as_function_id()?;
                let items = list.borrow().snapshot();
                for item in items {
                    let mut call_args = Vec::with_capacity(args.len());
                    call_args.push(item);
                    call_args.extend_from_slice(&args[1..]);
                    self.call_function(function, &call_args)?;
                }
                ScriptValue::Empty
            }
            BuiltInMethod::Send => {
                let forwarded = required_arg(args, 0, name)?.as_method_id()?;
                let items = list.borrow().snapshot();
                for item in items {
                    self.call_method(&item, forwarded, &args[1..])?;
                }
                ScriptValue::Empty
            }
            _ => {
                return Err(ScriptError::UnsupportedMethod {
                    target: "collection".to_string(),
                    method,
                })
            }
        };
        Ok(result)
    }
}
