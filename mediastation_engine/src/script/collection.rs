use std::cmp::Ordering;

use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;

use super::error::ScriptResult;
use super::value::ScriptValue;

/// Ordered list of script values.
///
/// Indices are zero-based. Out-of-range accesses are title bugs the player
/// tolerates: they log a warning and degrade to `Empty` or a no-op.
#[derive(Debug, Default, Clone)]
pub struct Collection {
    items: Vec<ScriptValue>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(items: Vec<ScriptValue>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScriptValue> {
        self.items.iter()
    }

    /// Copy of the elements, for callers that run script code per element
    /// and must not hold a borrow of the list meanwhile.
    pub fn snapshot(&self) -> Vec<ScriptValue> {
        self.items.clone()
    }

    pub fn append(&mut self, value: ScriptValue) {
        self.items.push(value);
    }

    pub fn prepend_all(&mut self, values: Vec<ScriptValue>) {
        self.items.splice(0..0, values);
    }

    pub fn insert_at(&mut self, index: i64, value: ScriptValue) {
        match usize::try_from(index) {
            Ok(index) if index <= self.items.len() => self.items.insert(index, value),
            _ => warn!(
                "collection insert at {index} outside 0..={}; ignored",
                self.items.len()
            ),
        }
    }

    fn checked_index(&self, index: i64, operation: &str) -> Option<usize> {
        match usize::try_from(index) {
            Ok(index) if index < self.items.len() => Some(index),
            _ => {
                warn!(
                    "collection {operation} at {index} outside 0..{}",
                    self.items.len()
                );
                None
            }
        }
    }

    pub fn get_at(&self, index: i64) -> ScriptValue {
        self.checked_index(index, "get")
            .map(|index| self.items[index].clone())
            .unwrap_or_default()
    }

    pub fn delete_at(&mut self, index: i64) -> ScriptValue {
        self.checked_index(index, "delete")
            .map(|index| self.items.remove(index))
            .unwrap_or_default()
    }

    pub fn replace_at(&mut self, index: i64, value: ScriptValue) {
        if let Some(index) = self.checked_index(index, "replace") {
            self.items[index] = value;
        }
    }

    pub fn delete_first(&mut self) -> ScriptValue {
        if self.items.is_empty() {
            warn!("collection delete_first on empty collection");
            return ScriptValue::Empty;
        }
        self.items.remove(0)
    }

    pub fn delete_last(&mut self) -> ScriptValue {
        self.items.pop().unwrap_or_else(|| {
            warn!("collection delete_last on empty collection");
            ScriptValue::Empty
        })
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Index of the first element literally equal to `needle`, or -1.
    /// Elements of an incomparable kind are skipped.
    pub fn seek(&self, needle: &ScriptValue) -> i64 {
        for (index, item) in self.items.iter().enumerate() {
            match item.equals(needle) {
                Ok(true) => return index as i64,
                Ok(false) => {}
                Err(err) => warn!("collection seek skipped element {index}: {err}"),
            }
        }
        -1
    }

    pub fn jumble<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.items.shuffle(rng);
    }

    /// Ascending sort by literal order. Mixed kinds cannot be ordered and
    /// abort the title.
    pub fn sort(&mut self) -> ScriptResult<()> {
        let mut failure = None;
        self.items.sort_by(|a, b| match a.compare(b, "sort") {
            Ok(ordering) => ordering,
            Err(err) => {
                failure.get_or_insert(err);
                Ordering::Equal
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn literal_eq(&self, other: &Collection) -> ScriptResult<bool> {
        if self.items.len() != other.items.len() {
            return Ok(false);
        }
        for (a, b) in self.items.iter().zip(&other.items) {
            if !a.equals(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
