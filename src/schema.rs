//! Canonical record layout: named schemas with fields sorted by name, a
//! reusable declaration-order → physical-order mapping, and the dynamically
//! typed records the ordered build stores.

use anyhow::{bail, Result};
use std::sync::Arc;

/// Physical type of a field's present value. Optionality is a property of
/// the value (`Value::Nothing`), not of the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Bool,
    Str,
    Records,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// A named record type with canonical (name-sorted) field layout. Two
/// schemas declared from the same field set compare equal no matter the
/// declaration order; the reorder permutation is computed once and reused
/// for every instance.
#[derive(Debug)]
pub struct Schema {
    name: String,
    fields: Vec<Field>, // canonical order
    perm: Vec<usize>,   // canonical index -> declaration index
}

impl Schema {
    pub fn define(name: &str, declared: &[(&str, FieldKind)]) -> Arc<Schema> {
        let mut perm: Vec<usize> = (0..declared.len()).collect();
        perm.sort_by(|&a, &b| declared[a].0.cmp(declared[b].0));
        let fields = perm
            .iter()
            .map(|&from| Field { name: declared[from].0.to_string(), kind: declared[from].1 })
            .collect();
        Arc::new(Schema { name: name.to_string(), fields, perm })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in canonical (physical) order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.binary_search_by(|f| f.name.as_str().cmp(name)).ok()
    }

    /// Build an instance from values given in declaration order. O(arity);
    /// the value count must match the field count exactly.
    pub fn instantiate(self: &Arc<Self>, values: Vec<Value>) -> Result<Record> {
        if values.len() != self.fields.len() {
            bail!(
                "record {}: {} values for {} fields",
                self.name,
                values.len(),
                self.fields.len()
            );
        }
        let mut slots: Vec<Option<Value>> = values.into_iter().map(Some).collect();
        let values = self
            .perm
            .iter()
            .map(|&from| slots[from].take().expect("permutation visits each slot once"))
            .collect();
        Ok(Record { schema: Arc::clone(self), values })
    }
}

impl PartialEq for Schema {
    // Layout equality: same name, same canonical fields. The permutation is
    // a construction detail.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}
impl Eq for Schema {}

/// A field value, or the distinguished absent marker.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nothing,
    Int(i64),
    Bool(bool),
    Str(String),
    Records(Vec<Record>),
}

impl Value {
    pub fn opt_int(v: Option<i64>) -> Value {
        v.map(Value::Int).unwrap_or(Value::Nothing)
    }
    pub fn opt_bool(v: Option<bool>) -> Value {
        v.map(Value::Bool).unwrap_or(Value::Nothing)
    }
    pub fn opt_str(v: Option<&str>) -> Value {
        v.map(|s| Value::Str(s.to_string())).unwrap_or(Value::Nothing)
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(v) = self { Some(*v) } else { None }
    }
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(v) = self { Some(*v) } else { None }
    }
    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(v) = self { Some(v) } else { None }
    }
    pub fn as_records(&self) -> Option<&[Record]> {
        if let Value::Records(v) = self { Some(v) } else { None }
    }
}

/// A constructed instance: schema handle (the type tag) plus values in
/// canonical order.
#[derive(Clone, Debug)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Record {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema.field_index(field).map(|i| &self.values[i])
    }

    /// Values in canonical order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Render with canonical field order; absent optionals become JSON null.
    /// serde_json's default map keeps keys sorted, which matches the
    /// canonical layout exactly.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            map.insert(field.name.clone(), value_to_json(value));
        }
        serde_json::Value::Object(map)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Nothing => serde_json::Value::Null,
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Records(rs) => serde_json::Value::Array(rs.iter().map(Record::to_json).collect()),
    }
}
