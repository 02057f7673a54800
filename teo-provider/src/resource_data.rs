//! Attribute bag of one resource instance.

use serde_json::{Map, Value};

use crate::error::{ProviderError, Result};
use crate::hash::scalar_hash;
use crate::schema::{AttrType, Attribute, Schema};

/// Separator of composite resource IDs.
pub const ID_SEPARATOR: &str = "#";

/// The state of a single resource instance as seen by one handler call.
///
/// `attrs` is the desired view (configuration merged over prior state) and is
/// what handlers read and write; `prior` is the last stored state and only
/// backs [`has_change`](Self::has_change).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: String,
    attrs: Map<String, Value>,
    prior: Map<String, Value>,
}

impl ResourceData {
    /// Instance about to be created from `config`.
    pub fn from_config(schema: &Schema, mut config: Map<String, Value>) -> Self {
        schema.normalize(&mut config);
        Self {
            id: String::new(),
            attrs: config,
            prior: Map::new(),
        }
    }

    /// Instance with stored `state` and nothing planned (read, delete).
    pub fn from_state(schema: &Schema, id: impl Into<String>, mut state: Map<String, Value>) -> Self {
        schema.normalize(&mut state);
        state.remove("id");
        Self {
            id: id.into(),
            attrs: state.clone(),
            prior: state,
        }
    }

    /// Instance being updated from `prior` state to `config`.
    ///
    /// Computed values absent from `config` are carried over from `prior`,
    /// including those inside nested blocks: list blocks pair by position,
    /// set blocks by element hash.
    pub fn for_update(
        schema: &Schema,
        id: impl Into<String>,
        mut prior: Map<String, Value>,
        mut config: Map<String, Value>,
    ) -> Self {
        schema.normalize(&mut prior);
        schema.normalize(&mut config);
        prior.remove("id");

        carry_computed(schema, &prior, &mut config);
        schema.normalize(&mut config);

        Self {
            id: id.into(),
            attrs: config,
            prior,
        }
    }

    /// Bare instance carrying only an ID (import).
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// An empty ID marks the instance as gone.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Split the ID into exactly `parts` components.
    pub fn id_parts(&self, parts: usize) -> Result<Vec<&str>> {
        split_id(&self.id, parts)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key).filter(|v| !v.is_null())
    }

    /// Value of `key` when it is set to something other than its zero value.
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| !is_zero(v))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Non-empty string value.
    pub fn get_ok_str(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_list(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        string_list(self.get_list(key))
    }

    /// First element of a nested block list (`max_items = 1` blocks).
    pub fn head_map(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get_list(key).first().and_then(Value::as_object)
    }

    pub fn prior(&self, key: &str) -> Option<&Value> {
        self.prior.get(key).filter(|v| !v.is_null())
    }

    pub fn has_change(&self, key: &str) -> bool {
        self.prior(key) != self.get(key)
    }

    pub fn has_changes(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.has_change(k))
    }

    /// Prior and new value of `key`.
    pub fn change(&self, key: &str) -> (Option<&Value>, Option<&Value>) {
        (self.prior(key), self.get(key))
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    /// Set `key` only when the remote side returned a value.
    pub fn set_opt<T: Into<Value>>(&mut self, key: &str, value: Option<T>) {
        if let Some(v) = value {
            self.set(key, v);
        }
    }

    /// Fail when any of `keys` changed.
    pub fn ensure_unchanged(&self, resource: &str, keys: &[&str]) -> Result<()> {
        match keys.iter().find(|k| self.has_change(k)) {
            Some(key) => Err(ProviderError::ImmutableArgument {
                resource: resource.to_string(),
                argument: (*key).to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// Final state to hand back to the host, `None` when the instance is gone.
    pub fn into_state(self, schema: &Schema) -> Option<Map<String, Value>> {
        if self.id.is_empty() {
            return None;
        }
        let mut attrs = self.attrs;
        schema.normalize(&mut attrs);
        attrs.insert("id".to_string(), Value::String(self.id));
        Some(attrs)
    }
}

fn carry_computed(schema: &Schema, prior: &Map<String, Value>, config: &mut Map<String, Value>) {
    for (name, attr) in &schema.attributes {
        let Some(old) = prior.get(*name).filter(|v| !v.is_null()) else {
            continue;
        };
        if config.get(*name).is_some_and(|v| !v.is_null()) {
            if let Some(new) = config.get_mut(*name) {
                carry_nested(attr, old, new);
            }
        } else if attr.computed {
            config.insert((*name).to_string(), old.clone());
        }
    }
}

fn carry_nested(attr: &Attribute, old: &Value, new: &mut Value) {
    let (Some(old_items), Some(new_items)) = (old.as_array(), new.as_array_mut()) else {
        return;
    };
    match &attr.kind {
        AttrType::BlockList(schema) => {
            for (o, n) in old_items.iter().zip(new_items.iter_mut()) {
                if let (Some(o), Some(n)) = (o.as_object(), n.as_object_mut()) {
                    carry_computed(schema, o, n);
                }
            }
        }
        AttrType::BlockSet(schema) => {
            let hash = attr.set_hash.unwrap_or(scalar_hash);
            for n in new_items.iter_mut() {
                let matched = {
                    let current: &Value = n;
                    let h = hash(current);
                    // 哈希可能覆盖服务端默认值，退而匹配配置中已写出的字段
                    old_items
                        .iter()
                        .find(|o| hash(o) == h)
                        .or_else(|| old_items.iter().find(|o| agrees_with(o, current)))
                        .and_then(Value::as_object)
                };
                if let (Some(o), Some(n)) = (matched, n.as_object_mut()) {
                    carry_computed(schema, o, n);
                }
            }
        }
        _ => {}
    }
}

/// Every attribute set in `config` has the same value in `stored`.
fn agrees_with(stored: &Value, config: &Value) -> bool {
    match (stored.as_object(), config.as_object()) {
        (Some(stored), Some(config)) => config
            .iter()
            .filter(|(_, v)| !v.is_null())
            .all(|(k, v)| stored.get(k) == Some(v)),
        _ => false,
    }
}

/// Join composite ID parts with [`ID_SEPARATOR`].
pub fn build_id(parts: &[&str]) -> String {
    parts.join(ID_SEPARATOR)
}

/// Split a composite ID, requiring exactly `parts` non-empty components.
pub fn split_id(id: &str, parts: usize) -> Result<Vec<&str>> {
    let items: Vec<&str> = id.split(ID_SEPARATOR).collect();
    if items.len() != parts || items.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::BrokenId { id: id.to_string() });
    }
    Ok(items)
}

pub(crate) fn string_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
