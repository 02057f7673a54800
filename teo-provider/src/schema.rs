//! Attribute schemas for resources and data sources.
//!
//! A [`Schema`] declares every attribute a resource accepts or exports. The
//! provider uses it to validate configurations before any API call and to
//! normalise set-typed values; the host receives it serialized as metadata.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::hash::scalar_hash;

/// Element hash for set-typed attributes.
pub type SetHashFn = fn(&Value) -> i64;

/// Value type of an attribute.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    String,
    Int,
    Bool,
    StringList,
    StringSet,
    StringMap,
    /// Ordered list of nested blocks.
    BlockList(Schema),
    /// Unordered set of nested blocks, identified by element hash.
    BlockSet(Schema),
}

/// Value constraints checked during validation.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    /// String must be one of the listed values.
    AllowedValues(&'static [&'static str]),
    /// Integer must lie in the inclusive range.
    IntBetween(i64, i64),
    /// String must not be empty.
    NotEmpty,
}

impl Validator {
    fn check(self, path: &str, value: &Value) -> Option<String> {
        match self {
            Self::AllowedValues(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => None,
                Some(s) => Some(format!(
                    "{path}: expected one of [{}], got \"{s}\"",
                    allowed.join(", ")
                )),
                None => None,
            },
            Self::IntBetween(min, max) => match value.as_i64() {
                Some(n) if (min..=max).contains(&n) => None,
                Some(n) => Some(format!("{path}: expected to be in range {min}-{max}, got {n}")),
                None => None,
            },
            Self::NotEmpty => match value.as_str() {
                Some(s) if s.trim().is_empty() => Some(format!("{path}: must not be empty")),
                _ => None,
            },
        }
    }
}

/// One attribute declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttrType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<Validator>,
    #[serde(skip)]
    pub set_hash: Option<SetHashFn>,
}

impl Attribute {
    pub fn new(kind: AttrType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            max_items: None,
            description: "",
            validator: None,
            set_hash: None,
        }
    }

    pub fn string() -> Self {
        Self::new(AttrType::String)
    }

    pub fn int() -> Self {
        Self::new(AttrType::Int)
    }

    pub fn bool() -> Self {
        Self::new(AttrType::Bool)
    }

    pub fn string_list() -> Self {
        Self::new(AttrType::StringList)
    }

    pub fn string_set() -> Self {
        Self::new(AttrType::StringSet)
    }

    pub fn string_map() -> Self {
        Self::new(AttrType::StringMap)
    }

    pub fn block_list(schema: Schema) -> Self {
        Self::new(AttrType::BlockList(schema))
    }

    pub fn block_set(schema: Schema, hash: SetHashFn) -> Self {
        let mut attr = Self::new(AttrType::BlockSet(schema));
        attr.set_hash = Some(hash);
        attr
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Computed-only attributes are never set from configuration.
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }
}

/// Attribute declarations keyed by name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    pub attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attr(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Names of attributes whose change forces replacement.
    pub fn force_new_attributes(&self) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.force_new)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Validate a configuration, returning one diagnostic per problem.
    pub fn validate(&self, config: &Map<String, Value>) -> Vec<String> {
        let mut diagnostics = Vec::new();
        self.validate_into("", config, &mut diagnostics);
        diagnostics
    }

    fn validate_into(&self, prefix: &str, config: &Map<String, Value>, out: &mut Vec<String>) {
        for key in config.keys() {
            if key != "id" && !self.attributes.contains_key(key.as_str()) {
                out.push(format!("{prefix}{key}: unsupported argument"));
            }
        }

        for (name, attr) in &self.attributes {
            let path = format!("{prefix}{name}");
            match config.get(*name) {
                None | Some(Value::Null) => {
                    if attr.required {
                        out.push(format!("{path}: required attribute is missing"));
                    }
                }
                Some(value) => attr.validate_value(&path, value, out),
            }
        }
    }

    /// Sort and de-duplicate every set-typed value (recursively) in place.
    pub fn normalize(&self, attrs: &mut Map<String, Value>) {
        for (name, attr) in &self.attributes {
            if let Some(value) = attrs.get_mut(*name) {
                attr.normalize_value(value);
            }
        }
    }
}

impl Attribute {
    fn validate_value(&self, path: &str, value: &Value, out: &mut Vec<String>) {
        let type_ok = match &self.kind {
            AttrType::String => value.is_string(),
            AttrType::Int => value.is_i64() || value.is_u64(),
            AttrType::Bool => value.is_boolean(),
            AttrType::StringList | AttrType::StringSet => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            AttrType::StringMap => value
                .as_object()
                .is_some_and(|m| m.values().all(Value::is_string)),
            AttrType::BlockList(_) | AttrType::BlockSet(_) => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        };
        if !type_ok {
            out.push(format!("{path}: expected {}", self.kind.describe()));
            return;
        }

        if let (Some(max), Some(items)) = (self.max_items, value.as_array()) {
            if items.len() > max {
                out.push(format!(
                    "{path}: attribute supports {max} item(s) maximum, config has {}",
                    items.len()
                ));
            }
        }

        if let Some(validator) = self.validator {
            if let Some(msg) = validator.check(path, value) {
                out.push(msg);
            }
        }

        if let AttrType::BlockList(schema) | AttrType::BlockSet(schema) = &self.kind {
            if let Some(items) = value.as_array() {
                for (i, item) in items.iter().enumerate() {
                    if let Some(obj) = item.as_object() {
                        schema.validate_into(&format!("{path}.{i}."), obj, out);
                    }
                }
            }
        }
    }

    fn normalize_value(&self, value: &mut Value) {
        match &self.kind {
            AttrType::StringSet => {
                if let Some(items) = value.as_array_mut() {
                    sort_by_hash(items, scalar_hash);
                }
            }
            AttrType::BlockSet(schema) => {
                if let Some(items) = value.as_array_mut() {
                    normalize_blocks(schema, items);
                    sort_by_hash(items, self.set_hash.unwrap_or(scalar_hash));
                }
            }
            AttrType::BlockList(schema) => {
                if let Some(items) = value.as_array_mut() {
                    normalize_blocks(schema, items);
                }
            }
            _ => {}
        }
    }
}

impl AttrType {
    fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Int => "an integer",
            Self::Bool => "a boolean",
            Self::StringList | Self::StringSet => "a list of strings",
            Self::StringMap => "a map of strings",
            Self::BlockList(_) | Self::BlockSet(_) => "a list of blocks",
        }
    }
}

/// Unset nested attributes are absent, never `null`.
fn normalize_blocks(schema: &Schema, items: &mut [Value]) {
    for item in items {
        if let Some(obj) = item.as_object_mut() {
            obj.retain(|_, v| !v.is_null());
            schema.normalize(obj);
        }
    }
}

/// Order by element hash; only identical elements collapse, so a hash
/// collision between different elements keeps both.
fn sort_by_hash(items: &mut Vec<Value>, hash: SetHashFn) {
    let mut keyed: Vec<(i64, String, Value)> = items
        .drain(..)
        .map(|v| (hash(&v), v.to_string(), v))
        .collect();
    keyed.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    keyed.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);
    items.extend(keyed.into_iter().map(|(_, _, v)| v));
}
