//! Structured field values and their schema description.
//!
//! A complex value does not get inspected at runtime to find its fields.
//! Instead every complex type declares its leaf paths to a [`SchemaPaths`]
//! visitor, which owns the traversal depth limit.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

/// Default number of object levels a schema description may descend into.
pub const DEFAULT_SCHEMA_DEPTH: usize = 7;

/// A structured field value that can describe its own schema.
pub trait ComplexValue: fmt::Debug + Send + Sync {
    /// Serialized form written to the store.
    fn to_json(&self) -> Value;

    /// Declare the leaf paths of this value.
    ///
    /// Implementations call [`SchemaPaths::leaf`] for every dynamically typed
    /// leaf and [`SchemaPaths::nested`] for nested complex members. Members
    /// with a fixed primitive or string type are usually left out.
    fn describe(&self, schema: &mut SchemaPaths);
}

/// Collects dotted leaf paths while enforcing a maximum nesting depth.
#[derive(Debug)]
pub struct SchemaPaths {
    max_depth: usize,
    prefix: Vec<String>,
    paths: BTreeSet<String>,
}

impl SchemaPaths {
    /// Create an empty visitor that descends at most `max_depth` object levels.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            prefix: Vec::new(),
            paths: BTreeSet::new(),
        }
    }

    /// Collect the leaf paths of `value`, sorted and without duplicates.
    pub fn collect(value: &dyn ComplexValue, max_depth: usize) -> Vec<String> {
        let mut schema = Self::new(max_depth);
        if max_depth > 0 {
            value.describe(&mut schema);
        }
        schema.into_paths()
    }

    /// Current nesting level; the described root is level 0.
    pub fn depth(&self) -> usize {
        self.prefix.len()
    }

    /// Declare a leaf member named `name` at the current level.
    pub fn leaf(&mut self, name: &str) {
        let path = self.path_to(name);
        self.paths.insert(path);
    }

    /// Declare a nested complex member. Its leaves are reported under `name`.
    pub fn nested(&mut self, name: &str, value: &dyn ComplexValue) {
        self.scope(name, |schema| value.describe(schema));
    }

    /// Declare a collection member. Every element contributes paths under the
    /// same `name`, without any element index.
    pub fn nested_each<'a, I>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = &'a dyn ComplexValue>,
    {
        self.scope(name, |schema| {
            for value in values {
                value.describe(schema);
            }
        });
    }

    /// Run `describe` one level below the current path. Silently does nothing
    /// once the depth limit is reached.
    pub fn scope(&mut self, name: &str, describe: impl FnOnce(&mut Self)) {
        if self.prefix.len() + 1 >= self.max_depth {
            return;
        }
        self.prefix.push(name.to_string());
        describe(self);
        self.prefix.pop();
    }

    /// Consume the visitor and return the collected paths in sorted order.
    pub fn into_paths(self) -> Vec<String> {
        self.paths.into_iter().collect()
    }

    fn path_to(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.prefix.join("."), name)
        }
    }
}

impl<T: ComplexValue> ComplexValue for Vec<T> {
    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(ComplexValue::to_json).collect())
    }

    fn describe(&self, schema: &mut SchemaPaths) {
        for item in self {
            item.describe(schema);
        }
    }
}

/// A complex value backed by a plain JSON tree.
///
/// Objects become nested levels, arrays of objects are walked element by
/// element, and every scalar (or array of scalars) is a leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonComplex(pub Value);

impl JsonComplex {
    fn describe_value(value: &Value, schema: &mut SchemaPaths) {
        match value {
            Value::Object(members) => {
                for (name, member) in members {
                    Self::describe_member(name, member, schema);
                }
            }
            Value::Array(items) => {
                for item in items {
                    Self::describe_value(item, schema);
                }
            }
            _ => {}
        }
    }

    fn describe_member(name: &str, member: &Value, schema: &mut SchemaPaths) {
        match member {
            Value::Object(_) => schema.scope(name, |s| Self::describe_value(member, s)),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                schema.scope(name, |s| Self::describe_value(member, s))
            }
            _ => schema.leaf(name),
        }
    }
}

impl ComplexValue for JsonComplex {
    fn to_json(&self) -> Value {
        self.0.clone()
    }

    fn describe(&self, schema: &mut SchemaPaths) {
        Self::describe_value(&self.0, schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct PropertyValue;

    impl ComplexValue for PropertyValue {
        fn to_json(&self) -> Value {
            json!({ "value": 1, "valueType": "Number" })
        }

        fn describe(&self, schema: &mut SchemaPaths) {
            schema.leaf("value");
        }
    }

    #[derive(Debug)]
    struct Property {
        values: Vec<PropertyValue>,
        single: PropertyValue,
    }

    impl ComplexValue for Property {
        fn to_json(&self) -> Value {
            json!({})
        }

        fn describe(&self, schema: &mut SchemaPaths) {
            schema.leaf("value");
            schema.nested("valueInProperty", &self.single);
            schema.nested_each("array", self.values.iter().map(|v| v as &dyn ComplexValue));
        }
    }

    #[derive(Debug)]
    struct Recursive(usize);

    impl ComplexValue for Recursive {
        fn to_json(&self) -> Value {
            json!({})
        }

        fn describe(&self, schema: &mut SchemaPaths) {
            schema.leaf("leaf");
            schema.nested("child", &Recursive(self.0 + 1));
        }
    }

    #[test]
    fn test_collect_nested_paths() {
        let property = Property {
            values: vec![PropertyValue, PropertyValue],
            single: PropertyValue,
        };
        let outer = vec![property];

        let mut schema = SchemaPaths::new(DEFAULT_SCHEMA_DEPTH);
        schema.nested("testProperties", &outer);
        let paths = schema.into_paths();

        assert_eq!(
            paths,
            vec![
                "testProperties.array.value",
                "testProperties.value",
                "testProperties.valueInProperty.value",
            ]
        );
    }

    #[test]
    fn test_depth_limit_stops_unbounded_descriptions() {
        let paths = SchemaPaths::collect(&Recursive(0), 3);

        assert_eq!(paths, vec!["child.child.leaf", "child.leaf", "leaf"]);
    }

    #[test]
    fn test_zero_depth_collects_nothing() {
        assert!(SchemaPaths::collect(&Recursive(0), 0).is_empty());
    }

    #[test]
    fn test_json_complex_paths() {
        let value = JsonComplex(json!({
            "id": "abc",
            "value": { "amount": 10, "currency": "USD" },
            "tags": ["a", "b"],
            "prices": [{ "list": 1 }, { "sale": 2 }]
        }));

        let paths = SchemaPaths::collect(&value, DEFAULT_SCHEMA_DEPTH);

        assert_eq!(
            paths,
            vec![
                "id",
                "prices.list",
                "prices.sale",
                "tags",
                "value.amount",
                "value.currency"
            ]
        );
    }
}
