//! Pass-through layout options.
//!
//! Trellis never interprets the option bag itself; it only merges the bag
//! from configuration with the document's own `layoutOptions` and hands the
//! result to the engine. Keys set in the document take precedence.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use trellis_core::{GraphDocument, JsonObject};

const ELK_PREFIX: &str = "elk.";

/// An opaque bag of engine options, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutOptions(JsonObject);

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option, replacing any previous value for the key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Looks up an option by name, accepting the key with or without the
    /// `elk.` prefix.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(key) {
            return Some(value);
        }
        match key.strip_prefix(ELK_PREFIX) {
            Some(bare) => self.0.get(bare),
            None => self.0.get(&format!("{ELK_PREFIX}{key}")),
        }
    }

    /// Looks up a numeric option. Numbers given as strings are accepted.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Looks up a string option.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Returns the options an engine should see for `doc`: this bag,
    /// overridden by the document's root `layoutOptions`.
    pub fn resolve(&self, doc: &GraphDocument) -> LayoutOptions {
        let mut resolved = self.clone();
        if let Some(own) = doc.layout_options() {
            for (key, value) in own {
                resolved.0.insert(key.clone(), value.clone());
            }
        }
        resolved
    }

    /// Copies every option into `target` whose key `target` does not set yet.
    pub fn fill_missing(&self, target: &mut JsonObject) {
        for (key, value) in &self.0 {
            if !target.contains_key(key) {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

impl From<JsonObject> for LayoutOptions {
    fn from(map: JsonObject) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::Node;

    use super::*;

    #[test]
    fn test_get_accepts_prefixed_and_bare_keys() {
        let options = LayoutOptions::new()
            .with("elk.direction", "RIGHT")
            .with("spacing.nodeNode", 25);

        assert_eq!(options.get_str("direction"), Some("RIGHT"));
        assert_eq!(options.get_str("elk.direction"), Some("RIGHT"));
        assert_eq!(options.get_f64("elk.spacing.nodeNode"), Some(25.0));
        assert_eq!(options.get("missing"), None);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let options = LayoutOptions::new().with("elk.padding", " 12.5 ");
        assert_eq!(options.get_f64("padding"), Some(12.5));
    }

    #[test]
    fn test_document_options_take_precedence() {
        let mut own = JsonObject::new();
        own.insert("elk.direction".to_string(), Value::from("LEFT"));
        let doc = GraphDocument::new(vec![Node::new("a")], Vec::new()).with_layout_options(own);

        let bag = LayoutOptions::new()
            .with("elk.direction", "DOWN")
            .with("elk.algorithm", "layered");
        let resolved = bag.resolve(&doc);

        assert_eq!(resolved.get_str("direction"), Some("LEFT"));
        assert_eq!(resolved.get_str("algorithm"), Some("layered"));
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_fill_missing_keeps_existing_keys() {
        let mut target = JsonObject::new();
        target.insert("a".to_string(), Value::from(1));

        LayoutOptions::new()
            .with("a", 2)
            .with("b", 3)
            .fill_missing(&mut target);

        assert_eq!(target["a"], Value::from(1));
        assert_eq!(target["b"], Value::from(3));
    }
}
