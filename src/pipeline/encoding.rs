//! Dense key encoding of raw text or integer values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::schema::Value;

/// A raw value that can be mapped to a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum KeyValue {
    Text(String),
    Int(i64),
}

impl KeyValue {
    /// Only text and integer values are keyable.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(text) => Some(Self::Text(text.clone())),
            Value::Int(value) => Some(Self::Int(*value)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::Text(text.clone()),
            Self::Int(value) => Value::Int(*value),
        }
    }
}

/// Learned value-to-key mapping.
///
/// Keys `1..=len` follow order of first appearance in the training data; key
/// `0` is reserved for values never seen during fitting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<KeyValue>", into = "Vec<KeyValue>")]
pub struct KeyVocabulary {
    values: Vec<KeyValue>,
    index: HashMap<KeyValue, u32>,
}

impl KeyVocabulary {
    /// Fit a vocabulary from raw values, skipping values that are not keyable.
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut vocabulary = Self::default();
        for value in values {
            if let Some(key_value) = KeyValue::from_value(value) {
                vocabulary.push(key_value);
            }
        }
        vocabulary
    }

    fn push(&mut self, value: KeyValue) {
        if self.index.contains_key(&value) {
            return;
        }
        self.values.push(value.clone());
        self.index.insert(value, self.values.len() as u32);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Key for a raw value, `0` when unseen.
    pub fn key_of(&self, value: &Value) -> u32 {
        KeyValue::from_value(value)
            .and_then(|key_value| self.index.get(&key_value).copied())
            .unwrap_or(0)
    }

    /// Raw value for a key, `None` for the missing key or an unknown key.
    pub fn value_of(&self, key: u32) -> Option<&KeyValue> {
        let idx = (key as usize).checked_sub(1)?;
        self.values.get(idx)
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.values
    }
}

impl From<Vec<KeyValue>> for KeyVocabulary {
    fn from(values: Vec<KeyValue>) -> Self {
        let mut vocabulary = Self::default();
        for value in values {
            vocabulary.push(value);
        }
        vocabulary
    }
}

impl From<KeyVocabulary> for Vec<KeyValue> {
    fn from(vocabulary: KeyVocabulary) -> Self {
        vocabulary.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Value {
        Value::Text(value.to_string())
    }

    #[test]
    fn keys_follow_first_appearance_and_reserve_zero() {
        let values = [text("b"), text("a"), text("b"), text("c")];
        let vocabulary = KeyVocabulary::fit(values.iter());
        assert_eq!(vocabulary.len(), 3);
        assert_eq!(vocabulary.key_of(&text("b")), 1);
        assert_eq!(vocabulary.key_of(&text("a")), 2);
        assert_eq!(vocabulary.key_of(&text("c")), 3);
        assert_eq!(vocabulary.key_of(&text("zzz")), 0);
        assert_eq!(vocabulary.value_of(0), None);
        assert_eq!(vocabulary.value_of(2), Some(&KeyValue::Text("a".into())));
        assert_eq!(vocabulary.value_of(4), None);
    }

    #[test]
    fn integer_and_text_values_do_not_collide() {
        let values = [Value::Int(1), text("1")];
        let vocabulary = KeyVocabulary::fit(values.iter());
        assert_eq!(vocabulary.key_of(&Value::Int(1)), 1);
        assert_eq!(vocabulary.key_of(&text("1")), 2);
        assert_eq!(vocabulary.key_of(&Value::Float(1.0)), 0);
    }

    #[test]
    fn serde_rebuilds_the_index() {
        let values = [Value::Int(26), Value::Int(38)];
        let vocabulary = KeyVocabulary::fit(values.iter());
        let json = serde_json::to_string(&vocabulary).unwrap();
        let restored: KeyVocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.key_of(&Value::Int(38)), 2);
        assert_eq!(restored.values(), vocabulary.values());
    }
}
