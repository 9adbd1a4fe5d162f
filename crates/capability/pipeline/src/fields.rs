//! 稀疏字段构造。
//!
//! 缺省值（None、空字符串、0）不写入字段集。

use domain::FieldValue;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct FieldSet {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 无条件写入。
    pub fn insert(&mut self, key: &str, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// 仅在存在时写入。
    pub fn insert_opt<V: Into<FieldValue>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// 仅在非空时写入。
    pub fn insert_text(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        self.insert_opt(key, value.filter(|v| !v.is_empty()))
    }

    /// 仅在非零时写入。
    pub fn insert_nonzero(&mut self, key: &str, value: Option<f64>) -> &mut Self {
        self.insert_opt(key, value.filter(|v| *v != 0.0))
    }

    pub fn into_inner(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}
