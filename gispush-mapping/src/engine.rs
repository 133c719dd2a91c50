use serde_json::{Map, Value};

use crate::{
    error::Result,
    model::{FieldRule, MappingSpec},
    resolver,
};

pub struct MappingEngine;

impl MappingEngine {
    /// 执行映射：叶子规则走求值管线，`_items` 对同一份源文档递归
    ///
    /// The first Rejection aborts the whole invocation; no further fields
    /// are evaluated. Optional leaves that resolve empty are still written
    /// as `null`.
    pub fn apply(spec: &MappingSpec, doc: &Value) -> Result<Value> {
        let mut out = Map::new();

        for (key, rule) in spec {
            let value = match rule {
                FieldRule::Composite(composite) => Self::apply(&composite.items, doc)?,
                FieldRule::Leaf(leaf) => resolver::resolve_leaf(leaf, doc)?,
            };
            out.insert(key.clone(), value);
        }

        Ok(Value::Object(out))
    }
}
