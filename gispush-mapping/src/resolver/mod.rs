pub mod path;
pub mod list;
pub mod slice;

use serde_json::Value;

use crate::{
    error::{MappingError, Result},
    model::LeafRule,
    utils::is_empty,
};

/// 叶子规则求值管线，顺序固定：path → list_item → character_set
///
/// Absence is a normal outcome at every stage; only a required rule that
/// ends up empty turns it into a Rejection.
pub fn resolve_leaf(rule: &LeafRule, doc: &Value) -> Result<Value> {
    let mut value = path::resolve_path(doc, &rule.field).cloned();

    if let Some(index) = rule.list_item {
        value = value.and_then(|v| list::select_list_item(&v, index).cloned());
    }

    if let Some(set) = &rule.character_set {
        value = match value {
            Some(Value::String(s)) => Some(Value::String(slice::slice_characters(&s, set))),
            // 对非字符串做截取没有定义，按 absence 处理
            Some(_) | None => None,
        };
    }

    let value = value.unwrap_or(Value::Null);

    if rule.required && is_empty(&value) {
        return Err(MappingError::RequiredFieldEmpty(rule.field.clone()));
    }

    Ok(value)
}
