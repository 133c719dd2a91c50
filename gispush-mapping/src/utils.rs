use serde_json::Value;

/// "空" 的统一判定：absent（调用方用 Null 表示）、null、空字符串
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// 写入嵌套路径：`attributes/profile_picture`
///
/// Only descends through already-existing objects; an invalid path is a
/// silent no-op, the document is left untouched.
pub fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('/').collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = doc;
    for segment in segments {
        match current.get_mut(segment) {
            Some(next) => current = next,
            None => return,
        }
    }

    if let Value::Object(map) = current {
        map.insert(last.to_string(), value);
    }
}
