use serde_json::Value;

/// 沿斜杠分隔的路径逐层下钻；缺键或中间节点不是对象即为 absence
pub fn resolve_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('/') {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}
