use serde_json::Value;

/// 数组取第 N 个元素；非数组或越界即为 absence
pub fn select_list_item(value: &Value, index: usize) -> Option<&Value> {
    value.as_array()?.get(index)
}
