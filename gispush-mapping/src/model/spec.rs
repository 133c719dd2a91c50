use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 映射规范：输出字段名 → 规则（遍历顺序确定，便于测试）
pub type MappingSpec = BTreeMap<String, FieldRule>;

/// 单条字段映射规则：叶子提取或 `_items` 嵌套组合
///
/// Deserialization is untagged: an entry carrying `_items` is a composite,
/// an entry carrying `field` is a leaf, anything else fails at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRule {
    Composite(CompositeRule),
    Leaf(LeafRule),
}

/// `_items`：输出值本身是一个对象，递归地对同一份源文档应用嵌套规范
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositeRule {
    #[serde(rename = "_items")]
    pub items: MappingSpec,
}

/// 叶子规则
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeafRule {
    /// 斜杠分隔的取值路径，如 `properties/user/name`
    pub field: String,

    /// required 字段解析为空时整条消息被拒绝
    #[serde(default)]
    pub required: bool,

    /// 当解析结果为数组时取第 N 个元素
    #[serde(default)]
    pub list_item: Option<usize>,

    /// `[start, end]` 字符截取，任一端可为 null
    #[serde(default)]
    pub character_set: Option<CharacterSet>,
}

/// `[start, end]` — both bounds are inclusive cut points on 0-based
/// character positions: `[null, 5]` keeps positions `0..=5`, `[6, null]`
/// drops positions `0..=6`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CharacterSet(pub Option<usize>, pub Option<usize>);

impl CharacterSet {
    pub fn start(&self) -> Option<usize> {
        self.0
    }

    pub fn end(&self) -> Option<usize> {
        self.1
    }
}
