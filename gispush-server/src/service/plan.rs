use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Value};

/// 一条待发布的编辑
#[derive(Debug, Clone)]
pub struct Edit {
    /// 记录 ID 的字符串形式，用作匹配键
    pub item_id: String,
    /// 记录 ID 的原始值，existence 查询用
    pub id_value: Value,
    pub layer_id: u32,
    pub object: Value,
    /// (附件路径, 附件 URL)
    pub attachments: Vec<(String, String)>,
}

/// 单个图层的编辑计划
#[derive(Debug, Default)]
pub struct LayerEdits {
    pub to_update: Vec<Edit>,
    pub to_create: Vec<Edit>,
    pub to_delete: Vec<i64>,
}

/// 既有要素引用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRef {
    pub layer_id: u32,
    pub object_id: i64,
}

/// Split edits into per-layer update/create/delete plans.
///
/// A feature matched in the edit's own layer is reused: its objectid is
/// written into the edit's attributes and the edit becomes an update. A
/// stale copy matched in any other layer is scheduled for deletion there.
pub fn plan_edits(
    edits: Vec<Edit>,
    matched: &HashMap<String, Vec<FeatureRef>>,
) -> BTreeMap<u32, LayerEdits> {
    let mut layers: BTreeMap<u32, LayerEdits> = BTreeMap::new();

    for mut edit in edits {
        let mut update_object_id = None;

        for feature in matched.get(&edit.item_id).cloned().unwrap_or_default() {
            if feature.layer_id == edit.layer_id {
                if let Some(attributes) = edit
                    .object
                    .get_mut("attributes")
                    .and_then(Value::as_object_mut)
                {
                    attributes.insert("objectid".to_string(), json!(feature.object_id));
                }
                update_object_id = Some(feature.object_id);
                continue;
            }

            // 未被更新复用的异层残留 → 删除
            if update_object_id != Some(feature.object_id) {
                layers
                    .entry(feature.layer_id)
                    .or_default()
                    .to_delete
                    .push(feature.object_id);
            }
        }

        let slot = layers.entry(edit.layer_id).or_default();
        if update_object_id.is_some() {
            slot.to_update.push(edit);
        } else {
            slot.to_create.push(edit);
        }
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(item_id: &str, layer_id: u32) -> Edit {
        Edit {
            item_id: item_id.to_string(),
            id_value: json!(item_id),
            layer_id,
            object: json!({"attributes": {"id": item_id}}),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_unmatched_edit_is_created() {
        let plan = plan_edits(vec![edit("a", 0)], &HashMap::new());

        let layer = plan.get(&0).unwrap();
        assert_eq!(layer.to_create.len(), 1);
        assert!(layer.to_update.is_empty());
        assert!(layer.to_delete.is_empty());
    }

    #[test]
    fn test_same_layer_match_becomes_update_with_objectid() {
        let matched = HashMap::from([(
            "a".to_string(),
            vec![FeatureRef {
                layer_id: 0,
                object_id: 77,
            }],
        )]);

        let plan = plan_edits(vec![edit("a", 0)], &matched);

        let layer = plan.get(&0).unwrap();
        assert_eq!(layer.to_update.len(), 1);
        assert_eq!(
            layer.to_update[0].object["attributes"]["objectid"],
            json!(77)
        );
    }

    #[test]
    fn test_cross_layer_match_is_deleted_and_created_in_target() {
        let matched = HashMap::from([(
            "a".to_string(),
            vec![FeatureRef {
                layer_id: 1,
                object_id: 50,
            }],
        )]);

        let plan = plan_edits(vec![edit("a", 2)], &matched);

        assert_eq!(plan.get(&1).unwrap().to_delete, vec![50]);
        assert_eq!(plan.get(&2).unwrap().to_create.len(), 1);
    }

    #[test]
    fn test_moved_feature_updates_target_and_cleans_stale_copy() {
        let matched = HashMap::from([(
            "a".to_string(),
            vec![
                FeatureRef {
                    layer_id: 2,
                    object_id: 60,
                },
                FeatureRef {
                    layer_id: 1,
                    object_id: 50,
                },
            ],
        )]);

        let plan = plan_edits(vec![edit("a", 2)], &matched);

        assert_eq!(plan.get(&2).unwrap().to_update.len(), 1);
        assert_eq!(plan.get(&1).unwrap().to_delete, vec![50]);
    }

    #[test]
    fn test_layers_are_sorted() {
        let plan = plan_edits(vec![edit("a", 3), edit("b", 1)], &HashMap::new());
        let keys: Vec<u32> = plan.keys().copied().collect();
        assert_eq!(keys, vec![1, 3]);
    }
}
