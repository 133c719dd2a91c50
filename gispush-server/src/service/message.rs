use std::collections::HashMap;
use std::env;

use serde_json::{json, Value};
use tracing::{error, info, warn};

use gispush_config::{AppConfig, ExistenceCheck};
use gispush_gis::{AttachmentService, GisService};
use gispush_mapping::{mapper::MappedRecord, resolver::path::resolve_path, utils::set_path, FieldMapper};

use crate::error::AppResult;
use crate::service::plan::{plan_edits, Edit, FeatureRef};

/// 一次消息处理的发布统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    pub updated: usize,
    pub created: usize,
    pub deleted: usize,
    pub attachments: usize,
}

/// 发布成功的编辑，附件管线的输入
struct DoneEdit {
    layer_id: u32,
    object_id: i64,
    object: Value,
    attachments: Vec<(String, String)>,
}

/// Orchestrates one inbound message: mapping, layer resolution, existence
/// matching, per-layer publication and the attachment pipeline.
pub struct MessageService {
    config: AppConfig,
    mapper: FieldMapper,
}

impl MessageService {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        // 启动时就确认口令可用
        config.arcgis.authentication.password()?;

        let mapper = FieldMapper::new(
            config.mapping.fields.clone(),
            config.data_source.clone(),
            config.mapping.layer_field.clone(),
            config.mapping.attachments.clone(),
            config.mapping.coordinates.clone(),
        );

        Ok(Self { config, mapper })
    }

    pub async fn process(&self, payload: &Value) -> AppResult<ProcessSummary> {
        let records = self.mapper.map_payload(payload);
        if records.is_empty() {
            info!("no data to be published towards ArcGIS");
            return Ok(ProcessSummary::default());
        }

        let edits = self.collect_edits(records);
        if edits.is_empty() {
            info!("no data to be published towards ArcGIS");
            return Ok(ProcessSummary::default());
        }

        let password = self.config.arcgis.authentication.password()?;
        let gis = GisService::login(
            &self.config.arcgis.authentication,
            &password,
            &self.config.arcgis.feature_service,
            self.config.mapping.disable_updated_at,
        )
        .await?;

        let matched = self.match_existing_features(&gis, &edits).await?;
        let plan = plan_edits(edits, &matched);

        let mut summary = ProcessSummary::default();
        let mut done: Vec<DoneEdit> = Vec::new();

        for (layer_id, layer) in plan {
            let updates: Vec<Value> = layer.to_update.iter().map(|e| e.object.clone()).collect();
            let creates: Vec<Value> = layer.to_create.iter().map(|e| e.object.clone()).collect();

            let results = gis
                .apply_edits(layer_id, &updates, &creates, &layer.to_delete)
                .await?;

            for (edit, result) in layer.to_update.into_iter().zip(results.update_results) {
                summary.updated += 1;
                done.push(DoneEdit {
                    layer_id,
                    object_id: result.object_id,
                    object: edit.object,
                    attachments: edit.attachments,
                });
            }
            for (edit, result) in layer.to_create.into_iter().zip(results.add_results) {
                summary.created += 1;
                done.push(DoneEdit {
                    layer_id,
                    object_id: result.object_id,
                    object: edit.object,
                    attachments: edit.attachments,
                });
            }
            summary.deleted += results.delete_results.len();

            info!(
                "layer {layer_id}: updated {}, created {}, deleted {}",
                updates.len(),
                creates.len(),
                layer.to_delete.len()
            );
        }

        summary.attachments = self.publish_attachments(&gis, done).await?;

        Ok(summary)
    }

    /// 映射记录 → 待发布编辑：解析记录 ID 与图层
    fn collect_edits(&self, records: Vec<MappedRecord>) -> Vec<Edit> {
        let id_field = &self.config.mapping.id_field;

        records
            .into_iter()
            .filter_map(|record| {
                let id_value = resolve_path(&record.data, id_field).cloned();
                let (item_id, id_value) = match id_value {
                    Some(Value::String(s)) if !s.is_empty() => {
                        let value = Value::String(s.clone());
                        (s, value)
                    }
                    Some(Value::Number(n)) => (n.to_string(), Value::Number(n)),
                    _ => {
                        error!("record has no usable ID at '{id_field}', skipping this");
                        return None;
                    }
                };

                let layer_id = self.layer_id_for(record.layer_id, &item_id)?;

                Some(Edit {
                    item_id,
                    id_value,
                    layer_id,
                    object: record.data,
                    attachments: record.attachments,
                })
            })
            .collect()
    }

    /// 记录自带图层要在配置里；否则取配置的第一个图层；都没有则 0
    fn layer_id_for(&self, record_layer: Option<u32>, item_id: &str) -> Option<u32> {
        let layers = self.config.arcgis.feature_service.layers.as_ref();

        if let Some(layer_id) = record_layer {
            if let Some(layers) = layers {
                if !layers.contains(&layer_id) {
                    error!(
                        "message '{item_id}' contains a not defined layer ID '{layer_id}', skipping this"
                    );
                    return None;
                }
            }
            return Some(layer_id);
        }

        Some(layers.and_then(|l| l.first().copied()).unwrap_or(0))
    }

    /// 跨图层匹配既有要素；一个 ID 找到后不再到剩余图层里找
    async fn match_existing_features(
        &self,
        gis: &GisService,
        edits: &[Edit],
    ) -> AppResult<HashMap<String, Vec<FeatureRef>>> {
        let mut matched: HashMap<String, Vec<FeatureRef>> = HashMap::new();

        if self.config.existence_check != Some(ExistenceCheck::ArcGis) {
            return Ok(matched);
        }

        let id_attribute = self
            .config
            .mapping
            .id_field
            .rsplit('/')
            .next()
            .unwrap_or(&self.config.mapping.id_field);

        let layers = self
            .config
            .arcgis
            .feature_service
            .layers
            .clone()
            .unwrap_or_else(|| vec![0]);

        let mut remaining: Vec<(String, Value)> = Vec::new();
        for edit in edits {
            if !remaining.iter().any(|(key, _)| key == &edit.item_id) {
                remaining.push((edit.item_id.clone(), edit.id_value.clone()));
            }
        }

        for layer_id in layers {
            if remaining.is_empty() {
                break;
            }

            let values: Vec<Value> = remaining.iter().map(|(_, v)| v.clone()).collect();
            let object_ids = gis.query_object_ids(layer_id, id_attribute, &values).await?;

            remaining.retain(|(key, _)| {
                if let Some(object_id) = object_ids.get(key) {
                    matched.entry(key.clone()).or_default().push(FeatureRef {
                        layer_id,
                        object_id: *object_id,
                    });
                    false
                } else {
                    true
                }
            });
        }

        Ok(matched)
    }

    /// 下载并上传附件，再把附件 ID 写回要素
    async fn publish_attachments(&self, gis: &GisService, done: Vec<DoneEdit>) -> AppResult<usize> {
        if done.iter().all(|edit| edit.attachments.is_empty()) {
            return Ok(0);
        }

        let bearer_token = self
            .config
            .attachment_token_env
            .as_ref()
            .and_then(|name| env::var(name).ok());
        let attachment_service = AttachmentService::new(bearer_token)?;

        let mut uploaded_total = 0;
        let mut follow_ups: HashMap<u32, Vec<Value>> = HashMap::new();

        for mut edit in done {
            let mut uploaded = 0;

            for (field, url) in &edit.attachments {
                let Some(attachment) = attachment_service.fetch(url).await else {
                    continue;
                };

                let attachment_id = match gis
                    .add_attachment(edit.layer_id, edit.object_id, &attachment)
                    .await
                {
                    Ok(id) => id,
                    Err(err) => {
                        warn!("attachment upload to feature '{}' failed: {err}", edit.object_id);
                        continue;
                    }
                };

                set_path(&mut edit.object, field, json!(attachment_id));
                uploaded += 1;
            }

            if uploaded > 0 {
                // 写回更新一定要带 objectid
                if let Some(attributes) = edit
                    .object
                    .get_mut("attributes")
                    .and_then(Value::as_object_mut)
                {
                    attributes.insert("objectid".to_string(), json!(edit.object_id));
                }
                follow_ups
                    .entry(edit.layer_id)
                    .or_default()
                    .push(edit.object);
                uploaded_total += uploaded;
            }
        }

        if uploaded_total > 0 {
            info!("uploaded {uploaded_total} attachment(s)");
        }

        for (layer_id, updates) in follow_ups {
            gis.apply_edits(layer_id, &updates, &[], &[]).await?;
        }

        Ok(uploaded_total)
    }
}
