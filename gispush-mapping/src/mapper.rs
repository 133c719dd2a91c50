use serde_json::Value;
use tracing::{debug, info};

use crate::{
    engine::MappingEngine,
    model::{CoordinateSpec, MappingSpec},
    resolver::path::resolve_path,
    utils::set_path,
};

/// 一条映射完成的记录：目标对象 + 所属图层 + 抽取出的附件
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub data: Value,
    pub layer_id: Option<u32>,
    /// 附件路径 → 附件 URL（已从 data 中置空）
    pub attachments: Vec<(String, String)>,
}

/// Payload-level mapper: roots the payload at `data_source`, fans a list
/// out to one record per element, applies the mapping engine, builds the
/// geometry object and extracts attachment URLs.
pub struct FieldMapper {
    spec: MappingSpec,
    data_source: Option<String>,
    layer_field: Option<String>,
    attachments: Vec<String>,
    coordinates: Option<CoordinateSpec>,
}

impl FieldMapper {
    pub fn new(
        spec: MappingSpec,
        data_source: Option<String>,
        layer_field: Option<String>,
        attachments: Vec<String>,
        coordinates: Option<CoordinateSpec>,
    ) -> Self {
        Self {
            spec,
            data_source,
            layer_field,
            attachments,
            coordinates,
        }
    }

    /// 消息载荷 → 映射记录列表
    ///
    /// A rejected element is skipped with an info log; it never aborts its
    /// siblings and is not an error.
    pub fn map_payload(&self, payload: &Value) -> Vec<MappedRecord> {
        let rooted = match &self.data_source {
            Some(path) => match resolve_path(payload, path) {
                Some(value) => value.clone(),
                None => {
                    info!("data source '{path}' not present in payload");
                    return Vec::new();
                }
            },
            None => payload.clone(),
        };

        let docs = match rooted {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        };

        let mut records = Vec::new();
        for doc in docs {
            match MappingEngine::apply(&self.spec, &doc) {
                Ok(mut data) => {
                    self.attach_geometry(&doc, &mut data);
                    let attachments = self.extract_attachments(&mut data);
                    let layer_id = self.layer_id_of(&doc);
                    records.push(MappedRecord {
                        data,
                        layer_id,
                        attachments,
                    });
                }
                Err(err) if err.is_rejection() => {
                    info!("message not published: {err}");
                }
                Err(err) => {
                    info!("an error occurred during formatting data: {err}");
                }
            }
        }

        records
    }

    fn attach_geometry(&self, doc: &Value, data: &mut Value) {
        let Some(coordinates) = &self.coordinates else {
            return;
        };
        match coordinates.geometry(doc) {
            Some(geometry) => {
                if let Value::Object(map) = data {
                    map.insert("geometry".to_string(), geometry);
                }
            }
            None => debug!("coordinates missing or non-numeric, geometry omitted"),
        }
    }

    /// 把配置的附件路径从已映射记录中取出并置空
    fn extract_attachments(&self, data: &mut Value) -> Vec<(String, String)> {
        let mut extracted = Vec::new();

        for field in &self.attachments {
            let url = resolve_path(data, field).and_then(|v| v.as_str().map(str::to_string));
            if let Some(url) = url {
                set_path(data, field, Value::Null);
                extracted.push((field.clone(), url));
            }
        }

        extracted
    }

    fn layer_id_of(&self, doc: &Value) -> Option<u32> {
        let field = self.layer_field.as_ref()?;
        match resolve_path(doc, field)? {
            Value::Number(n) => n.as_u64().map(|v| v as u32),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CoordinateConversion, MappingSpec};
    use serde_json::json;

    fn mapper(yaml: &str) -> FieldMapper {
        let spec: MappingSpec = serde_yaml::from_str(yaml).unwrap();
        FieldMapper::new(spec, None, None, Vec::new(), None)
    }

    const ATTRIBUTES_SPEC: &str = r#"
attributes:
  _items:
    id:
      field: properties/id
      required: true
    name:
      field: properties/user/name
"#;

    #[test]
    fn test_single_document_payload() {
        let mapper = mapper(ATTRIBUTES_SPEC);
        let payload = json!({"properties": {"id": 123456, "user": {"name": "Test"}}});

        let records = mapper.map_payload(&payload);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].data,
            json!({"attributes": {"id": 123456, "name": "Test"}})
        );
    }

    #[test]
    fn test_data_source_roots_the_payload() {
        let spec: MappingSpec = serde_yaml::from_str(ATTRIBUTES_SPEC).unwrap();
        let mapper = FieldMapper::new(
            spec,
            Some("nested/data".to_string()),
            None,
            Vec::new(),
            None,
        );
        let payload = json!({
            "nested": {"data": {"properties": {"id": 1, "user": {"name": "Test"}}}}
        });

        let records = mapper.map_payload(&payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data["attributes"]["id"], json!(1));
    }

    #[test]
    fn test_missing_data_source_yields_nothing() {
        let spec: MappingSpec = serde_yaml::from_str(ATTRIBUTES_SPEC).unwrap();
        let mapper = FieldMapper::new(spec, Some("nested/data".to_string()), None, Vec::new(), None);

        assert!(mapper.map_payload(&json!({"other": 1})).is_empty());
    }

    #[test]
    fn test_list_fan_out_skips_rejected_elements() {
        let mapper = mapper(ATTRIBUTES_SPEC);
        let payload = json!([
            {"properties": {"id": 1, "user": {"name": "First"}}},
            {"properties": {"user": {"name": "No id"}}},
            {"properties": {"id": 3, "user": {"name": "Third"}}},
        ]);

        let records = mapper.map_payload(&payload);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data["attributes"]["id"], json!(1));
        assert_eq!(records[1].data["attributes"]["id"], json!(3));
    }

    #[test]
    fn test_attachment_extraction_nulls_the_field() {
        let spec: MappingSpec = serde_yaml::from_str(
            r#"
attributes:
  _items:
    id:
      field: properties/id
    photo:
      field: properties/user/photo
"#,
        )
        .unwrap();
        let mapper = FieldMapper::new(
            spec,
            None,
            None,
            vec!["attributes/photo".to_string()],
            None,
        );
        let payload = json!({
            "properties": {"id": 1, "user": {"photo": "https://files.test/img.jpg"}}
        });

        let records = mapper.map_payload(&payload);
        assert_eq!(records[0].data["attributes"]["photo"], Value::Null);
        assert_eq!(
            records[0].attachments,
            vec![(
                "attributes/photo".to_string(),
                "https://files.test/img.jpg".to_string()
            )]
        );
    }

    #[test]
    fn test_layer_field_resolution() {
        let spec: MappingSpec = serde_yaml::from_str(ATTRIBUTES_SPEC).unwrap();
        let mapper = FieldMapper::new(
            spec,
            None,
            Some("properties/layer".to_string()),
            Vec::new(),
            None,
        );
        let payload = json!({"properties": {"id": 1, "layer": 2, "user": {"name": "T"}}});

        let records = mapper.map_payload(&payload);
        assert_eq!(records[0].layer_id, Some(2));
    }

    #[test]
    fn test_geometry_is_attached() {
        let spec: MappingSpec = serde_yaml::from_str(ATTRIBUTES_SPEC).unwrap();
        let mapper = FieldMapper::new(
            spec,
            None,
            None,
            Vec::new(),
            Some(CoordinateSpec {
                longitude: "geometry/lon".to_string(),
                latitude: "geometry/lat".to_string(),
                conversion: CoordinateConversion::Default,
            }),
        );
        let payload = json!({
            "properties": {"id": 1, "user": {"name": "T"}},
            "geometry": {"lon": 5.2913, "lat": 52.1326},
        });

        let records = mapper.map_payload(&payload);
        assert_eq!(records[0].data["geometry"]["x"], json!(5.2913));
        assert_eq!(records[0].data["geometry"]["y"], json!(52.1326));
    }
}
