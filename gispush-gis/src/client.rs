use std::collections::HashMap;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use gispush_config::{ArcGisAuth, FeatureServiceConfig};

use crate::attachment::Attachment;
use crate::auth::{api_error, request_token};
use crate::error::{GisError, Result};

/// applyEdits 单条结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    pub object_id: i64,
    pub success: bool,
}

/// applyEdits 应答：更新/新建/删除三组结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResults {
    #[serde(default)]
    pub update_results: Vec<EditResult>,
    #[serde(default)]
    pub add_results: Vec<EditResult>,
    #[serde(default)]
    pub delete_results: Vec<EditResult>,
}

/// Async ArcGIS feature-service client. One token per instance; the token
/// lifecycle (refresh, caching) stays with the caller.
#[derive(Debug)]
pub struct GisService {
    client: Client,
    token: String,
    feature_url: String,
    disable_updated_at: bool,
}

impl GisService {
    /// 申请 token 并构建客户端
    pub async fn login(
        auth: &ArcGisAuth,
        password: &str,
        feature_service: &FeatureServiceConfig,
        disable_updated_at: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let token = request_token(&client, auth, password).await?;
        debug!("acquired feature service token");

        Ok(Self {
            client,
            token,
            feature_url: feature_service.base_url().to_string(),
            disable_updated_at,
        })
    }

    #[cfg(test)]
    pub fn with_token(token: &str, feature_url: &str, disable_updated_at: bool) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
            feature_url: feature_url.trim_end_matches('/').to_string(),
            disable_updated_at,
        }
    }

    /// applyEdits：批量更新/新建/删除
    ///
    /// Every object in one batch is stamped with the same
    /// `attributes.updated_at` timestamp unless disabled.
    pub async fn apply_edits(
        &self,
        layer_id: u32,
        to_update: &[Value],
        to_create: &[Value],
        to_delete: &[i64],
    ) -> Result<EditResults> {
        if to_update.is_empty() && to_create.is_empty() && to_delete.is_empty() {
            return Ok(EditResults::default());
        }

        let batch_timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut form: Vec<(String, String)> = Vec::new();

        if !to_create.is_empty() {
            let adds = self.stamp_edits(to_create, &batch_timestamp);
            form.push(("adds".to_string(), serde_json::to_string(&adds)?));
        }
        if !to_update.is_empty() {
            let updates = self.stamp_edits(to_update, &batch_timestamp);
            form.push(("updates".to_string(), serde_json::to_string(&updates)?));
        }
        if !to_delete.is_empty() {
            form.push(("deletes".to_string(), serde_json::to_string(to_delete)?));
        }

        let response = self.post_form(layer_id, None, "applyEdits", form).await?;
        let results: EditResults = serde_json::from_value(response)
            .map_err(|e| GisError::UnexpectedResponse(e.to_string()))?;

        Ok(results)
    }

    fn stamp_edits(&self, edits: &[Value], batch_timestamp: &str) -> Vec<Value> {
        let mut stamped = edits.to_vec();
        if !self.disable_updated_at {
            for edit in &mut stamped {
                if let Some(Value::Object(attributes)) =
                    edit.get_mut("attributes")
                {
                    attributes.insert("updated_at".to_string(), json!(batch_timestamp));
                }
            }
        }
        stamped
    }

    /// 现存要素查询：id 属性值 → objectid
    pub async fn query_object_ids(
        &self,
        layer_id: u32,
        id_attribute: &str,
        values: &[Value],
    ) -> Result<HashMap<String, i64>> {
        if values.is_empty() {
            return Ok(HashMap::new());
        }

        let quoted: Vec<String> = values.iter().map(sql_literal).collect();
        let where_clause = format!("{} IN ({})", id_attribute, quoted.join(", "));
        let out_fields = format!("{}, objectid", id_attribute);

        let response = self
            .post_form(
                layer_id,
                None,
                "query",
                vec![
                    ("where".to_string(), where_clause),
                    ("outFields".to_string(), out_fields),
                ],
            )
            .await?;

        let features = response
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or_else(|| GisError::UnexpectedResponse("missing 'features'".to_string()))?;

        let mut object_ids = HashMap::new();
        for feature in features {
            let attributes = &feature["attributes"];
            let id_value = match attributes.get(id_attribute) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            let object_id = attributes
                .get("objectid")
                .or_else(|| attributes.get("OBJECTID"))
                .and_then(|v| v.as_i64());
            if let Some(object_id) = object_id {
                object_ids.insert(id_value, object_id);
            }
        }

        Ok(object_ids)
    }

    /// addAttachment：往要素上传一个附件，返回附件 ID
    pub async fn add_attachment(
        &self,
        layer_id: u32,
        feature_id: i64,
        attachment: &Attachment,
    ) -> Result<i64> {
        let part = multipart::Part::bytes(attachment.content.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.mime_type)
            .map_err(|e| GisError::UnexpectedResponse(e.to_string()))?;

        let form = multipart::Form::new()
            .text("f", "json")
            .text("token", self.token.clone())
            .part("attachment", part);

        let url = format!(
            "{}/{}/{}/addAttachment",
            self.feature_url, layer_id, feature_id
        );
        let json: Value = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = json.get("error") {
            return Err(api_error(error));
        }

        let attachment_id = json["addAttachmentResult"]["objectId"]
            .as_i64()
            .ok_or_else(|| {
                GisError::UnexpectedResponse("missing 'addAttachmentResult'".to_string())
            })?;

        info!("uploaded attachment '{attachment_id}' to feature '{feature_id}'");
        Ok(attachment_id)
    }

    /// 统一的 feature-service form POST：{url}/{layer}[/{id}]/{action}
    async fn post_form(
        &self,
        layer_id: u32,
        feature_id: Option<i64>,
        action: &str,
        mut form: Vec<(String, String)>,
    ) -> Result<Value> {
        form.push(("f".to_string(), "json".to_string()));
        form.push(("token".to_string(), self.token.clone()));

        let mut url = format!("{}/{}", self.feature_url, layer_id);
        if let Some(feature_id) = feature_id {
            url = format!("{}/{}", url, feature_id);
        }
        url = format!("{}/{}", url, action);

        let json: Value = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = json.get("error") {
            return Err(api_error(error));
        }

        Ok(json)
    }
}

/// WHERE 子句里的字面量：字符串带引号转义，数字原样
fn sql_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => other.to_string(),
    }
}
