use std::{env, fs, path::Path};

use serde::Deserialize;

use gispush_mapping::{CoordinateSpec, MappingSpec};

use crate::error::{ConfigError, Result};

/// 顶层配置，对应 config.yaml
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub debug_logging: bool,

    /// 保留字段：只影响被排除的 Firestore 客户端，解析后忽略
    #[serde(default)]
    pub high_workload: bool,

    /// 映射前先取到的消息子路径
    #[serde(default)]
    pub data_source: Option<String>,

    #[serde(default)]
    pub existence_check: Option<ExistenceCheck>,

    /// 附件下载用 bearer token 所在的环境变量名（可选）
    #[serde(default)]
    pub attachment_token_env: Option<String>,

    pub arcgis: ArcGisConfig,
    pub mapping: MappingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistenceCheck {
    ArcGis,
    Firestore,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArcGisConfig {
    pub authentication: ArcGisAuth,
    pub feature_service: FeatureServiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArcGisAuth {
    pub url: String,
    pub username: String,

    /// 存放口令的环境变量名
    #[serde(default = "default_password_env")]
    pub password_env: String,

    #[serde(default = "default_request")]
    pub request: String,

    pub referer: String,
}

fn default_password_env() -> String {
    "ARCGIS_PASSWORD".to_string()
}

fn default_request() -> String {
    "gettoken".to_string()
}

impl ArcGisAuth {
    /// Resolve the password from the configured environment variable.
    pub fn password(&self) -> Result<String> {
        env::var(&self.password_env)
            .map_err(|_| ConfigError::Missing("arcgis authentication password"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureServiceConfig {
    pub url: String,
    pub id: String,

    #[serde(default)]
    pub layers: Option<Vec<u32>>,
}

impl FeatureServiceConfig {
    /// Feature-service URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    pub fields: MappingSpec,

    /// 已映射记录中的 ID 取值路径，如 `attributes/id`
    pub id_field: String,

    /// 源文档中的图层取值路径
    #[serde(default)]
    pub layer_field: Option<String>,

    /// 已映射记录中的附件取值路径列表
    #[serde(default)]
    pub attachments: Vec<String>,

    #[serde(default)]
    pub coordinates: Option<CoordinateSpec>,

    #[serde(default)]
    pub disable_updated_at: bool,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: AppConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on configuration the function cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.mapping.fields.is_empty() {
            return Err(ConfigError::Missing("mapping.fields"));
        }
        if self.mapping.id_field.is_empty() {
            return Err(ConfigError::Missing("mapping.id_field"));
        }
        if self.arcgis.authentication.url.is_empty() {
            return Err(ConfigError::Missing("arcgis.authentication.url"));
        }
        if self.arcgis.feature_service.url.is_empty() {
            return Err(ConfigError::Missing("arcgis.feature_service.url"));
        }
        if self.arcgis.feature_service.id.is_empty() {
            return Err(ConfigError::Missing("arcgis.feature_service.id"));
        }
        // Firestore 查询属于被排除的协作方
        if self.existence_check == Some(ExistenceCheck::Firestore) {
            return Err(ConfigError::Unsupported(
                "existence_check 'firestore' is not supported, use 'arcgis'".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
debug_logging: true
data_source: nested/data
existence_check: arcgis
arcgis:
  authentication:
    url: https://gis.test/portal/sharing/rest/generateToken
    username: user_1
    referer: https://gis.test/portal
  feature_service:
    url: https://gis.test/server/rest/services/test/FeatureServer/
    id: test-service
    layers: [0, 1]
mapping:
  id_field: attributes/id
  layer_field: properties/layer
  attachments:
    - attributes/profile_picture
  coordinates:
    longitude: geometry/lon
    latitude: geometry/lat
    conversion: wgs84-web_mercator
  fields:
    attributes:
      _items:
        id:
          field: properties/id
          required: true
        name:
          field: properties/user/name
        profile_picture:
          field: properties/user/photo
"#;

    #[test]
    fn test_parse_full_example() {
        let config: AppConfig = serde_yaml::from_str(EXAMPLE).unwrap();
        config.validate().unwrap();

        assert!(config.debug_logging);
        assert_eq!(config.data_source.as_deref(), Some("nested/data"));
        assert_eq!(config.existence_check, Some(ExistenceCheck::ArcGis));
        assert_eq!(config.arcgis.authentication.request, "gettoken");
        assert_eq!(config.arcgis.authentication.password_env, "ARCGIS_PASSWORD");
        assert_eq!(
            config.arcgis.feature_service.base_url(),
            "https://gis.test/server/rest/services/test/FeatureServer"
        );
        assert_eq!(config.arcgis.feature_service.layers, Some(vec![0, 1]));
        assert_eq!(config.mapping.id_field, "attributes/id");
        assert_eq!(config.mapping.attachments.len(), 1);
        assert!(config.mapping.coordinates.is_some());
        assert_eq!(config.mapping.fields.len(), 1);
    }

    #[test]
    fn test_firestore_mode_is_refused() {
        let yaml = EXAMPLE.replace("existence_check: arcgis", "existence_check: firestore");
        let config: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Unsupported(_)));
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        let yaml = EXAMPLE.replace("id: test-service", "id: \"\"");
        let config: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Missing("arcgis.feature_service.id")
        ));
    }
}
