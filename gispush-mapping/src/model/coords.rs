use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::resolver::path::resolve_path;

/// 坐标转换类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CoordinateConversion {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "wgs84-web_mercator")]
    Wgs84WebMercator,
}

/// 坐标映射：longitude / latitude 指向源文档中的取值路径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinateSpec {
    pub longitude: String,
    pub latitude: String,
    #[serde(default)]
    pub conversion: CoordinateConversion,
}

// 球面 Web Mercator 投影的赤道半周长（米）
const WEB_MERCATOR_HALF_CIRCUMFERENCE: f64 = 20_037_508.342_789_244;

impl CoordinateSpec {
    /// Build the ArcGIS `geometry` object from the source document, or
    /// `None` when either coordinate is missing or non-numeric.
    pub fn geometry(&self, doc: &Value) -> Option<Value> {
        let lon = resolve_path(doc, &self.longitude)?.as_f64()?;
        let lat = resolve_path(doc, &self.latitude)?.as_f64()?;

        let (x, y, wkid) = match self.conversion {
            CoordinateConversion::Default => (lon, lat, 4326),
            CoordinateConversion::Wgs84WebMercator => {
                let x = lon * WEB_MERCATOR_HALF_CIRCUMFERENCE / 180.0;
                let y = ((90.0 + lat) * std::f64::consts::PI / 360.0).tan().ln()
                    / (std::f64::consts::PI / 180.0)
                    * WEB_MERCATOR_HALF_CIRCUMFERENCE
                    / 180.0;
                (x, y, 3857)
            }
        };

        Some(json!({
            "x": x,
            "y": y,
            "spatialReference": { "wkid": wkid },
        }))
    }
}
