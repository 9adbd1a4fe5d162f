//! SenML JSON 报文结构（RFC 8428）。

use serde::Deserialize;

/// 支持的最高 SenML 版本。
pub const SUPPORTED_VERSION: i64 = 10;

/// 报文中的单条 SenML 记录（未规整）。
///
/// 所有字段均可缺省；未识别的键直接忽略。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SenmlRecord {
    #[serde(rename = "bn", default)]
    pub base_name: Option<String>,
    #[serde(rename = "bt", default)]
    pub base_time: Option<f64>,
    #[serde(rename = "bu", default)]
    pub base_unit: Option<String>,
    #[serde(rename = "bv", default)]
    pub base_value: Option<f64>,
    #[serde(rename = "bs", default)]
    pub base_sum: Option<f64>,
    #[serde(rename = "bver", default)]
    pub base_version: Option<i64>,
    #[serde(rename = "n", default)]
    pub name: Option<String>,
    #[serde(rename = "u", default)]
    pub unit: Option<String>,
    #[serde(rename = "t", default)]
    pub time: Option<f64>,
    #[serde(rename = "ut", default)]
    pub update_time: Option<f64>,
    #[serde(rename = "v", default)]
    pub value: Option<f64>,
    #[serde(rename = "vs", default)]
    pub string_value: Option<String>,
    #[serde(rename = "vd", default)]
    pub data_value: Option<String>,
    #[serde(rename = "vb", default)]
    pub bool_value: Option<bool>,
    #[serde(rename = "s", default)]
    pub sum: Option<f64>,
}

impl SenmlRecord {
    /// 是否携带任意值字段（仅含基础字段的记录不产出测量）。
    pub fn has_value(&self) -> bool {
        self.value.is_some()
            || non_empty(self.string_value.as_deref()).is_some()
            || non_empty(self.data_value.as_deref()).is_some()
            || self.bool_value.is_some()
            || self.sum.is_some()
    }
}

/// 解码 SenML JSON 数组。
pub fn decode(payload: &[u8]) -> Result<Vec<SenmlRecord>, serde_json::Error> {
    serde_json::from_slice(payload)
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
