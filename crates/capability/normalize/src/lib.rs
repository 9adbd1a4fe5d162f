//! SenML 报文解码与规整。
//!
//! 规整按报文顺序遍历记录，携带 bn/bt/bu/bv/bs 基础状态，
//! 将每条带值记录展开为绝对名称、时间、单位与数值。

pub mod senml;

use domain::ResolvedRecord;
use senml::{SUPPORTED_VERSION, SenmlRecord, non_empty};

/// 规整错误。
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("decode error: {0}")]
    Decode(String),
    #[error("malformed senml payload: {0}")]
    Malformed(String),
}

/// 解码并规整 SenML 负载（相对时间以当前整秒为基准）。
pub fn normalize(payload: &[u8]) -> Result<Vec<ResolvedRecord>, NormalizeError> {
    normalize_at(payload, now_epoch_secs())
}

/// 解码并规整 SenML 负载，`now` 为相对时间的基准（Unix 秒）。
pub fn normalize_at(payload: &[u8], now: f64) -> Result<Vec<ResolvedRecord>, NormalizeError> {
    let records =
        senml::decode(payload).map_err(|err| NormalizeError::Decode(err.to_string()))?;
    let resolved = resolve(records, now)?;
    if resolved.is_empty() {
        return Err(NormalizeError::Malformed("no resolvable records".to_string()));
    }
    Ok(resolved)
}

#[derive(Debug, Default)]
struct BaseState {
    name: String,
    time: f64,
    unit: Option<String>,
    value: f64,
    sum: f64,
}

impl BaseState {
    fn absorb(&mut self, record: &SenmlRecord) -> Result<(), NormalizeError> {
        if let Some(version) = record.base_version {
            if version > SUPPORTED_VERSION {
                return Err(NormalizeError::Malformed(format!(
                    "unsupported senml version {}",
                    version
                )));
            }
        }
        if let Some(name) = non_empty(record.base_name.as_deref()) {
            self.name = name.to_string();
        }
        if let Some(time) = record.base_time.filter(|t| *t != 0.0) {
            self.time = time;
        }
        if let Some(unit) = non_empty(record.base_unit.as_deref()) {
            self.unit = Some(unit.to_string());
        }
        if let Some(value) = record.base_value {
            self.value = value;
        }
        if let Some(sum) = record.base_sum {
            self.sum = sum;
        }
        Ok(())
    }
}

/// 对已解码的记录执行基础字段继承，丢弃不带值的记录。
pub fn resolve(records: Vec<SenmlRecord>, now: f64) -> Result<Vec<ResolvedRecord>, NormalizeError> {
    let mut base = BaseState::default();
    let mut resolved = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        base.absorb(&record)?;
        if !record.has_value() {
            continue;
        }

        let name = format!("{}{}", base.name, record.name.as_deref().unwrap_or_default());
        if name.is_empty() {
            return Err(NormalizeError::Malformed(format!(
                "record {} has no name",
                index
            )));
        }

        // t <= 0 表示相对当前时间
        let mut time = base.time + record.time.unwrap_or_default();
        if time <= 0.0 {
            time += now;
        }

        resolved.push(ResolvedRecord {
            name,
            unit: non_empty(record.unit.as_deref())
                .map(str::to_string)
                .or_else(|| base.unit.clone()),
            time,
            update_time: record.update_time.filter(|ut| *ut != 0.0),
            value: record.value.map(|v| base.value + v),
            string_value: record.string_value.filter(|v| !v.is_empty()),
            data_value: record.data_value.filter(|v| !v.is_empty()),
            bool_value: record.bool_value,
            sum: record.sum.map(|s| base.sum + s),
        });
    }

    Ok(resolved)
}

fn now_epoch_secs() -> f64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_secs() as f64
}
