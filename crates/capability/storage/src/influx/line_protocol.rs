//! InfluxDB line protocol 编码
//!
//! 每个点编码为一行：
//! `measurement[,tag=value...] field=value[,field=value...] timestamp`
//!
//! tags 与 fields 按键排序输出；时间戳使用批次精度。
//! measurement、tag 与 field 键中的换行 / 回车转义为两字符序列 `\\n` / `\\r`，
//! 任何 token 都不会结束一行；字符串字段值位于双引号内，原样保留。

use crate::models::{Batch, Point, Precision};
use domain::FieldValue;
use std::fmt::Write;

/// 编码整个批次（每点一行，以 `\n` 结尾）。
pub fn encode_batch(batch: &Batch) -> String {
    let precision = batch.config().precision;
    let mut out = String::new();
    for point in batch.points() {
        encode_point(&mut out, point, precision);
        out.push('\n');
    }
    out
}

/// 编码单个点（不含换行）。
pub fn encode_point(out: &mut String, point: &Point, precision: Precision) {
    escape_token(out, point.measurement(), &[',', ' ']);
    for (key, value) in point.tags() {
        // 空 tag 值在 line protocol 中不合法，直接省略
        if value.is_empty() {
            continue;
        }
        out.push(',');
        escape_token(out, key, &[',', '=', ' ']);
        out.push('=');
        escape_token(out, value, &[',', '=', ' ']);
    }
    out.push(' ');
    for (index, (key, value)) in point.fields().iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        escape_token(out, key, &[',', '=', ' ']);
        out.push('=');
        encode_field_value(out, value);
    }
    let _ = write!(out, " {}", precision.encode(&point.timestamp()));
}

fn encode_field_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Float(v) => {
            let _ = write!(out, "{}", v);
        }
        FieldValue::Bool(v) => {
            let _ = write!(out, "{}", v);
        }
        FieldValue::String(v) => {
            out.push('"');
            escape_into(out, v, &['"', '\\']);
            out.push('"');
        }
    }
}

fn escape_token(out: &mut String, value: &str, special: &[char]) {
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ch if special.contains(&ch) => {
                out.push('\\');
                out.push(ch);
            }
            ch => out.push(ch),
        }
    }
}

fn escape_into(out: &mut String, value: &str, special: &[char]) {
    for ch in value.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}
