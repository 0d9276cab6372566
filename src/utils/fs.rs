//! IO helper: read inspection payloads from local files
//!
//! 检视器核心不持久化任何内容；读文件只是壳层替协作方喂值的方式。

use std::{fs::File, io::BufReader, path::Path};

use serde_json::Value;

use crate::model::viewer_core::ViewerError;

/// 从文件读取JSON数据（读完即得到内存Value，核心不再碰原始文本）
pub fn read_json_file(p: &Path) -> Result<Value, ViewerError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: Value = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 读取HTML片段文件为字符串
pub fn read_fragment_file(p: &Path) -> Result<String, ViewerError> {
    Ok(std::fs::read_to_string(p)?)
}
