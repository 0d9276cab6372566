//! 剪贴板封装：跨平台复制支持

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("clipboard error: {0}")]
    Clip(String),
}

/// 将复制载荷写入系统剪贴板（检视器唯一的对外副作用）
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    use copypasta::{ClipboardContext, ClipboardProvider};
    let mut ctx = ClipboardContext::new().map_err(|e| ClipboardError::Clip(e.to_string()))?;
    ctx.set_contents(text.to_string())
        .map_err(|e| ClipboardError::Clip(e.to_string()))
}

/// 从系统剪贴板获取文本（用于测试）
#[cfg(test)]
pub fn get_clipboard_contents() -> Result<String, ClipboardError> {
    use copypasta::{ClipboardContext, ClipboardProvider};
    let mut ctx = ClipboardContext::new().map_err(|e| ClipboardError::Clip(e.to_string()))?;
    ctx.get_contents()
        .map_err(|e| ClipboardError::Clip(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_roundtrip() {
        let payload = "{\n  \"title\": \"检视载荷\"\n}";

        // 无显示环境（CI）拿不到剪贴板上下文，此时跳过
        if copy_to_clipboard(payload).is_err() {
            return;
        }

        let contents = get_clipboard_contents().expect("从剪贴板读取应该成功");
        assert_eq!(contents, payload, "剪贴板内容应与复制的载荷一致");
    }
}
