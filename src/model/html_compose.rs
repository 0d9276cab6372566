//! 文档装配：把HTML片段包装成可独立渲染的最小文档
//!
//! 不做字符串级清洗，安全边界是隔离渲染上下文本身；这里只负责
//! 样式重置、链接跳出策略和最小的测高/图片失败上报钩子。

/// 固定样式重置：排版、图片约束、表格/代码块/引用的默认观感
const STYLE_RESET: &str = r#"
html, body { margin: 0; padding: 12px; }
body {
  font-family: -apple-system, "Segoe UI", "PingFang SC", "Microsoft YaHei", sans-serif;
  font-size: 14px;
  line-height: 1.6;
  color: #1f2937;
  word-break: break-word;
}
img { max-width: 100%; height: auto; }
table { border-collapse: collapse; width: 100%; }
table td, table th { border: 1px solid #d1d5db; padding: 4px 8px; }
pre { background: #f3f4f6; padding: 8px; overflow-x: auto; }
code { background: #f3f4f6; padding: 1px 4px; font-size: 13px; }
blockquote { margin: 8px 0; padding-left: 12px; border-left: 3px solid #d1d5db; color: #6b7280; }
"#;

/// 最小内部钩子：高度上报与图片加载失败转发。
/// 除此之外脚本一律不需要；隔离宿主收到消息后驱动Rust侧的
/// SizeSynchronizer / ImageFallbackResolver。
const BRIDGE_HOOKS: &str = r#"
new ResizeObserver(function () {
  window.parent.postMessage({ kind: "content-height", height: document.body.scrollHeight }, "*");
}).observe(document.body);
document.addEventListener("error", function (e) {
  if (e.target && e.target.tagName === "IMG") {
    window.parent.postMessage({ kind: "image-failed", url: e.target.dataset.originalSrc || e.target.src }, "*");
  }
}, true);
"#;

/// 把原始片段逐字作为body内容，装配成完整独立文档。
/// `<base target="_blank">` 强制所有超链接在新的顶层上下文打开，
/// 在被检视内容里点链接不会把宿主工具导航走。
pub fn compose_document(fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <base target=\"_blank\">\n<style>{}</style>\n<script>{}</script>\n\
         </head>\n<body>{}</body>\n</html>\n",
        STYLE_RESET, BRIDGE_HOOKS, fragment
    )
}

/// 去标签的纯文本退化渲染：无浏览器内核的宿主用它显示片段内容。
/// 只处理标签跳过与几个常见实体，属于平台替换而非内容清洗。
pub fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut chars = fragment.chars().peekable();
    let mut in_tag = false;

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                in_tag = true;
                // 块级标签结束换行，避免文本黏连
                let rest: String = chars.clone().take(12).collect();
                let lower = rest.to_lowercase();
                if lower.starts_with("/p")
                    || lower.starts_with("/div")
                    || lower.starts_with("br")
                    || lower.starts_with("/h")
                    || lower.starts_with("/li")
                    || lower.starts_with("/tr")
                {
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
            '>' if in_tag => in_tag = false,
            '&' if !in_tag => {
                let rest: String = chars.clone().take(6).collect();
                let (text, skip) = if rest.starts_with("amp;") {
                    ("&", 4)
                } else if rest.starts_with("lt;") {
                    ("<", 3)
                } else if rest.starts_with("gt;") {
                    (">", 3)
                } else if rest.starts_with("quot;") {
                    ("\"", 5)
                } else if rest.starts_with("nbsp;") {
                    (" ", 5)
                } else if rest.starts_with("#39;") {
                    ("'", 4)
                } else {
                    ("&", 0)
                };
                out.push_str(text);
                for _ in 0..skip {
                    chars.next();
                }
            }
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}
