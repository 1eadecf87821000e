//! 文案模板引擎
//!
//! 提供模板变量替换功能，支持 `{{variable}}` 语法（变量名两侧允许空格）。
//!
//! ## 使用示例
//!
//! ```ignore
//! let engine = TemplateEngine::new();
//!
//! let mut context = HashMap::new();
//! context.insert("first_name".to_string(), "Ivan".to_string());
//!
//! let rendered = engine.render("Привет, {{ first_name }}!", &context);
//! // 输出: "Привет, Ivan!"
//! ```

use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

/// 模板引擎
///
/// 对存储在文本块里的富文本做变量替换
pub struct TemplateEngine {
    /// 变量匹配正则
    variable_regex: Regex,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            // 匹配 {{variable_name}} 格式，变量名支持字母、数字、下划线
            variable_regex: Regex::new(r"\{\{\s*(\w+)\s*\}\}").unwrap(),
        }
    }

    /// 渲染模板
    ///
    /// 未提供的变量替换为空字符串并记录警告
    pub fn render(&self, template: &str, context: &HashMap<String, String>) -> String {
        self.variable_regex
            .replace_all(template, |caps: &regex::Captures| {
                let name = &caps[1];
                match context.get(name) {
                    Some(value) => value.clone(),
                    None => {
                        warn!(variable = name, "模板变量未提供");
                        String::new()
                    }
                }
            })
            .into_owned()
    }
}
