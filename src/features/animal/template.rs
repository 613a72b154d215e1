//! 素材片段模板（minijinja）。
//!
//! 片段中以 `{{ background }}`、`{{ fur }}`、`{{ shirt }}`、`{{ pants }}`、`{{ accent }}`
//! 引用颜色。所有片段在启动时编译进同一个 `Environment`，请求期只做渲染。

use std::collections::BTreeMap;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use super::color::ColorSet;

/// 已登记片段的句柄；实际内容保存在 [`TemplateSet`] 中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 全部片段模板。加载期写入，之后只读共享
#[derive(Debug)]
pub struct TemplateSet {
    env: Environment<'static>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateSet {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // 引用未知变量必须报错，不能静默输出空串
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // 颜色值只有 `#rrggbb`，片段本身就是 SVG，不做转义
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }

    /// 编译并登记片段；同名片段会被覆盖
    pub fn add(&mut self, name: &str, source: &str) -> Result<Template, String> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
            .map_err(|e| format!("模板编译失败: {e}"))?;
        Ok(Template {
            name: name.to_string(),
        })
    }

    /// 以颜色分类名为变量渲染片段
    pub fn render(&self, template: &Template, colors: &ColorSet) -> Result<String, minijinja::Error> {
        self.env
            .get_template(&template.name)?
            .render(color_context(colors))
    }
}

fn color_context(colors: &ColorSet) -> BTreeMap<&'static str, String> {
    colors
        .iter()
        .map(|(category, color)| (category.name(), color.to_html()))
        .collect()
}
