//! 候选匹配器模型
//!
//! 编辑器的 DOM 会在不同版本之间变化。每个逻辑字段对应一个**有序**候选列表，
//! 解析时按顺序尝试，第一个命中的即为结果。

use std::fmt;

use serde::Deserialize;

use super::outcome::Phase;

/// 需要定位的逻辑字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// 标题输入框
    Title,
    /// 正文编辑区
    Body,
    /// "下書き保存" 按钮
    SaveDraft,
    /// "公開に進む" 按钮
    ProceedToPublish,
    /// "投稿する" 按钮
    ConfirmPublish,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Body => "body",
            Field::SaveDraft => "save-draft",
            Field::ProceedToPublish => "proceed-to-publish",
            Field::ConfirmPublish => "confirm-publish",
        }
    }

    /// 字段所属阶段
    pub fn phase(self) -> Phase {
        match self {
            Field::Title => Phase::Title,
            Field::Body => Phase::Body,
            Field::SaveDraft | Field::ProceedToPublish | Field::ConfirmPublish => Phase::Publish,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 单个候选规则
///
/// `nth` 是显式的位置策略：一个宽泛的选择器可能命中多个控件，
/// 取第几个由配置决定，而不是偶然取到第一个。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    /// CSS 选择器
    Css {
        css: String,
        #[serde(default)]
        nth: usize,
    },
    /// `within` 范围内、可见文本包含 `text` 的元素
    Text {
        text: String,
        #[serde(default = "default_text_scope")]
        within: String,
        #[serde(default)]
        nth: usize,
    },
}

fn default_text_scope() -> String {
    "button".to_string()
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            css: selector.into(),
            nth: 0,
        }
    }

    pub fn button_text(text: impl Into<String>) -> Self {
        Locator::Text {
            text: text.into(),
            within: default_text_scope(),
            nth: 0,
        }
    }

    /// 指定取第几个匹配
    pub fn nth(self, index: usize) -> Self {
        match self {
            Locator::Css { css, .. } => Locator::Css { css, nth: index },
            Locator::Text { text, within, .. } => Locator::Text {
                text,
                within,
                nth: index,
            },
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Locator::Css { nth, .. } | Locator::Text { nth, .. } => *nth,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { css, nth: 0 } => write!(f, "{}", css),
            Locator::Css { css, nth } => write!(f, "{} >> nth={}", css, nth),
            Locator::Text { text, within, nth: 0 } => write!(f, "{}:has-text(\"{}\")", within, text),
            Locator::Text { text, within, nth } => {
                write!(f, "{}:has-text(\"{}\") >> nth={}", within, text, nth)
            }
        }
    }
}

/// 一个逻辑字段的有序候选列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMatcher {
    pub field: Field,
    pub candidates: Vec<Locator>,
}

impl CandidateMatcher {
    pub fn new(field: Field, candidates: Vec<Locator>) -> Self {
        Self { field, candidates }
    }

    /// 标题栏默认候选（新版 UI 优先）
    ///
    /// 宽泛规则 `div[role="textbox"]` 取第一个匹配，标题总在正文之上。
    pub fn default_title() -> Self {
        Self::new(
            Field::Title,
            vec![
                Locator::css(r#"textarea[placeholder*="タイトル"]"#),
                Locator::css(r#"input[placeholder*="タイトル"]"#),
                Locator::css(r#"div[contenteditable="true"][data-placeholder*="タイトル"]"#),
                Locator::css(r#"div[contenteditable="true"][role="textbox"]"#),
                Locator::css(r#"h1[contenteditable="true"]"#),
                Locator::css(r#"div[data-testid*="title"]"#),
                Locator::css(r#"[data-slate-node="element"] h1"#),
                Locator::css(r#"div[role="textbox"]:not([aria-label*="本文"])"#),
            ],
        )
    }

    /// 正文默认候选
    ///
    /// 第一条规则排除了带标题占位符的可编辑区，取剩余中的第一个。
    pub fn default_body() -> Self {
        Self::new(
            Field::Body,
            vec![
                Locator::css(r#"div[contenteditable="true"]:not([data-placeholder*="タイトル"])"#),
                Locator::css(r#"div[role="textbox"][data-placeholder*="本文"]"#),
                Locator::css(r#"article div[contenteditable="true"]"#),
                Locator::css(r#"div[data-testid*="editor-body-input"]"#),
                Locator::css(r#"div[data-testid*="rich-text"]"#),
            ],
        )
    }

    pub fn default_save_draft() -> Self {
        Self::new(Field::SaveDraft, vec![Locator::button_text("下書き保存")])
    }

    pub fn default_proceed() -> Self {
        Self::new(Field::ProceedToPublish, vec![Locator::button_text("公開に進む")])
    }

    pub fn default_confirm() -> Self {
        Self::new(Field::ConfirmPublish, vec![Locator::button_text("投稿する")])
    }
}

/// 全部字段的候选列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    pub title: CandidateMatcher,
    pub body: CandidateMatcher,
    pub save_draft: CandidateMatcher,
    pub proceed: CandidateMatcher,
    pub confirm: CandidateMatcher,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            title: CandidateMatcher::default_title(),
            body: CandidateMatcher::default_body(),
            save_draft: CandidateMatcher::default_save_draft(),
            proceed: CandidateMatcher::default_proceed(),
            confirm: CandidateMatcher::default_confirm(),
        }
    }
}
