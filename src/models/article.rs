//! 文章模型
//!
//! 由外部生成步骤产出的 Markdown 文件解析而来

use std::path::Path;

use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::error::{AppError, AppResult, ArticleError};

/// 没有一级标题时使用的占位标题
pub const PLACEHOLDER_TITLE: &str = "タイトル（自動生成）";

/// 待发布文章
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// 完整 Markdown 原文
    pub body: String,
}

impl Article {
    /// 从 Markdown 文本构建文章
    pub fn from_markdown(markdown: &str) -> Self {
        let title = extract_title(markdown).unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());
        Self {
            title,
            body: markdown.to_string(),
        }
    }

    /// 读取 Markdown 文件
    pub async fn load(path: &Path) -> AppResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Article(ArticleError::ReadFailed {
                path: path.display().to_string(),
                source: e,
            })
        })?;

        if content.trim().is_empty() {
            return Err(AppError::Article(ArticleError::Empty {
                path: path.display().to_string(),
            }));
        }

        Ok(Self::from_markdown(&content))
    }

    /// 按字符数截断后的正文（不会切断多字节字符）
    pub fn capped_body(&self, max_chars: usize) -> &str {
        match self.body.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.body[..idx],
            None => &self.body,
        }
    }

    /// 截断后的正文渲染为 HTML
    pub fn capped_body_html(&self, max_chars: usize) -> String {
        render_html(self.capped_body(max_chars))
    }
}

/// 取第一个非空一级标题的纯文本
///
/// 按 Markdown 语法解析，代码块里的 `# ...` 不算标题。
pub fn extract_title(markdown: &str) -> Option<String> {
    let mut current: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => current = Some(String::new()),
            Event::Text(text) | Event::Code(text) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                let title = current.take().map(|t| t.trim().to_string()).unwrap_or_default();
                if !title.is_empty() {
                    return Some(title);
                }
            }
            _ => {}
        }
    }
    None
}

/// Markdown 渲染为 HTML
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_from_first_level_one_heading() {
        let article = Article::from_markdown("# Launch Day\nbody...");
        assert_eq!(article.title, "Launch Day");
        assert_eq!(article.body, "# Launch Day\nbody...");
    }

    #[test]
    fn placeholder_when_no_level_one_heading() {
        let article = Article::from_markdown("## Subsection\nplain text\n#hashtag");
        assert_eq!(article.title, PLACEHOLDER_TITLE);
    }

    #[test]
    fn heading_may_appear_after_front_matter() {
        let md = "intro line\n\n#   AIでnoteを自動投稿する方法  \n本文";
        assert_eq!(extract_title(md).as_deref(), Some("AIでnoteを自動投稿する方法"));
    }

    #[test]
    fn comments_inside_code_blocks_are_not_titles() {
        let md = "```bash\n# install deps\nnpm i\n```\n\n# Real **Title** with `code`\n";
        assert_eq!(extract_title(md).as_deref(), Some("Real Title with code"));

        let only_code = "    # indented code\n\n```\n# fenced\n```\n";
        assert_eq!(extract_title(only_code), None);
    }

    #[test]
    fn empty_heading_is_skipped() {
        assert_eq!(extract_title("#\n\n# Second\n").as_deref(), Some("Second"));
    }

    #[test]
    fn body_cap_counts_characters_not_bytes() {
        let article = Article::from_markdown("# t\nあいうえお");
        assert_eq!(article.capped_body(6), "# t\nあい");
        assert_eq!(article.capped_body(1000), article.body);
    }

    #[test]
    fn html_rendering_keeps_headings() {
        let html = render_html("# Title\n\n**bold**");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("article.md");
        tokio::fs::write(&path, "  \n").await.unwrap();
        let err = Article::load(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Article(ArticleError::Empty { .. })));
    }
}
