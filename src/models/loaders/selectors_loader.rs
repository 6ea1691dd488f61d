use crate::error::{AppError, AppResult, ConfigError};
use crate::models::matcher::{CandidateMatcher, Field, Locator, SelectorSet};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// TOML 中单个字段的候选覆盖
#[derive(Debug, Clone, Deserialize)]
pub struct FieldOverride {
    pub candidates: Vec<Locator>,
}

/// 选择器覆盖文件
///
/// 未出现的字段沿用内置默认候选
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorOverrides {
    pub title: Option<FieldOverride>,
    pub body: Option<FieldOverride>,
    pub save_draft: Option<FieldOverride>,
    pub proceed: Option<FieldOverride>,
    pub confirm: Option<FieldOverride>,
}

/// 从 TOML 文件加载选择器覆盖
pub async fn load_selector_overrides(toml_file_path: &Path) -> AppResult<SelectorOverrides> {
    let content = fs::read_to_string(toml_file_path).await.map_err(|e| {
        AppError::Config(ConfigError::SelectorFileUnreadable {
            path: toml_file_path.display().to_string(),
            reason: e.to_string(),
        })
    })?;

    parse_selector_overrides(&content, toml_file_path)
}

fn parse_selector_overrides(content: &str, path: &Path) -> AppResult<SelectorOverrides> {
    toml::from_str(content).map_err(|e| {
        AppError::Config(ConfigError::SelectorFileUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

/// 把覆盖合并进默认候选集
pub fn apply_overrides(mut set: SelectorSet, overrides: SelectorOverrides) -> AppResult<SelectorSet> {
    let pairs = [
        (Field::Title, overrides.title, &mut set.title),
        (Field::Body, overrides.body, &mut set.body),
        (Field::SaveDraft, overrides.save_draft, &mut set.save_draft),
        (Field::ProceedToPublish, overrides.proceed, &mut set.proceed),
        (Field::ConfirmPublish, overrides.confirm, &mut set.confirm),
    ];

    for (field, over, slot) in pairs {
        let Some(over) = over else { continue };
        if over.candidates.is_empty() {
            return Err(AppError::Config(ConfigError::EmptyCandidates { field }));
        }
        tracing::info!("字段 {} 使用自定义候选 {} 条", field, over.candidates.len());
        *slot = CandidateMatcher::new(field, over.candidates);
    }

    Ok(set)
}
