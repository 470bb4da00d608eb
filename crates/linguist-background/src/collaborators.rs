//! Host-side effects the background drives but does not implement.

use std::sync::Arc;

use async_trait::async_trait;

use linguist_config::AppIconConfig;
use linguist_translators::{TranslateScheduler, BUILTIN_TRANSLATORS};

/// Applies the configured application icon.
#[async_trait]
pub trait ThemeControl: Send + Sync {
    async fn set_app_icon(&self, icon: &AppIconConfig) -> anyhow::Result<()>;
}

/// A toggleable browser context menu entry.
#[async_trait]
pub trait ContextMenu: Send + Sync {
    async fn enable(&self) -> anyhow::Result<()>;
    async fn disable(&self) -> anyhow::Result<()>;
}

pub struct NoOpTheme;

#[async_trait]
impl ThemeControl for NoOpTheme {
    async fn set_app_icon(&self, _icon: &AppIconConfig) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct NoOpContextMenu;

#[async_trait]
impl ContextMenu for NoOpContextMenu {
    async fn enable(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn disable(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Everything the background needs from its host.
#[derive(Clone)]
pub struct Collaborators {
    pub scheduler: Arc<dyn TranslateScheduler>,
    pub theme: Arc<dyn ThemeControl>,
    pub selection_menu: Arc<dyn ContextMenu>,
    pub page_menu: Arc<dyn ContextMenu>,
    pub builtin_translators: Vec<String>,
}

impl Collaborators {
    /// Collaborators with no-op host effects and the shipped builtin engines.
    pub fn new(scheduler: Arc<dyn TranslateScheduler>) -> Self {
        Self {
            scheduler,
            theme: Arc::new(NoOpTheme),
            selection_menu: Arc::new(NoOpContextMenu),
            page_menu: Arc::new(NoOpContextMenu),
            builtin_translators: BUILTIN_TRANSLATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Use `theme` for app icon changes.
    pub fn with_theme(mut self, theme: Arc<dyn ThemeControl>) -> Self {
        self.theme = theme;
        self
    }

    /// Use the given translate-selection and translate-page menus.
    pub fn with_context_menus(mut self, selection: Arc<dyn ContextMenu>, page: Arc<dyn ContextMenu>) -> Self {
        self.selection_menu = selection;
        self.page_menu = page;
        self
    }

    /// Replace the builtin engine names.
    pub fn with_builtin_translators(mut self, names: Vec<String>) -> Self {
        self.builtin_translators = names;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguist_config::AppIconType;

    #[tokio::test]
    async fn noop_collaborators_succeed() {
        NoOpTheme
            .set_app_icon(&AppIconConfig { icon_type: AppIconType::Color })
            .await
            .unwrap();
        NoOpContextMenu.enable().await.unwrap();
        NoOpContextMenu.disable().await.unwrap();
    }
}
