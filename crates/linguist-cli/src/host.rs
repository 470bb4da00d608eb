//! Host effects for a headless process: nothing to draw, so they are logged.

use async_trait::async_trait;
use tracing::info;

use linguist_background::{ContextMenu, ThemeControl};
use linguist_config::AppIconConfig;

pub struct LoggingTheme;

#[async_trait]
impl ThemeControl for LoggingTheme {
    async fn set_app_icon(&self, icon: &AppIconConfig) -> anyhow::Result<()> {
        info!(icon = ?icon.icon_type, "app icon changed");
        Ok(())
    }
}

pub struct LoggingContextMenu {
    name: &'static str,
}

impl LoggingContextMenu {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl ContextMenu for LoggingContextMenu {
    async fn enable(&self) -> anyhow::Result<()> {
        info!(menu = self.name, "context menu enabled");
        Ok(())
    }

    async fn disable(&self) -> anyhow::Result<()> {
        info!(menu = self.name, "context menu disabled");
        Ok(())
    }
}
