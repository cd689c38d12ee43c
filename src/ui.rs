//! Host UI callbacks reachable from tools.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{ParleyError, Result};

/// Colour scheme of the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Side effects a tool may ask of the host application.
#[async_trait]
pub trait UiController: Send + Sync {
    /// Toggle the theme and return the one now in effect.
    async fn switch_theme(&self) -> Result<Theme>;
}

/// Headless host: every UI request fails as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUi;

#[async_trait]
impl UiController for NoUi {
    async fn switch_theme(&self) -> Result<Theme> {
        Err(ParleyError::UnsupportedOperation(
            "no user interface is attached to this session".into(),
        ))
    }
}

/// Terminal host that only tracks the theme in memory.
#[derive(Debug, Default)]
pub struct ConsoleUi {
    theme: Mutex<Theme>,
}

impl ConsoleUi {
    pub fn theme(&self) -> Theme {
        *self.theme.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UiController for ConsoleUi {
    async fn switch_theme(&self) -> Result<Theme> {
        let mut theme = self.theme.lock().unwrap_or_else(|e| e.into_inner());
        *theme = theme.toggled();
        tracing::info!(theme = %*theme, "Theme switched");
        Ok(*theme)
    }
}
