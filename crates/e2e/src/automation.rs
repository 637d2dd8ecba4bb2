//! Abstract UI-automation capability consumed by the page objects
//!
//! Page objects only ever talk to a browser through [`Automation`], so they can
//! be driven by Playwright in a real run and by a scripted fake in unit tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::E2eResult;

/// Element state to wait for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

/// Predicates evaluated against the live DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomCondition {
    /// Every element matching `selector` is attached and laid out
    AllInteractable { selector: String },
}

impl DomCondition {
    pub fn all_interactable(selector: impl Into<String>) -> Self {
        DomCondition::AllInteractable { selector: selector.into() }
    }
}

impl std::fmt::Display for DomCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomCondition::AllInteractable { selector } => {
                write!(f, "all '{}' interactable", selector)
            }
        }
    }
}

/// A single open browser page
#[async_trait]
pub trait Automation: Send + Sync {
    type Element: ElementHandle;

    async fn goto(&self, url: &str) -> E2eResult<()>;

    async fn is_visible(&self, selector: &str) -> E2eResult<bool>;

    /// Block until `selector` reaches `state`, or fail with `E2eError::Timeout`
    async fn wait_for(&self, selector: &str, state: WaitState, timeout: Duration) -> E2eResult<()>;

    async fn wait_for_condition(
        &self,
        condition: &DomCondition,
        timeout: Duration,
    ) -> E2eResult<()>;

    async fn click(&self, selector: &str) -> E2eResult<()>;

    async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()>;

    /// All elements matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> E2eResult<Vec<Self::Element>>;

    async fn current_url(&self) -> E2eResult<String>;

    async fn screenshot(&self, path: &Path) -> E2eResult<()>;
}

/// A reference to one element returned by [`Automation::query_all`]
#[async_trait]
pub trait ElementHandle: Send + Sync {
    async fn text(&self) -> E2eResult<String>;

    async fn attribute(&self, name: &str) -> E2eResult<Option<String>>;

    async fn click(&self) -> E2eResult<()>;

    /// Inner text of the first descendant matching `selector`
    async fn child_text(&self, selector: &str) -> E2eResult<Option<String>>;
}
