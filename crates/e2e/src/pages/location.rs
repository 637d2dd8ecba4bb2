//! Airport/city autocomplete resolution

use std::time::Duration;
use tracing::{debug, info};

use crate::automation::{Automation, DomCondition, ElementHandle, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::pages::locators::Locators;
use crate::retry::{retry_until_found, Retried, RetryPolicy};

pub struct LocationResolver<'a, A: Automation> {
    browser: &'a A,
    locators: &'a Locators,
    retry: RetryPolicy,
    timeout: Duration,
}

impl<'a, A: Automation> LocationResolver<'a, A> {
    pub fn new(
        browser: &'a A,
        locators: &'a Locators,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self { browser, locators, retry, timeout }
    }

    /// Type `query` into `input` and pick the first suggestion containing it.
    ///
    /// Returns the label of the row that was clicked.
    pub async fn enter_and_select(
        &self,
        input: &str,
        dropdown: &str,
        query: &str,
    ) -> E2eResult<String> {
        self.browser.type_text(input, query).await?;
        self.resolve_and_select(dropdown, query).await
    }

    /// Pick the first suggestion in `dropdown` whose label contains `query`.
    ///
    /// Matching is case-sensitive and follows rendered order. The rows are
    /// re-scanned on a miss to ride out late rendering.
    pub async fn resolve_and_select(&self, dropdown: &str, query: &str) -> E2eResult<String> {
        let item = &self.locators.dropdown_item;

        self.browser.wait_for(dropdown, WaitState::Visible, self.timeout).await?;
        self.browser.wait_for(item, WaitState::Visible, self.timeout).await?;
        self.browser
            .wait_for_condition(&DomCondition::all_interactable(item.as_str()), self.timeout)
            .await?;

        match retry_until_found(self.retry, query, |_| self.scan(query)).await? {
            Retried::Found { value, attempt } => {
                info!("Selected '{}' for query '{}' (attempt {})", value, query, attempt);
                Ok(value)
            }
            Retried::Exhausted { attempts } => Err(E2eError::LocationNotFound {
                query: query.to_string(),
                attempts,
            }),
        }
    }

    async fn scan(&self, query: &str) -> E2eResult<Option<String>> {
        let rows = self.browser.query_all(&self.locators.dropdown_item).await?;
        debug!("Scanning {} suggestion(s) for '{}'", rows.len(), query);

        for row in rows {
            let label = match row.child_text(&self.locators.dropdown_item_label).await? {
                Some(label) => label,
                None => row.text().await?,
            };

            if label.contains(query) {
                row.click().await?;
                return Ok(Some(label));
            }
        }

        Ok(None)
    }
}
