//! Calendar day selection across month pages
//!
//! The date picker renders one month page at a time. Consecutive pages may
//! share their boundary day, so after every month advance the new page is
//! trimmed past the previous page's last value before any counting happens.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::automation::{Automation, DomCondition, ElementHandle};
use crate::config::CalendarConfig;
use crate::error::{E2eError, E2eResult};
use crate::pages::locators::Locators;

/// One clickable calendar cell
#[derive(Debug)]
pub struct SelectableDay<E> {
    /// Opaque date identifier, unique within a page
    pub value: Option<String>,
    /// Index within the effective page
    pub position: usize,
    handle: E,
}

/// The days currently rendered, in reading order
#[derive(Debug)]
pub struct CalendarPage<E> {
    days: Vec<SelectableDay<E>>,
}

impl<E> CalendarPage<E> {
    fn new(days: Vec<(Option<String>, E)>) -> Self {
        Self {
            days: days
                .into_iter()
                .enumerate()
                .map(|(position, (value, handle))| SelectableDay { value, position, handle })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn days(&self) -> &[SelectableDay<E>] {
        &self.days
    }

    pub fn values(&self) -> Vec<Option<String>> {
        self.days.iter().map(|d| d.value.clone()).collect()
    }

    pub fn last_value(&self) -> Option<String> {
        self.days.last().and_then(|d| d.value.clone())
    }

    /// Drop every day up to and including the first one whose value is
    /// `boundary`. A page without `boundary` is kept whole.
    pub fn trim_after(self, boundary: &str) -> Self {
        let values = self.values();
        let start = overlap_end(&values, boundary);
        if start == 0 {
            return self;
        }

        Self::new(
            self.days
                .into_iter()
                .skip(start)
                .map(|d| (d.value, d.handle))
                .collect(),
        )
    }
}

/// Index just past the first day valued `boundary`, or 0 if it is absent
pub fn overlap_end(values: &[Option<String>], boundary: &str) -> usize {
    values
        .iter()
        .position(|v| v.as_deref() == Some(boundary))
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Same identified days as before. Pages without any value can't be told apart
fn is_unchanged(rendered: &[Option<String>], previous: &[Option<String>]) -> bool {
    rendered == previous && rendered.iter().any(Option::is_some)
}

/// The day that was clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDay {
    pub value: Option<String>,
    /// Month advances made before the click
    pub advances: usize,
    /// Position within the effective (trimmed) page
    pub position: usize,
}

/// Selects the day `N` selectable days after the first one shown
pub struct CalendarPaginator<'a, A: Automation> {
    browser: &'a A,
    locators: &'a Locators,
    bounds: CalendarConfig,
    timeout: Duration,
}

impl<'a, A: Automation> CalendarPaginator<'a, A> {
    pub fn new(
        browser: &'a A,
        locators: &'a Locators,
        bounds: CalendarConfig,
        timeout: Duration,
    ) -> Self {
        Self { browser, locators, bounds, timeout }
    }

    /// Click the day `target_offset` selectable days from the first one.
    ///
    /// The calendar must already be open.
    pub async fn select_day(&self, target_offset: usize) -> E2eResult<SelectedDay> {
        let (mut rendered, mut page) = self.load_page().await?;
        if page.is_empty() {
            return Err(E2eError::EmptyCalendar);
        }

        let mut boundary = page.last_value();
        let mut remaining = target_offset;
        let mut advances = 0;

        loop {
            if remaining < page.len() {
                return self.commit(page, remaining, advances).await;
            }

            if advances >= self.bounds.max_pages {
                return Err(E2eError::DayUnreachable {
                    offset: target_offset,
                    pages: advances + 1,
                });
            }

            remaining -= page.len();
            debug!(
                "Offset beyond page of {} day(s), advancing ({} left, boundary {:?})",
                page.len(),
                remaining,
                boundary
            );

            (rendered, page) = self.advance(&rendered, boundary.as_deref()).await?;
            advances += 1;

            // a month made only of known days keeps the old boundary
            if !page.is_empty() {
                boundary = page.last_value();
            }
        }
    }

    /// Values as rendered, and the page built from them
    async fn load_page(&self) -> E2eResult<(Vec<Option<String>>, CalendarPage<A::Element>)> {
        let selector = &self.locators.calendar_day;
        self.browser
            .wait_for_condition(&DomCondition::all_interactable(selector.as_str()), self.timeout)
            .await?;

        let mut days = Vec::new();
        for handle in self.browser.query_all(selector).await? {
            let value = handle
                .attribute(&self.locators.calendar_day_value_attribute)
                .await?;
            days.push((value, handle));
        }

        let page = CalendarPage::new(days);
        Ok((page.values(), page))
    }

    /// Click next-month once and return the new month, trimmed past `boundary`.
    ///
    /// The calendar is re-read up to `stall_retries` times until it stops
    /// showing `previous`. The trimmed page may be empty.
    async fn advance(
        &self,
        previous: &[Option<String>],
        boundary: Option<&str>,
    ) -> E2eResult<(Vec<Option<String>>, CalendarPage<A::Element>)> {
        let attempts = self.bounds.stall_retries.max(1);

        self.browser.click(&self.locators.next_month_button).await?;

        for attempt in 1..=attempts {
            if attempt > 1 && !self.bounds.render_poll().is_zero() {
                sleep(self.bounds.render_poll()).await;
            }

            let (rendered, page) = self.load_page().await?;
            if page.is_empty() {
                return Err(E2eError::EmptyCalendar);
            }

            if is_unchanged(&rendered, previous) {
                warn!("Calendar still shows the previous month ({}/{})", attempt, attempts);
                continue;
            }

            let page = match boundary {
                Some(boundary) => page.trim_after(boundary),
                None => page,
            };
            return Ok((rendered, page));
        }

        Err(E2eError::PaginationStalled { attempts })
    }

    async fn commit(
        &self,
        page: CalendarPage<A::Element>,
        position: usize,
        advances: usize,
    ) -> E2eResult<SelectedDay> {
        let day = page
            .days
            .into_iter()
            .nth(position)
            .ok_or(E2eError::EmptyCalendar)?;

        day.handle.click().await?;
        info!(
            "Selected calendar day {:?} (position {} after {} month advance(s))",
            day.value, position, advances
        );

        Ok(SelectedDay {
            value: day.value,
            advances,
            position,
        })
    }
}
