//! Scripted in-memory browser for page-object tests

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use async_trait::async_trait;

use crate::automation::{Automation, DomCondition, ElementHandle, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::pages::locators::Locators;

/// Everything the page objects did, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Goto(String),
    Click(String),
    ClickDay(String),
    ClickRow(String),
    Type(String, String),
}

#[derive(Debug, Default)]
struct FakeState {
    visible: HashSet<String>,
    never_ready: HashSet<String>,
    actions: Vec<Action>,
    url: String,
    months: Vec<Vec<String>>,
    month: usize,
    stuck: bool,
    render_lag: usize,
    stale_reads: usize,
    rows: Vec<String>,
    rows_hidden_for: usize,
    row_scans: usize,
    navigate_on_click: HashMap<String, String>,
    hide_on_click: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeBrowser {
    state: Arc<Mutex<FakeState>>,
    locators: Locators,
}

impl FakeBrowser {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            locators: Locators::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Month pages of `data-value`s, served one per next-month click
    pub(crate) fn with_calendar(self, months: Vec<Vec<String>>) -> Self {
        self.state().months = months;
        self
    }

    pub(crate) fn with_rows(self, rows: &[&str]) -> Self {
        self.state().rows = rows.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Rows only render after `scans` empty scans
    pub(crate) fn rows_render_after(self, scans: usize) -> Self {
        self.state().rows_hidden_for = scans;
        self
    }

    pub(crate) fn with_visible(self, selector: &str) -> Self {
        self.state().visible.insert(selector.to_string());
        self
    }

    pub(crate) fn never_ready(self, selector: &str) -> Self {
        self.state().never_ready.insert(selector.to_string());
        self
    }

    /// Next-month clicks stop changing the calendar
    pub(crate) fn stuck_calendar(self) -> Self {
        self.state().stuck = true;
        self
    }

    /// The first `reads` calendar reads after each month change still show
    /// the previous month
    pub(crate) fn renders_late(self, reads: usize) -> Self {
        self.state().render_lag = reads;
        self
    }

    pub(crate) fn navigates_on(self, selector: &str, url: &str) -> Self {
        self.state()
            .navigate_on_click
            .insert(selector.to_string(), url.to_string());
        self
    }

    pub(crate) fn hides_on(self, clicked: &str, hidden: &str) -> Self {
        self.state()
            .hide_on_click
            .insert(clicked.to_string(), hidden.to_string());
        self
    }

    pub(crate) fn actions(&self) -> Vec<Action> {
        self.state().actions.clone()
    }

    /// Clicks of any kind, in order
    pub(crate) fn clicks(&self) -> Vec<Action> {
        self.actions()
            .into_iter()
            .filter(|a| !matches!(a, Action::Goto(_) | Action::Type(..)))
            .collect()
    }

    pub(crate) fn clicks_on(&self, selector: &str) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, Action::Click(s) if s == selector))
            .count()
    }

    pub(crate) fn row_scans(&self) -> usize {
        self.state().row_scans
    }

    fn pending(&self, what: &str) -> E2eResult<()> {
        if self.state().never_ready.contains(what) {
            return Err(E2eError::Timeout(what.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Automation for FakeBrowser {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> E2eResult<()> {
        let mut state = self.state();
        state.actions.push(Action::Goto(url.to_string()));
        state.url = url.to_string();
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        Ok(self.state().visible.contains(selector))
    }

    async fn wait_for(
        &self,
        selector: &str,
        state: WaitState,
        _timeout: Duration,
    ) -> E2eResult<()> {
        self.pending(selector)?;
        let still_there = self.state().visible.contains(selector);
        match state {
            WaitState::Detached | WaitState::Hidden if still_there => Err(E2eError::Timeout(
                format!("{} to be {}", selector, state.as_str()),
            )),
            _ => Ok(()),
        }
    }

    async fn wait_for_condition(
        &self,
        condition: &DomCondition,
        _timeout: Duration,
    ) -> E2eResult<()> {
        match condition {
            DomCondition::AllInteractable { selector } => self.pending(selector),
        }
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        let mut state = self.state();
        state.actions.push(Action::Click(selector.to_string()));

        if selector == self.locators.next_month_button && !state.stuck {
            state.month += 1;
            state.stale_reads = state.render_lag;
        }
        if let Some(url) = state.navigate_on_click.get(selector).cloned() {
            state.url = url;
        }
        if let Some(hidden) = state.hide_on_click.get(selector).cloned() {
            state.visible.remove(&hidden);
        }
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.state()
            .actions
            .push(Action::Type(selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> E2eResult<Vec<FakeElement>> {
        let mut state = self.state();

        if selector == self.locators.calendar_day {
            let shown = if state.stale_reads > 0 {
                state.stale_reads -= 1;
                state.month - 1
            } else {
                state.month
            };
            let month = state.months.get(shown).cloned().unwrap_or_default();
            return Ok(month
                .into_iter()
                .map(|value| FakeElement::day(&self.state, value))
                .collect());
        }

        if selector == self.locators.dropdown_item {
            state.row_scans += 1;
            if state.row_scans <= state.rows_hidden_for {
                return Ok(Vec::new());
            }
            return Ok(state
                .rows
                .iter()
                .map(|label| FakeElement::row(&self.state, label.clone()))
                .collect());
        }

        Ok(Vec::new())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.state().url.clone())
    }

    async fn screenshot(&self, path: &Path) -> E2eResult<()> {
        std::fs::write(path, b"fake-png")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum FakeKind {
    Day(String),
    Row(String),
}

#[derive(Debug, Clone)]
pub(crate) struct FakeElement {
    kind: FakeKind,
    state: Arc<Mutex<FakeState>>,
}

impl FakeElement {
    fn day(state: &Arc<Mutex<FakeState>>, value: String) -> Self {
        Self { kind: FakeKind::Day(value), state: Arc::clone(state) }
    }

    fn row(state: &Arc<Mutex<FakeState>>, label: String) -> Self {
        Self { kind: FakeKind::Row(label), state: Arc::clone(state) }
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn text(&self) -> E2eResult<String> {
        Ok(match &self.kind {
            FakeKind::Day(value) | FakeKind::Row(value) => value.clone(),
        })
    }

    async fn attribute(&self, name: &str) -> E2eResult<Option<String>> {
        Ok(match &self.kind {
            FakeKind::Day(value) if name == "data-value" => Some(value.clone()),
            _ => None,
        })
    }

    async fn click(&self) -> E2eResult<()> {
        let action = match &self.kind {
            FakeKind::Day(value) => Action::ClickDay(value.clone()),
            FakeKind::Row(label) => Action::ClickRow(label.clone()),
        };
        self.state.lock().unwrap().actions.push(action);
        Ok(())
    }

    async fn child_text(&self, _selector: &str) -> E2eResult<Option<String>> {
        Ok(match &self.kind {
            FakeKind::Row(label) => Some(label.clone()),
            FakeKind::Day(_) => None,
        })
    }
}

/// Consecutive month pages of `len` days where each page repeats the
/// previous page's last day first, like the real widget does
pub(crate) fn overlapping_months(count: usize, len: usize) -> Vec<Vec<String>> {
    let mut months = Vec::new();
    let mut day = 1;
    for _ in 0..count {
        let month: Vec<String> = (day..day + len).map(|d| format!("d{}", d)).collect();
        day += len - 1;
        months.push(month);
    }
    months
}
