//! Page object for the flight-search homepage

use regex::Regex;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::automation::{Automation, WaitState};
use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::pages::calendar::{CalendarPaginator, SelectedDay};
use crate::pages::location::LocationResolver;
use crate::pages::trip_type::TripType;
use crate::playwright::PlaywrightSession;

const RESULTS_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Domain-level operations on the search form, issued through one browser page
#[derive(Debug)]
pub struct FlightSearchPage<A: Automation> {
    browser: A,
    config: SuiteConfig,
    results_pattern: Regex,
}

impl<A: Automation> FlightSearchPage<A> {
    pub fn new(browser: A, config: SuiteConfig) -> E2eResult<Self> {
        let results_pattern = Regex::new(&config.results_url_pattern)?;
        Ok(Self {
            browser,
            config,
            results_pattern,
        })
    }

    pub fn browser(&self) -> &A {
        &self.browser
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        self.config.timeouts.default_timeout()
    }

    fn calendar(&self) -> CalendarPaginator<'_, A> {
        CalendarPaginator::new(
            &self.browser,
            &self.config.locators,
            self.config.calendar,
            self.timeout(),
        )
    }

    fn locations(&self) -> LocationResolver<'_, A> {
        LocationResolver::new(
            &self.browser,
            &self.config.locators,
            self.config.location_retry.into(),
            self.timeout(),
        )
    }

    async fn wait_and_click(&self, selector: &str) -> E2eResult<()> {
        self.browser.wait_for(selector, WaitState::Visible, self.timeout()).await?;
        self.browser.click(selector).await
    }

    pub async fn open_homepage(&self) -> E2eResult<()> {
        info!("Opening {}", self.config.base_url);
        self.browser.goto(&self.config.base_url).await
    }

    /// Dismiss the consent banner if it is showing
    pub async fn accept_cookies(&self) -> E2eResult<()> {
        let button = &self.config.locators.cookie_button;
        if self.browser.is_visible(button).await? {
            debug!("Accepting cookies");
            self.browser.click(button).await?;
        }
        Ok(())
    }

    /// Remove the origin the site pre-fills from geolocation
    pub async fn close_place_picker(&self) -> E2eResult<()> {
        let locators = &self.config.locators;
        if self.browser.is_visible(&locators.place_picker).await? {
            debug!("Clearing pre-filled origin");
            self.browser.click(&locators.place_picker_close_button).await?;
            self.browser
                .wait_for(&locators.place_picker, WaitState::Detached, self.timeout())
                .await?;
        }
        Ok(())
    }

    pub async fn search_departure(&self, origin: &str) -> E2eResult<String> {
        self.close_place_picker().await?;
        let locators = &self.config.locators;
        self.locations()
            .enter_and_select(&locators.origin_input, &locators.origin_dropdown, origin)
            .await
    }

    pub async fn search_arrival(&self, destination: &str) -> E2eResult<String> {
        let locators = &self.config.locators;
        self.locations()
            .enter_and_select(
                &locators.destination_input,
                &locators.destination_dropdown,
                destination,
            )
            .await
    }

    pub async fn search_flights(&self, origin: &str, destination: &str) -> E2eResult<()> {
        self.search_departure(origin).await?;
        self.search_arrival(destination).await?;
        Ok(())
    }

    pub async fn choose_trip_type(&self, trip_type: TripType) -> E2eResult<()> {
        info!("Choosing trip type {}", trip_type);
        let locators = &self.config.locators;
        self.wait_and_click(&locators.trip_type_dropdown).await?;
        self.browser
            .click(&trip_type.option_selector(&locators.trip_type_option))
            .await
    }

    /// Pick the departure day `days_ahead` selectable days after the first one
    pub async fn select_one_way_date(&self, days_ahead: usize) -> E2eResult<SelectedDay> {
        let locators = &self.config.locators;

        self.browser.click(&locators.departure_date_input).await?;
        self.browser
            .wait_for(&locators.calendar, WaitState::Visible, self.timeout())
            .await?;
        self.browser
            .wait_for(&locators.calendar_container, WaitState::Visible, self.timeout())
            .await?;

        let selected = self.calendar().select_day(days_ahead).await?;

        self.wait_and_click(&locators.set_dates_button).await?;
        Ok(selected)
    }

    pub async fn click_booking_checkbox(&self) -> E2eResult<()> {
        self.browser.click(&self.config.locators.booking_checkbox).await
    }

    pub async fn click_search_button(&self) -> E2eResult<()> {
        info!("Submitting search");
        self.wait_and_click(&self.config.locators.search_button).await
    }

    /// Wait until the page lands on a search-results URL
    pub async fn wait_for_results(&self) -> E2eResult<String> {
        let limit = self.config.timeouts.results();
        let start = Instant::now();

        loop {
            let url = self.browser.current_url().await?;
            if self.results_pattern.is_match(&url) {
                info!("Search results at {}", url);
                return Ok(url);
            }
            if start.elapsed() >= limit {
                return Err(E2eError::Timeout(format!(
                    "results page matching '{}' (last URL {})",
                    self.results_pattern, url
                )));
            }
            sleep(RESULTS_POLL_INTERVAL.min(limit)).await;
        }
    }

    pub async fn verify_results_page(&self) -> E2eResult<()> {
        let url = self.browser.current_url().await?;
        if self.results_pattern.is_match(&url) {
            Ok(())
        } else {
            Err(E2eError::AssertionFailed(format!(
                "User was not redirected to search results page (at {})",
                url
            )))
        }
    }

    pub async fn capture_screenshot(&self, path: &Path) -> E2eResult<()> {
        self.browser.screenshot(path).await?;
        info!("Screenshot saved to {}", path.display());
        Ok(())
    }
}

impl FlightSearchPage<PlaywrightSession> {
    /// Launch a browser for `config` and wrap it in a page object
    pub async fn launch(config: SuiteConfig) -> E2eResult<Self> {
        let session = PlaywrightSession::launch((&config).into()).await?;
        Self::new(session, config)
    }

    pub async fn close(&self) -> E2eResult<()> {
        self.browser.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{overlapping_months, Action, FakeBrowser};
    use crate::pages::locators::Locators;

    const RESULTS_URL: &str = "https://www.kiwi.com/en/search/results/rotterdam/madrid/2026-10-23/no-return";

    fn page(browser: &FakeBrowser) -> FlightSearchPage<FakeBrowser> {
        let mut config = SuiteConfig::default();
        config.location_retry.delay_ms = 0;
        config.timeouts.results_ms = 50;
        config.calendar.render_poll_ms = 0;
        FlightSearchPage::new(browser.clone(), config).unwrap()
    }

    #[tokio::test]
    async fn test_choose_trip_type_issues_two_clicks() {
        let browser = FakeBrowser::new();
        let locators = Locators::default();

        page(&browser).choose_trip_type(TripType::OneWay).await.unwrap();

        assert_eq!(
            browser.clicks(),
            vec![
                Action::Click(locators.trip_type_dropdown.clone()),
                Action::Click(r#"a[data-test="ModePopupOption-oneWay"]"#.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_accept_cookies_only_when_shown() {
        let locators = Locators::default();

        let hidden = FakeBrowser::new();
        page(&hidden).accept_cookies().await.unwrap();
        assert!(hidden.clicks().is_empty());

        let shown = FakeBrowser::new().with_visible(&locators.cookie_button);
        page(&shown).accept_cookies().await.unwrap();
        assert_eq!(shown.clicks(), vec![Action::Click(locators.cookie_button.clone())]);
    }

    #[tokio::test]
    async fn test_departure_clears_prefilled_origin() {
        let locators = Locators::default();
        let browser = FakeBrowser::new()
            .with_visible(&locators.place_picker)
            .hides_on(&locators.place_picker_close_button, &locators.place_picker)
            .with_rows(&["Rotterdam The Hague Airport RTM"]);

        let label = page(&browser).search_departure("RTM").await.unwrap();

        assert_eq!(label, "Rotterdam The Hague Airport RTM");
        assert_eq!(
            browser.actions(),
            vec![
                Action::Click(locators.place_picker_close_button.clone()),
                Action::Type(locators.origin_input.clone(), "RTM".to_string()),
                Action::ClickRow("Rotterdam The Hague Airport RTM".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_place_picker_that_never_detaches_times_out() {
        let locators = Locators::default();
        let browser = FakeBrowser::new().with_visible(&locators.place_picker);

        let err = page(&browser).search_departure("RTM").await.unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_search_flights_fills_both_ends() {
        let locators = Locators::default();
        let browser = FakeBrowser::new().with_rows(&["Anywhere RTM MAD"]);

        page(&browser).search_flights("RTM", "MAD").await.unwrap();

        let typed: Vec<Action> = browser
            .actions()
            .into_iter()
            .filter(|a| matches!(a, Action::Type(..)))
            .collect();
        assert_eq!(
            typed,
            vec![
                Action::Type(locators.origin_input.clone(), "RTM".to_string()),
                Action::Type(locators.destination_input.clone(), "MAD".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_select_one_way_date_flow() {
        let locators = Locators::default();
        let browser = FakeBrowser::new().with_calendar(overlapping_months(2, 6));

        let selected = page(&browser).select_one_way_date(7).await.unwrap();

        assert_eq!(selected.value.as_deref(), Some("d8"));
        assert_eq!(
            browser.clicks(),
            vec![
                Action::Click(locators.departure_date_input.clone()),
                Action::Click(locators.next_month_button.clone()),
                Action::ClickDay("d8".to_string()),
                Action::Click(locators.set_dates_button.clone()),
            ]
        );
    }

    #[tokio::test]
    async fn test_calendar_that_never_opens_is_timeout() {
        let locators = Locators::default();
        let browser = FakeBrowser::new()
            .with_calendar(overlapping_months(1, 6))
            .never_ready(&locators.calendar);

        let err = page(&browser).select_one_way_date(1).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(!browser.clicks().contains(&Action::ClickDay("d2".to_string())));
    }

    #[tokio::test]
    async fn test_search_lands_on_results() {
        let locators = Locators::default();
        let browser = FakeBrowser::new().navigates_on(&locators.search_button, RESULTS_URL);
        let page = page(&browser);

        page.click_search_button().await.unwrap();
        let url = page.wait_for_results().await.unwrap();

        assert_eq!(url, RESULTS_URL);
        page.verify_results_page().await.unwrap();
    }

    #[tokio::test]
    async fn test_results_wait_times_out_on_homepage() {
        let browser = FakeBrowser::new();
        let page = page(&browser);
        page.open_homepage().await.unwrap();

        let err = page.wait_for_results().await.unwrap_err();
        assert!(err.is_timeout());

        let err = page.verify_results_page().await.unwrap_err();
        assert!(matches!(err, E2eError::AssertionFailed(_)));
    }

    #[test]
    fn test_invalid_results_pattern_rejected() {
        let mut config = SuiteConfig::default();
        config.results_url_pattern = "[".to_string();

        let result = FlightSearchPage::new(FakeBrowser::new(), config);
        assert!(matches!(result, Err(E2eError::Regex(_))));
    }

    #[tokio::test]
    async fn test_capture_screenshot_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failure.png");

        page(&FakeBrowser::new()).capture_screenshot(&path).await.unwrap();

        assert!(path.exists());
    }
}
