//! Flight-search E2E suite
//!
//! Page objects and a cucumber harness that drive a flight-search website
//! through Playwright:
//! - A persistent Playwright driver controlled over a JSON-lines protocol
//! - Page objects that only see the abstract [`Automation`] capability
//! - Month-paginated calendar selection with overlap trimming
//! - Autocomplete resolution with bounded re-scans
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              cucumber harness (tests/flight_search.rs)       │
//! │    given / when / then  ──1:1──▶  FlightSearchPage methods   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FlightSearchPage<A: Automation>                            │
//! │    ├── choose_trip_type(TripType)                           │
//! │    ├── search_departure / search_arrival ─▶ LocationResolver │
//! │    ├── select_one_way_date(n)            ─▶ CalendarPaginator│
//! │    └── click_search_button / wait_for_results               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Automation (trait)                                          │
//! │    └── PlaywrightSession ── stdin/stdout ──▶ node + playwright│
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod automation;
pub mod config;
pub mod error;
pub mod pages;
pub mod playwright;
pub mod retry;

#[cfg(test)]
pub(crate) mod fake;

pub use automation::{Automation, DomCondition, ElementHandle, WaitState};
pub use config::SuiteConfig;
pub use error::{E2eError, E2eResult};
pub use pages::{FlightSearchPage, TripType};
pub use playwright::{Browser, PlaywrightSession};
