//! Page objects for the flight-search site

pub mod calendar;
pub mod locators;
pub mod location;
pub mod search;
pub mod trip_type;

pub use calendar::{CalendarPaginator, SelectedDay};
pub use locators::Locators;
pub use location::LocationResolver;
pub use search::FlightSearchPage;
pub use trip_type::TripType;
