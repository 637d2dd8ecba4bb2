//! Selector strings for the flight-search homepage
//!
//! Selectors are opaque configuration: the page objects never inspect them,
//! only hand them to the automation backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locators {
    pub cookie_button: String,
    pub trip_type_dropdown: String,
    /// `{tag}` is replaced by the trip type's tag
    pub trip_type_option: String,
    pub origin_input: String,
    pub destination_input: String,
    pub origin_dropdown: String,
    pub destination_dropdown: String,
    pub dropdown_item: String,
    /// Looked up inside a dropdown row
    pub dropdown_item_label: String,
    pub place_picker: String,
    pub place_picker_close_button: String,
    pub departure_date_input: String,
    pub calendar: String,
    pub calendar_container: String,
    pub calendar_day: String,
    /// Attribute carrying a calendar day's date identifier
    pub calendar_day_value_attribute: String,
    pub next_month_button: String,
    pub set_dates_button: String,
    pub booking_checkbox: String,
    pub search_button: String,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            cookie_button: r#"button[data-test="CookiesPopup-Accept"]"#.to_string(),
            trip_type_dropdown: r#"div[data-test="SearchFormModesPicker-active-return"]"#.to_string(),
            trip_type_option: r#"a[data-test="ModePopupOption-{tag}"]"#.to_string(),
            origin_input: r#"div[data-test="SearchFieldItem-origin"] input[data-test="SearchField-input"]"#.to_string(),
            destination_input: r#"div[data-test="SearchFieldItem-destination"] input[data-test="SearchField-input"]"#.to_string(),
            origin_dropdown: r#"div[data-test="PlacepickerModalOpened-origin"] div[class="w-full"]"#.to_string(),
            destination_dropdown: r#"div[data-test="PlacepickerModalOpened-destination"] div[class="w-full"]"#.to_string(),
            dropdown_item: r#"div[data-test="PlacePickerRow-station"][role="button"]"#.to_string(),
            dropdown_item_label: "div.flex-1".to_string(),
            place_picker: r#"div[data-test="PlacePickerInputPlace"]"#.to_string(),
            place_picker_close_button: r#"div[data-test="PlacePickerInputPlace-close"]"#.to_string(),
            departure_date_input: r#"input[data-test="SearchFieldDateInput"][name="search-outboundDate"]"#.to_string(),
            calendar: r#"div[data-test="NewDatePickerOpen"]"#.to_string(),
            calendar_container: r#"div[data-test="CalendarContainer"]"#.to_string(),
            calendar_day: r#"div[data-test="CalendarDay"]"#.to_string(),
            calendar_day_value_attribute: "data-value".to_string(),
            next_month_button: r#"button[data-test="CalendarMoveNextButton"]"#.to_string(),
            set_dates_button: r#"button[data-test="SearchFormDoneButton"]"#.to_string(),
            booking_checkbox: "label.orbit-checkbox-label".to_string(),
            search_button: r#"a[data-test="LandingSearchButton"]"#.to_string(),
        }
    }
}
