//! DOM interaction helpers
//!
//! [`Interact`] is implemented for every [`Driver`] and layers the everyday
//! test vocabulary (click, type, tick a checkbox, pick a select option, wait
//! for an element) on top of the driver primitives.

pub mod click;
pub mod scripts;
pub mod wait;

pub use click::{ClickOutcome, RetryPolicy};
pub use wait::Wait;

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use crate::screenshot::surface::px_from_value;
use crate::{By, Driver, ElementRef, Error, Result};

/// Polls after `scrollIntoView` before giving up on the element settling
const SCROLL_SETTLE_POLLS: u32 = 20;
/// Re-scroll attempts when the page moves the element away before a click
const CLICK_RESCROLL_ATTEMPTS: u32 = 10;

/// Quote `s` as an XPath string literal
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// High-level helpers available on every [`Driver`]
pub trait Interact: Driver + Sized {
    // --- presence and visibility ---

    /// The element exists in the DOM, visible or not
    fn is_element_present(&mut self, by: &By) -> Result<bool> {
        Ok(!self.find_elements(by, None)?.is_empty())
    }

    /// The element exists and is visible
    fn is_element_displayed(&mut self, by: &By) -> Result<bool> {
        match self.find_elements(by, None)?.first() {
            Some(el) => self.is_displayed(el),
            None => Ok(false),
        }
    }

    fn is_element_present_with_wait(&mut self, by: &By, wait: Wait) -> Result<bool> {
        wait.check(|| self.is_element_present(by))
    }

    fn is_element_displayed_with_wait(&mut self, by: &By, wait: Wait) -> Result<bool> {
        wait.check(|| self.is_element_displayed(by))
    }

    fn wait_for_element_displayed(&mut self, by: &By, wait: Wait) -> Result<()> {
        wait.until(|| self.is_element_displayed(by))
    }

    /// Wait for an existing element to become hidden
    fn wait_for_element_not_displayed(&mut self, by: &By, wait: Wait) -> Result<()> {
        let element = self.find_element(by)?;
        wait.until(|| Ok(!self.is_displayed(&element)?))
    }

    /// Wait until jQuery reports no active AJAX requests
    fn wait_for_jquery_ajax(&mut self, wait: Wait) -> Result<()> {
        wait.until(|| self.execute_typed_js::<bool>(scripts::JQUERY_IDLE, &[]))
    }

    // --- attributes and values ---

    fn get_attribute(&mut self, by: &By, name: &str) -> Result<Option<String>> {
        let element = self.find_element(by)?;
        self.attribute(&element, name)
    }

    fn get_value(&mut self, by: &By) -> Result<String> {
        Ok(self.get_attribute(by, "value")?.unwrap_or_default())
    }

    fn set_attribute(&mut self, by: &By, name: &str, value: &str) -> Result<()> {
        let element = self.find_element(by)?;
        self.execute_script(scripts::SET_ATTRIBUTE, &[element.to_script_arg(), json!(name), json!(value)])?;
        Ok(())
    }

    fn set_value(&mut self, by: &By, value: &str) -> Result<()> {
        self.set_attribute(by, "value", value)
    }

    fn remove_attribute(&mut self, by: &By, name: &str) -> Result<()> {
        let element = self.find_element(by)?;
        self.execute_script(scripts::REMOVE_ATTRIBUTE, &[element.to_script_arg(), json!(name)])?;
        Ok(())
    }

    fn get_element_id(&mut self, by: &By) -> Result<Option<String>> {
        self.get_attribute(by, "id")
    }

    fn class_list(&mut self, element: &ElementRef) -> Result<Vec<String>> {
        Ok(self
            .attribute(element, "class")?
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }

    fn has_class(&mut self, element: &ElementRef, class_name: &str) -> Result<bool> {
        Ok(self.class_list(element)?.iter().any(|c| c == class_name))
    }

    // --- typing ---

    fn set_text(&mut self, by: &By, text: &str) -> Result<()> {
        let element = self.find_element(by)?;
        self.send_keys(&element, text)
    }

    fn upload_file_to(&mut self, by: &By, path: &str) -> Result<()> {
        let element = self.find_element(by)?;
        self.upload_file(&element, path)
    }

    /// Select a radio item by pressing space on it
    fn set_radio_item(&mut self, by: &By) -> Result<()> {
        self.set_text(by, " ")
    }

    // --- checkboxes ---

    fn checkbox_is_checked(&mut self, by: &By) -> Result<bool> {
        Ok(self.get_attribute(by, "checked")?.is_some_and(|v| !v.is_empty()))
    }

    fn checkbox_toggle(&mut self, by: &By) -> Result<()> {
        self.set_text(by, " ")
    }

    fn checkbox_check(&mut self, by: &By) -> Result<()> {
        if !self.checkbox_is_checked(by)? {
            self.checkbox_toggle(by)?;
        }
        Ok(())
    }

    fn checkbox_uncheck(&mut self, by: &By) -> Result<()> {
        if self.checkbox_is_checked(by)? {
            self.checkbox_toggle(by)?;
        }
        Ok(())
    }

    // --- selects ---

    /// Click the `<option>` of `select` whose value is `value`
    fn select_option_by_value(&mut self, select: &By, value: &str) -> Result<()> {
        let select_el = self.find_element(select)?;
        let options = self.find_elements(&By::TagName("option".into()), Some(&select_el))?;
        for option in options {
            if self.attribute(&option, "value")?.as_deref() == Some(value) {
                return self.click(&option);
            }
        }
        Err(Error::ElementNotFound(format!("option with value '{}' in {}", value, select)))
    }

    fn select_selected_option(&mut self, select: &By) -> Result<Option<ElementRef>> {
        let select_el = self.find_element(select)?;
        let options = self.find_elements(&By::TagName("option".into()), Some(&select_el))?;
        for option in options {
            if self.attribute(&option, "selected")?.as_deref() == Some("true") {
                return Ok(Some(option));
            }
        }
        Ok(None)
    }

    fn select_value(&mut self, select: &By) -> Result<Option<String>> {
        match self.select_selected_option(select)? {
            Some(option) => self.attribute(&option, "value"),
            None => Ok(None),
        }
    }

    // --- scrolling ---

    fn is_element_in_view(&mut self, element: &ElementRef) -> Result<bool> {
        self.execute_typed_js(scripts::IS_ELEMENT_IN_VIEW, &[element.to_script_arg()])
    }

    /// Center the element in the viewport and give the page a moment to settle
    fn scroll_element_into_view(&mut self, element: &ElementRef) -> Result<()> {
        self.execute_script(scripts::SCROLL_INTO_VIEW, &[element.to_script_arg()])?;
        for _ in 0..SCROLL_SETTLE_POLLS {
            if self.is_element_in_view(element)? {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }

    fn scroll_into_view(&mut self, by: &By) -> Result<()> {
        let element = self.find_element(by)?;
        self.scroll_element_into_view(&element)
    }

    fn scroll_top(&mut self) -> Result<i64> {
        read_px(self, scripts::GET_SCROLL_TOP)
    }

    fn set_scroll_top(&mut self, top: i64) -> Result<()> {
        self.execute_script(scripts::SET_SCROLL_TOP, &[json!(top)])?;
        Ok(())
    }

    fn full_page_height(&mut self) -> Result<i64> {
        read_px(self, scripts::FULL_PAGE_HEIGHT)
    }

    fn full_page_width(&mut self) -> Result<i64> {
        read_px(self, scripts::FULL_PAGE_WIDTH)
    }

    fn client_height(&mut self) -> Result<i64> {
        read_px(self, scripts::CLIENT_HEIGHT)
    }

    fn client_width(&mut self) -> Result<i64> {
        read_px(self, scripts::CLIENT_WIDTH)
    }

    // --- clicking ---

    /// Scroll to the element and click it with the default retry policy
    fn click_element(&mut self, by: &By) -> Result<()> {
        self.click_element_with(by, RetryPolicy::default())
    }

    fn click_element_with(&mut self, by: &By, policy: RetryPolicy) -> Result<()> {
        let element = self.find_element(by)?;
        self.scroll_element_into_view(&element)?;
        // some pages run their own scroll on load and move the element away again
        for _ in 0..CLICK_RESCROLL_ATTEMPTS {
            if self.is_element_in_view(&element)? {
                break;
            }
            self.scroll_element_into_view(&element)?;
            std::thread::sleep(Duration::from_millis(20));
        }
        self.click_with_retry(&element, policy).into_result()
    }

    /// Click, retrying intercepted clicks within `policy`
    fn click_with_retry(&mut self, element: &ElementRef, policy: RetryPolicy) -> ClickOutcome {
        click::retry_click(policy, || self.click(element))
    }

    /// Wait for the element to appear, then click it; `false` if it never did
    fn wait_element_and_click_it(&mut self, by: &By, wait: Wait) -> Result<bool> {
        if self.is_element_present_with_wait(by, wait)? {
            self.click_element(by)?;
            return Ok(true);
        }
        Ok(false)
    }

    // --- traversal ---

    fn find_child_by_text(&mut self, parent: &ElementRef, text: &str) -> Result<ElementRef> {
        let xpath = format!(".//*[text()={}]", xpath_literal(text));
        self.find_child_element(parent, &By::XPath(xpath))
    }

    /// First element matching `by` whose attribute contains `needle`
    fn find_element_contains_attr_value(&mut self, by: &By, attribute: &str, needle: &str) -> Result<Option<ElementRef>> {
        for element in self.find_elements(by, None)? {
            if self.attribute(&element, attribute)?.is_some_and(|v| v.contains(needle)) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    fn parent_of(&mut self, element: &ElementRef) -> Result<ElementRef> {
        self.find_child_element(element, &By::XPath("..".into()))
    }

    fn children_of(&mut self, element: &ElementRef) -> Result<Vec<ElementRef>> {
        self.find_elements(&By::XPath("child::*".into()), Some(element))
    }

    fn first_displayed_by_class(&mut self, class_name: &str) -> Result<Option<ElementRef>> {
        for element in self.find_elements(&By::ClassName(class_name.into()), None)? {
            if self.is_displayed(&element)? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// Click the first visible element with the class; `false` when none is visible
    fn click_first_displayed_by_class(&mut self, class_name: &str) -> Result<bool> {
        match self.first_displayed_by_class(class_name)? {
            Some(element) => {
                self.scroll_element_into_view(&element)?;
                self.click_with_retry(&element, RetryPolicy::default()).into_result()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- events and widgets ---

    fn trigger_change_event(&mut self, by: &By) -> Result<()> {
        let element = self.find_element(by)?;
        self.execute_script(scripts::DISPATCH_CHANGE, &[element.to_script_arg()])?;
        Ok(())
    }

    /// Set the date of a pickadate.js picker
    fn set_pickadate_value(&mut self, picker: &By, date: DateTime<Utc>) -> Result<()> {
        let id = self
            .get_element_id(picker)?
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::ElementError(format!("date picker {} has no id", picker)))?;
        let iso = date.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.execute_script(scripts::PICKADATE_SET, &[json!(format!("#{}", id)), json!(iso)])?;
        Ok(())
    }

    // --- alerts ---

    fn is_alert_present(&mut self) -> Result<bool> {
        Ok(self.alert_text()?.is_some())
    }

    fn close_alert_and_get_text(&mut self) -> Result<String> {
        let text = self.alert_text()?.ok_or(Error::NoAlertPresent)?;
        self.accept_alert()?;
        Ok(text)
    }
}

impl<D: Driver> Interact for D {}

fn read_px<D: Driver>(driver: &mut D, script: &str) -> Result<i64> {
    let value = driver.execute_script(script, &[])?;
    px_from_value(&value).ok_or_else(|| Error::ScriptError(format!("expected a pixel value, got {}", value)))
}
