//! A capture surface backed by any [`Driver`]

use serde_json::{json, Value};

use super::CaptureSurface;
use crate::interact::scripts;
use crate::{Driver, Error, Result};

/// Exposes the document scroll position of a driven page as a
/// [`CaptureSurface`]
pub struct DriverSurface<'a, D: Driver + ?Sized> {
    driver: &'a mut D,
}

impl<'a, D: Driver + ?Sized> DriverSurface<'a, D> {
    pub fn new(driver: &'a mut D) -> Self {
        Self { driver }
    }

    fn read_px(&mut self, script: &str) -> Result<i64> {
        let value = self.driver.execute_script(script, &[])?;
        px_from_value(&value).ok_or_else(|| Error::ScriptError(format!("expected a pixel value, got {}", value)))
    }
}

/// Browsers may report fractional pixels on scaled displays
pub(crate) fn px_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

impl<D: Driver + ?Sized> CaptureSurface for DriverSurface<'_, D> {
    fn scroll_top(&mut self) -> Result<i64> {
        self.read_px(scripts::GET_SCROLL_TOP)
    }

    fn set_scroll_top(&mut self, top: i64) -> Result<()> {
        self.driver.execute_script(scripts::SET_SCROLL_TOP, &[json!(top)])?;
        Ok(())
    }

    fn full_height(&mut self) -> Result<i64> {
        self.read_px(scripts::FULL_PAGE_HEIGHT)
    }

    fn viewport_height(&mut self) -> Result<i64> {
        self.read_px(scripts::CLIENT_HEIGHT)
    }

    fn capture_viewport(&mut self) -> Result<Vec<u8>> {
        self.driver.capture_viewport()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_values_accept_floats_and_strings() {
        assert_eq!(px_from_value(&json!(800)), Some(800));
        assert_eq!(px_from_value(&json!(799.6)), Some(800));
        assert_eq!(px_from_value(&json!(" 12 ")), Some(12));
        assert_eq!(px_from_value(&Value::Null), None);
    }
}
