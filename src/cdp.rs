//! Chrome DevTools Protocol driver implementation

use crate::{By, Driver, ElementRef, EmulationProfile, Error, Result, SessionConfig};
use headless_chrome::protocol::cdp::{Emulation, Page, DOM};
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use log::{debug, info};
use serde_json::{json, Value};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

// Script bodies are wrapped so element references travel in and out of the
// page as tagged DOM nodes and every result comes back as one JSON string.
const WRAP_HEAD: &str = r#"(function(){
var KEY = 'element-6066-11e4-a52e-4f735466cecf';
function revive(k, v) {
  if (v && typeof v === 'object' && typeof v[KEY] === 'string') {
    var el = document.querySelector('[data-wdt-ref="' + v[KEY] + '"]');
    if (!el) throw new Error('stale element reference: ' + v[KEY]);
    return el;
  }
  return v;
}
function refOf(el) {
  var id = el.getAttribute('data-wdt-ref');
  if (!id) {
    window.__wdt_seq = (window.__wdt_seq || 0) + 1;
    id = String(window.__wdt_seq);
    el.setAttribute('data-wdt-ref', id);
  }
  var r = {};
  r[KEY] = id;
  return r;
}
function pack(v) {
  if (v === undefined || v === null) return null;
  if (v instanceof Element) return refOf(v);
  if (Array.isArray(v) || v instanceof NodeList || v instanceof HTMLCollection) {
    return Array.prototype.map.call(v, pack);
  }
  if (typeof v === 'object') {
    var o = {};
    for (var k in v) {
      if (Object.prototype.hasOwnProperty.call(v, k)) o[k] = pack(v[k]);
    }
    return o;
  }
  return v;
}
try {
  var args = JSON.parse("#;

const WRAP_MID: &str = r#", revive);
  var result = (function() {
"#;

const WRAP_TAIL: &str = r#"
  }).apply(window, args);
  return JSON.stringify({ok: pack(result)});
} catch (e) {
  return JSON.stringify({error: String((e && e.message) || e)});
}
})()"#;

const FIND_ELEMENTS: &str = r#"
var by = arguments[0], value = arguments[1], root = arguments[2] || document;
switch (by) {
  case 'id': return root.querySelectorAll('[id="' + CSS.escape(value) + '"]');
  case 'css': return root.querySelectorAll(value);
  case 'tag': return root.getElementsByTagName(value);
  case 'class': return root.getElementsByClassName(value);
  case 'name': return root.querySelectorAll('[name="' + CSS.escape(value) + '"]');
  case 'xpath':
    var snap = document.evaluate(value, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    var out = [];
    for (var i = 0; i < snap.snapshotLength; i++) {
      if (snap.snapshotItem(i) instanceof Element) out.push(snap.snapshotItem(i));
    }
    return out;
}
throw new Error('unsupported locator strategy ' + by);
"#;

// `checked`, `selected` and `value` reflect live properties
const GET_ATTRIBUTE: &str = r#"
var el = arguments[0], name = arguments[1];
if (name === 'checked' || name === 'selected') return el[name] ? 'true' : null;
if (name === 'value' && el.value !== undefined) return String(el.value);
return el.getAttribute(name);
"#;

const IS_DISPLAYED: &str = r#"
var el = arguments[0];
if (!el.isConnected) return false;
var s = window.getComputedStyle(el);
if (s.display === 'none' || s.visibility === 'hidden' || s.opacity === '0') return false;
var r = el.getBoundingClientRect();
return r.width > 0 && r.height > 0;
"#;

// Returns the markup of the element that would receive a click at the
// target's centre, or null when the target itself would
const INTERCEPTING_ELEMENT: &str = r#"
var el = arguments[0];
var r = el.getBoundingClientRect();
if (r.top < 0 || r.left < 0 || r.bottom > window.innerHeight || r.right > window.innerWidth) {
  el.scrollIntoView({block: 'center', inline: 'center'});
  r = el.getBoundingClientRect();
}
var top = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
if (top === null || top === el || el.contains(top)) return null;
return top.outerHTML.slice(0, 200);
"#;

// Options of a closed select have no box to click; select them directly
const SELECT_OPTION: &str = r#"
var el = arguments[0];
if (el.tagName !== 'OPTION') return false;
el.selected = true;
var select = el.closest('select');
if (select) {
  select.dispatchEvent(new Event('input', {bubbles: true}));
  select.dispatchEvent(new Event('change', {bubbles: true}));
}
return true;
"#;

const FOCUS: &str = "arguments[0].focus()";

const CURRENT_ALERT: &str =
    "return (window.__wdt_dialogs && window.__wdt_dialogs.length) ? window.__wdt_dialogs[0] : null";
const DISMISS_ALERT: &str = "return (window.__wdt_dialogs && window.__wdt_dialogs.length) ? window.__wdt_dialogs.shift() : null";

// Installed in every document: alert/confirm are queued instead of blocking
// the page, so tests can read and close them like WebDriver alerts
const DIALOG_QUEUE: &str = r#"(function(){
  window.__wdt_dialogs = window.__wdt_dialogs || [];
  window.alert = function(m) { window.__wdt_dialogs.push(m === undefined ? '' : String(m)); };
  window.confirm = function(m) { window.__wdt_dialogs.push(m === undefined ? '' : String(m)); return true; };
})();"#;

/// Driver backed by headless Chrome (uses the `headless_chrome` crate)
///
/// Launches one Chrome instance with one tab, applies the session's
/// emulation profile and drives the tab through the DevTools protocol.
pub struct CdpDriver {
    browser: Browser,
    tab: Arc<Tab>,
    config: SessionConfig,
}

impl CdpDriver {
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn evaluate(&self, body: &str, args: &[Value]) -> Result<Value> {
        let expression = wrap_script(body, args)?;
        let result = self
            .tab
            .evaluate(&expression, false)
            .map_err(|e| Error::ScriptError(format!("Evaluation failed: {}", e)))?;

        let raw = match result.value {
            Some(Value::String(s)) => s,
            other => {
                return Err(Error::ScriptError(format!(
                    "Unexpected evaluation result: {:?}",
                    other
                )))
            }
        };
        unwrap_envelope(serde_json::from_str(&raw)?)
    }

    fn element(&self, el: &ElementRef) -> Result<Element<'_>> {
        self.tab
            .find_element(&ref_selector(el))
            .map_err(|e| Error::ElementError(format!("stale element reference {}: {}", el.id, e)))
    }

    fn apply_emulation(tab: &Tab, config: &SessionConfig) -> Result<()> {
        if config.profile != EmulationProfile::Mobile {
            return Ok(());
        }
        let metrics = config.device_metrics();
        let params: Emulation::SetDeviceMetricsOverride = serde_json::from_value(json!({
            "width": metrics.width,
            "height": metrics.height,
            "deviceScaleFactor": metrics.dpr,
            "mobile": metrics.mobile,
        }))?;
        tab.call_method(params)
            .map_err(|e| Error::InitializationError(format!("Failed to emulate device metrics: {}", e)))?;

        let touch: Emulation::SetTouchEmulationEnabled =
            serde_json::from_value(json!({ "enabled": metrics.touch }))?;
        tab.call_method(touch)
            .map_err(|e| Error::InitializationError(format!("Failed to enable touch emulation: {}", e)))?;

        if let Some(ua) = &config.mobile_user_agent {
            tab.set_user_agent(ua, None, None)
                .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;
        }
        Ok(())
    }
}

/// Selector of the DOM node tagged for `el`
fn ref_selector(el: &ElementRef) -> String {
    format!("[data-wdt-ref=\"{}\"]", el.id)
}

/// Wrap a WebDriver-style script body for `Runtime.evaluate`
fn wrap_script(body: &str, args: &[Value]) -> Result<String> {
    let args_json = serde_json::to_string(args)?;
    // A JSON string literal is also a valid JavaScript string literal
    let args_literal = serde_json::to_string(&args_json)?;
    Ok([WRAP_HEAD, &args_literal, WRAP_MID, body, WRAP_TAIL].concat())
}

fn unwrap_envelope(envelope: Value) -> Result<Value> {
    if let Some(err) = envelope.get("error") {
        let msg = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        if msg.starts_with("stale element reference") {
            return Err(Error::ElementError(msg));
        }
        return Err(Error::ScriptError(msg));
    }
    Ok(envelope.get("ok").cloned().unwrap_or(Value::Null))
}

impl Driver for CdpDriver {
    fn new(config: SessionConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let metrics = config.device_metrics();
        let window = match config.profile {
            EmulationProfile::Desktop => config.desktop_window,
            EmulationProfile::Mobile => config.mobile_window,
        };
        let position_arg = window.map(|w| format!("--window-position={},{}", w.x, w.y));
        let mut args: Vec<&OsStr> = Vec::new();
        if let Some(arg) = &position_arg {
            args.push(OsStr::new(arg));
        }

        // Configure Chrome launch options
        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((metrics.width, metrics.height)))
            .ignore_certificate_errors(config.accept_insecure_certs)
            .idle_browser_timeout(Duration::from_millis(config.timeout_ms.max(600_000)))
            .args(args)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        Self::apply_emulation(&tab, &config)?;

        let headers = config.effective_headers();
        if !headers.is_empty() {
            // headless_chrome expects a HashMap<&str, &str>
            let headers: std::collections::HashMap<&str, &str> =
                headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            tab.set_extra_http_headers(headers)
                .map_err(|e| Error::InitializationError(format!("Failed to set headers: {}", e)))?;
        }

        tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
            source: DIALOG_QUEUE.to_string(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        })
        .map_err(|e| Error::InitializationError(format!("Failed to install dialog queue: {}", e)))?;

        info!(
            "Launched Chrome ({:?}, {}x{} @{}x, headless: {})",
            config.profile, metrics.width, metrics.height, metrics.dpr, config.headless
        );

        Ok(Self { browser, tab, config })
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::NavigationError(format!("Navigation to {} failed: {}", url, e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::NavigationError(format!("Wait for navigation failed: {}", e)))?;
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.tab
            .reload(false, None)
            .map_err(|e| Error::NavigationError(format!("Reload failed: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::NavigationError(format!("Wait for reload failed: {}", e)))?;
        Ok(())
    }

    fn title(&mut self) -> Result<String> {
        self.tab
            .get_title()
            .map_err(|e| Error::ScriptError(format!("Failed to get title: {}", e)))
    }

    fn current_url(&mut self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    fn execute_script(&mut self, script: &str, args: &[Value]) -> Result<Value> {
        self.evaluate(script, args)
    }

    fn capture_viewport(&mut self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| Error::ScriptError(format!("Screenshot failed: {}", e)))
    }

    fn find_elements(&mut self, by: &By, parent: Option<&ElementRef>) -> Result<Vec<ElementRef>> {
        let root = parent.map(ElementRef::to_script_arg).unwrap_or(Value::Null);
        let found = self.evaluate(FIND_ELEMENTS, &[json!(by.strategy()), json!(by.value()), root])?;
        Ok(serde_json::from_value(found)?)
    }

    fn attribute(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = self.evaluate(GET_ATTRIBUTE, &[element.to_script_arg(), json!(name)])?;
        Ok(serde_json::from_value(value)?)
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool> {
        let value = self.evaluate(IS_DISPLAYED, &[element.to_script_arg()])?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn click(&mut self, element: &ElementRef) -> Result<()> {
        if self.evaluate(SELECT_OPTION, &[element.to_script_arg()])? == Value::Bool(true) {
            return Ok(());
        }
        let blocker = self.evaluate(INTERCEPTING_ELEMENT, &[element.to_script_arg()])?;
        if let Value::String(html) = blocker {
            return Err(Error::ClickIntercepted(format!(
                "element {} is not clickable, other element would receive the click: {}",
                element.id, html
            )));
        }
        self.element(element)?
            .click()
            .map_err(|e| Error::ElementError(format!("Click failed: {}", e)))?;
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<()> {
        self.evaluate(FOCUS, &[element.to_script_arg()])?;
        self.tab
            .type_str(text)
            .map_err(|e| Error::ElementError(format!("Typing failed: {}", e)))?;
        Ok(())
    }

    fn upload_file(&mut self, element: &ElementRef, path: &str) -> Result<()> {
        let node = self.element(element)?.backend_node_id;
        let params: DOM::SetFileInputFiles = serde_json::from_value(json!({
            "files": [path],
            "backendNodeId": node,
        }))?;
        self.tab
            .call_method(params)
            .map_err(|e| Error::ElementError(format!("Setting input files failed: {}", e)))?;
        debug!("Attached {} to element {}", path, element.id);
        Ok(())
    }

    fn alert_text(&mut self) -> Result<Option<String>> {
        Ok(serde_json::from_value(self.evaluate(CURRENT_ALERT, &[])?)?)
    }

    fn accept_alert(&mut self) -> Result<()> {
        match self.evaluate(DISMISS_ALERT, &[])? {
            Value::Null => Err(Error::NoAlertPresent),
            _ => Ok(()),
        }
    }

    fn close(self) -> Result<()> {
        // Drop tab before browser so the child process is terminated promptly
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
