//! In-memory driver used by the integration tests
//!
//! `FakeDriver` keeps a flat list of nodes and answers the crate's script
//! snippets directly, so helpers can be exercised without a browser.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use webdriver_tools::interact::scripts;
use webdriver_tools::{By, Driver, ElementRef, Error, Result, SessionConfig};

/// Colour of logical page row `row`; unique for the first 65536 rows
pub fn stripe(row: i64) -> Rgba<u8> {
    Rgba([(row % 256) as u8, ((row / 256) % 256) as u8, 0x40, 255])
}

#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub value: String,
    pub input_type: Option<String>,
    pub checked: bool,
    pub selected: bool,
    pub displayed: bool,
    pub in_view: bool,
    pub parent: Option<usize>,
    /// Clicks still to be intercepted before one lands
    pub intercepts: u32,
    /// Clicks fail with a non-retryable error
    pub stale: bool,
    pub clicks: u32,
    pub typed: Vec<String>,
    pub events: Vec<String>,
}

impl FakeNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            displayed: true,
            in_view: true,
            ..Default::default()
        }
    }

    pub fn input(input_type: &str) -> Self {
        Self { input_type: Some(input_type.to_string()), ..Self::new("input") }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn out_of_view(mut self) -> Self {
        self.in_view = false;
        self
    }

    pub fn child_of(mut self, parent: &ElementRef) -> Self {
        self.parent = Some(index(parent));
        self
    }

    pub fn intercepts(mut self, n: u32) -> Self {
        self.intercepts = n;
        self
    }

    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }
}

fn index(el: &ElementRef) -> usize {
    el.id.parse().expect("fake element ids are indices")
}

pub struct FakeDriver {
    pub nodes: Vec<FakeNode>,
    pub page_height: i64,
    pub page_width: i64,
    pub viewport_height: i64,
    pub dpr: f64,
    pub scroll_top: i64,
    pub captures: usize,
    pub fail_capture_at: Option<usize>,
    pub alerts: VecDeque<String>,
    pub visited: Vec<String>,
    pub current_url: String,
    pub title: String,
    pub ajax_polls: u32,
    pub pickadate: Vec<(String, String)>,
    pub closed: Arc<AtomicBool>,
}

impl FakeDriver {
    pub fn page(page_height: i64, viewport_height: i64) -> Self {
        Self {
            nodes: Vec::new(),
            page_height,
            page_width: 64,
            viewport_height,
            dpr: 1.0,
            scroll_top: 0,
            captures: 0,
            fail_capture_at: None,
            alerts: VecDeque::new(),
            visited: Vec::new(),
            current_url: "about:blank".to_string(),
            title: "Fake Page".to_string(),
            ajax_polls: 0,
            pickadate: Vec::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_dpr(mut self, dpr: f64) -> Self {
        self.dpr = dpr;
        self
    }

    pub fn add(&mut self, node: FakeNode) -> ElementRef {
        self.nodes.push(node);
        ElementRef::new((self.nodes.len() - 1).to_string())
    }

    pub fn node(&self, el: &ElementRef) -> &FakeNode {
        &self.nodes[index(el)]
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn node_mut(&mut self, el: &ElementRef) -> Result<&mut FakeNode> {
        let i: usize = el.id.parse().map_err(|_| Error::ElementError(format!("bad ref {}", el.id)))?;
        self.nodes
            .get_mut(i)
            .ok_or_else(|| Error::ElementError(format!("stale element reference: {}", el.id)))
    }

    fn element_arg(args: &[Value], i: usize) -> Result<ElementRef> {
        let v = args.get(i).cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(v)?)
    }

    fn max_scroll(&self) -> i64 {
        (self.page_height - self.viewport_height).max(0)
    }

    fn is_descendant(&self, mut node: usize, ancestor: usize) -> bool {
        while let Some(p) = self.nodes[node].parent {
            if p == ancestor {
                return true;
            }
            node = p;
        }
        false
    }

    fn toggle(&mut self, i: usize) {
        let kind = self.nodes[i].input_type.clone();
        match kind.as_deref() {
            Some("checkbox") => self.nodes[i].checked = !self.nodes[i].checked,
            Some("radio") => {
                let name = self.nodes[i].attrs.get("name").cloned();
                for other in self.nodes.iter_mut() {
                    if other.input_type.as_deref() == Some("radio") && other.attrs.get("name") == name.as_ref() {
                        other.checked = false;
                    }
                }
                self.nodes[i].checked = true;
            }
            _ => {}
        }
    }

    fn render_viewport(&self) -> Result<Vec<u8>> {
        let width = (self.page_width as f64 * self.dpr).round() as u32;
        let height = (self.viewport_height as f64 * self.dpr).round() as u32;
        let top = self.scroll_top;
        let dpr = self.dpr;
        let img = RgbaImage::from_fn(width, height, |_, y| stripe(top + (y as f64 / dpr).floor() as i64));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}

impl Driver for FakeDriver {
    fn new(config: SessionConfig) -> Result<Self> {
        let metrics = config.device_metrics();
        let mut driver = FakeDriver::page(metrics.height as i64 * 3, metrics.height as i64);
        driver.page_width = 32;
        driver.dpr = metrics.dpr;
        Ok(driver)
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        self.visited.push(url.to_string());
        self.current_url = url.to_string();
        self.scroll_top = 0;
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        let url = self.current_url.clone();
        self.navigate(&url)
    }

    fn title(&mut self) -> Result<String> {
        Ok(self.title.clone())
    }

    fn current_url(&mut self) -> Result<String> {
        Ok(self.current_url.clone())
    }

    fn execute_script(&mut self, script: &str, args: &[Value]) -> Result<Value> {
        match script {
            s if s == scripts::GET_SCROLL_TOP => Ok(json!(self.scroll_top)),
            s if s == scripts::SET_SCROLL_TOP => {
                let top = args.first().and_then(Value::as_i64).unwrap_or(0);
                self.scroll_top = top.clamp(0, self.max_scroll());
                Ok(Value::Null)
            }
            s if s == scripts::FULL_PAGE_HEIGHT => Ok(json!(self.page_height)),
            s if s == scripts::FULL_PAGE_WIDTH => Ok(json!(self.page_width)),
            s if s == scripts::CLIENT_HEIGHT => Ok(json!(self.viewport_height)),
            s if s == scripts::CLIENT_WIDTH => Ok(json!(self.page_width)),
            s if s == scripts::IS_ELEMENT_IN_VIEW => {
                let el = Self::element_arg(args, 0)?;
                Ok(json!(self.node_mut(&el)?.in_view))
            }
            s if s == scripts::SCROLL_INTO_VIEW => {
                let el = Self::element_arg(args, 0)?;
                self.node_mut(&el)?.in_view = true;
                Ok(Value::Null)
            }
            s if s == scripts::SET_ATTRIBUTE => {
                let el = Self::element_arg(args, 0)?;
                let name = args[1].as_str().unwrap_or_default().to_string();
                let value = args[2].as_str().unwrap_or_default().to_string();
                let node = self.node_mut(&el)?;
                if name == "value" {
                    node.value = value.clone();
                }
                node.attrs.insert(name, value);
                Ok(Value::Null)
            }
            s if s == scripts::REMOVE_ATTRIBUTE => {
                let el = Self::element_arg(args, 0)?;
                let name = args[1].as_str().unwrap_or_default().to_string();
                self.node_mut(&el)?.attrs.remove(&name);
                Ok(Value::Null)
            }
            s if s == scripts::DISPATCH_CHANGE => {
                let el = Self::element_arg(args, 0)?;
                self.node_mut(&el)?.events.push("change".to_string());
                Ok(Value::Null)
            }
            s if s == scripts::JQUERY_IDLE => {
                if self.ajax_polls == 0 {
                    return Ok(json!(true));
                }
                self.ajax_polls -= 1;
                Ok(json!(false))
            }
            s if s == scripts::PICKADATE_SET => {
                let selector = args[0].as_str().unwrap_or_default().to_string();
                let date = args[1].as_str().unwrap_or_default().to_string();
                self.pickadate.push((selector, date));
                Ok(Value::Null)
            }
            other => Err(Error::ScriptError(format!("unsupported script: {}", other))),
        }
    }

    fn capture_viewport(&mut self) -> Result<Vec<u8>> {
        let n = self.captures;
        self.captures += 1;
        if self.fail_capture_at == Some(n) {
            return Err(Error::ScriptError("renderer crashed".into()));
        }
        self.render_viewport()
    }

    fn find_elements(&mut self, by: &By, parent: Option<&ElementRef>) -> Result<Vec<ElementRef>> {
        let scope = parent.map(index);
        let in_scope = |i: usize| scope.map_or(true, |p| self.is_descendant(i, p));

        let hits: Vec<usize> = match by {
            By::XPath(x) if x == ".." => scope.and_then(|p| self.nodes[p].parent).into_iter().collect(),
            By::XPath(x) if x == "child::*" => (0..self.nodes.len())
                .filter(|&i| scope.is_some() && self.nodes[i].parent == scope)
                .collect(),
            By::XPath(x) => {
                let text = x
                    .strip_prefix(".//*[text()=")
                    .and_then(|r| r.strip_suffix(']'))
                    .map(|lit| lit.trim_matches(|c| c == '\'' || c == '"').to_string())
                    .ok_or_else(|| Error::ScriptError(format!("unsupported xpath {}", x)))?;
                (0..self.nodes.len()).filter(|&i| in_scope(i) && self.nodes[i].text == text).collect()
            }
            _ => (0..self.nodes.len())
                .filter(|&i| in_scope(i))
                .filter(|&i| {
                    let n = &self.nodes[i];
                    match by {
                        By::Id(v) => n.id.as_deref() == Some(v.as_str()),
                        By::TagName(v) => n.tag.eq_ignore_ascii_case(v),
                        By::ClassName(v) => n.classes.iter().any(|c| c == v),
                        By::Name(v) => n.attrs.get("name") == Some(v),
                        By::Css(v) => match v.chars().next() {
                            Some('#') => n.id.as_deref() == Some(&v[1..]),
                            Some('.') => n.classes.iter().any(|c| *c == v[1..]),
                            _ => n.tag.eq_ignore_ascii_case(v),
                        },
                        By::XPath(_) => false,
                    }
                })
                .collect(),
        };
        Ok(hits.into_iter().map(|i| ElementRef::new(i.to_string())).collect())
    }

    fn attribute(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let node = self.node_mut(element)?;
        Ok(match name {
            "checked" => node.checked.then(|| "true".to_string()),
            "selected" => node.selected.then(|| "true".to_string()),
            "value" => Some(node.value.clone()),
            "id" => node.id.clone(),
            "class" => Some(node.classes.join(" ")),
            other => node.attrs.get(other).cloned(),
        })
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool> {
        Ok(self.node_mut(element)?.displayed)
    }

    fn click(&mut self, element: &ElementRef) -> Result<()> {
        let i = index(element);
        let node = self.node_mut(element)?;
        if node.stale {
            return Err(Error::ElementError(format!("stale element reference: {}", element.id)));
        }
        if node.intercepts > 0 {
            node.intercepts -= 1;
            return Err(Error::ClickIntercepted(format!("<div class=\"overlay\"> covers {}", element.id)));
        }
        node.clicks += 1;
        if node.tag == "option" {
            let parent = node.parent;
            for other in self.nodes.iter_mut().filter(|n| n.tag == "option" && n.parent == parent) {
                other.selected = false;
            }
            self.nodes[i].selected = true;
        } else {
            self.toggle(i);
        }
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<()> {
        let i = index(element);
        let node = self.node_mut(element)?;
        node.typed.push(text.to_string());
        if text == " " && matches!(node.input_type.as_deref(), Some("checkbox") | Some("radio")) {
            self.toggle(i);
        } else {
            node.value.push_str(text);
        }
        Ok(())
    }

    fn alert_text(&mut self) -> Result<Option<String>> {
        Ok(self.alerts.front().cloned())
    }

    fn accept_alert(&mut self) -> Result<()> {
        self.alerts.pop_front().map(|_| ()).ok_or(Error::NoAlertPresent)
    }

    fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
