//! JavaScript snippets run through [`crate::Driver::execute_script`]
//!
//! Every snippet is a WebDriver-style function body: parameters arrive as
//! `arguments[n]` and results are handed back with `return`. Element
//! arguments are passed as [`crate::ElementRef`]s and arrive as DOM nodes.

pub const GET_SCROLL_TOP: &str = "return document.documentElement.scrollTop";

/// `arguments[0]`: new scroll offset in CSS pixels
pub const SET_SCROLL_TOP: &str = "document.documentElement.scrollTop = arguments[0]";

pub const FULL_PAGE_HEIGHT: &str = "return document.documentElement.scrollHeight";
pub const FULL_PAGE_WIDTH: &str = "return document.documentElement.scrollWidth";
pub const CLIENT_HEIGHT: &str = "return document.documentElement.clientHeight";
pub const CLIENT_WIDTH: &str = "return document.documentElement.clientWidth";

/// `arguments[0]`: element; true when its box lies entirely in the viewport
pub const IS_ELEMENT_IN_VIEW: &str = r#"
var rect = arguments[0].getBoundingClientRect();
return (rect.top >= 0 && rect.left >= 0
    && rect.bottom <= (window.innerHeight || document.documentElement.clientHeight)
    && rect.right <= (window.innerWidth || document.documentElement.clientWidth));
"#;

/// `arguments[0]`: element
pub const SCROLL_INTO_VIEW: &str =
    "arguments[0].scrollIntoView({behavior: 'auto', block: 'center', inline: 'center'})";

/// `arguments[0]`: element, `arguments[1]`: name, `arguments[2]`: value
pub const SET_ATTRIBUTE: &str = "arguments[0].setAttribute(arguments[1], arguments[2])";

/// `arguments[0]`: element, `arguments[1]`: name
pub const REMOVE_ATTRIBUTE: &str = "arguments[0].removeAttribute(arguments[1])";

/// `arguments[0]`: element
pub const DISPATCH_CHANGE: &str = "arguments[0].dispatchEvent(new Event('change'))";

pub const JQUERY_IDLE: &str = "return window.jQuery === undefined || jQuery.active == 0";

/// `arguments[0]`: `#id` selector of the picker input, `arguments[1]`: ISO-8601 date
pub const PICKADATE_SET: &str = "$(arguments[0]).pickadate('picker').set('select', new Date(arguments[1]))";
