//! Flag display component.
//!
//! `FlagView` is a framework-agnostic state machine:
//!
//! ```text
//! Loading --lookup ok-------> Ready
//!    |    --lookup failed---> NotFound
//!    +--bad format----------> Invalid
//! ```
//!
//! Every change of the `country` input restarts it from `Loading` and issues
//! a new lookup ticket; results carrying an older ticket are dropped, so a
//! slow response can never overwrite a newer request.

use crate::annotate::{
    self, escape_attr, escape_text, format_number, Annotation, Border, StyleMap,
};
use crate::assets::{
    is_well_formed, normalize_country_code, placeholder_svg, AssetError, AssetSource, Markup,
};
use std::borrow::Cow;
use crate::library::FlagLibrary;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_WIDTH: f64 = 32.0;
pub const DEFAULT_BORDER_COLOR: &str = "#e5e7eb";
pub const DEFAULT_BORDER_WIDTH: f64 = 1.0;
pub const DEFAULT_FALLBACK: &str = "⚠️";

/// Called with the normalized code when a clickable flag is activated
pub type SelectHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Per-render display options
#[derive(Clone)]
pub struct FlagProps {
    /// Country code as supplied by the caller (normalized internally)
    pub country: String,
    pub width: f64,
    /// Defaults to `width * 336 / 512`
    pub height: Option<f64>,
    pub class: Option<String>,
    /// Inline style overrides, applied after the base layout properties
    pub style: StyleMap,
    /// Accessible label; defaults to "<country name> flag"
    pub label: Option<String>,
    pub clickable: bool,
    pub on_select: Option<SelectHandler>,
    pub show_border: bool,
    pub border_color: String,
    pub border_width: f64,
    /// Glyph shown when the flag cannot be displayed
    pub fallback: String,
    /// Show a generated grey image with the code instead of the fallback
    /// glyph when the lookup fails
    pub placeholder_image: bool,
}

impl FlagProps {
    pub fn new(country: &str) -> Self {
        Self {
            country: country.to_string(),
            width: DEFAULT_WIDTH,
            height: None,
            class: None,
            style: StyleMap::new(),
            label: None,
            clickable: false,
            on_select: None,
            show_border: false,
            border_color: DEFAULT_BORDER_COLOR.to_string(),
            border_width: DEFAULT_BORDER_WIDTH,
            fallback: DEFAULT_FALLBACK.to_string(),
            placeholder_image: false,
        }
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.style.set(property, value);
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn clickable(mut self, clickable: bool) -> Self {
        self.clickable = clickable;
        self
    }

    pub fn on_select(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Arc::new(handler));
        self
    }

    pub fn border(mut self, color: &str, width: f64) -> Self {
        self.show_border = true;
        self.border_color = color.to_string();
        self.border_width = width;
        self
    }

    pub fn show_border(mut self, show: bool) -> Self {
        self.show_border = show;
        self
    }

    pub fn fallback(mut self, glyph: &str) -> Self {
        self.fallback = glyph.to_string();
        self
    }

    pub fn placeholder_image(mut self, enabled: bool) -> Self {
        self.placeholder_image = enabled;
        self
    }

    /// Explicit height, else the 512x336 reference ratio.
    /// The artwork's own aspect ratio is not consulted.
    pub fn resolved_height(&self) -> f64 {
        self.height
            .unwrap_or_else(|| annotate::reference_height(self.width))
    }

    fn border_css(&self) -> Option<String> {
        self.show_border
            .then(|| format!("{}px solid {}", format_number(self.border_width), self.border_color))
    }
}

impl Default for FlagProps {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for FlagProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagProps")
            .field("country", &self.country)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("class", &self.class)
            .field("style", &self.style)
            .field("label", &self.label)
            .field("clickable", &self.clickable)
            .field("on_select", &self.on_select.is_some())
            .field("show_border", &self.show_border)
            .field("border_color", &self.border_color)
            .field("border_width", &self.border_width)
            .field("fallback", &self.fallback)
            .field("placeholder_image", &self.placeholder_image)
            .finish()
    }
}

/// Display state of one flag instance
#[derive(Debug, Clone, PartialEq)]
pub enum FlagState {
    Loading,
    Ready(Markup),
    /// Code failed the format check; holds the reason shown as tooltip
    Invalid(String),
    /// Lookup failed; holds the reason shown as tooltip
    NotFound(String),
}

impl FlagState {
    /// Tooltip text for the error states
    pub fn reason(&self) -> Option<&str> {
        match self {
            FlagState::Invalid(reason) | FlagState::NotFound(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FlagState::Ready(_))
    }
}

/// An outstanding lookup the owner has to resolve and commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub ticket: u64,
    /// Normalized code to resolve
    pub code: String,
}

/// One flag on screen
pub struct FlagView {
    library: Arc<FlagLibrary>,
    props: FlagProps,
    code: String,
    state: FlagState,
    ticket: u64,
    pending: Option<Pending>,
    hovered: bool,
}

impl FlagView {
    /// Creates the view in `Loading` (or `Invalid`) with a lookup pending.
    pub fn new(library: Arc<FlagLibrary>, props: FlagProps) -> Self {
        let mut view = Self {
            library,
            code: String::new(),
            props,
            state: FlagState::Loading,
            ticket: 0,
            pending: None,
            hovered: false,
        };
        view.restart();
        view
    }

    fn restart(&mut self) {
        self.ticket += 1;
        self.hovered = false;
        self.code = normalize_country_code(&self.props.country);

        if is_well_formed(&self.code) {
            self.state = FlagState::Loading;
            self.pending = Some(Pending { ticket: self.ticket, code: self.code.clone() });
        } else {
            tracing::debug!("Rejecting malformed country code {:?}", self.props.country);
            self.state =
                FlagState::Invalid(format!("Invalid country code: {}", self.props.country));
            self.pending = None;
        }
    }

    /// Changes the country input. Restarts the state machine when the value
    /// differs and returns the lookup still to be performed, if any.
    pub fn set_country(&mut self, country: &str) -> Option<Pending> {
        if country != self.props.country {
            self.props.country = country.to_string();
            self.restart();
        }
        self.pending.clone()
    }

    /// Replaces all display options; only a country change restarts loading.
    pub fn set_props(&mut self, props: FlagProps) -> Option<Pending> {
        let restart = props.country != self.props.country;
        self.props = props;
        if restart {
            self.restart();
        }
        if !self.props.clickable {
            self.hovered = false;
        }
        self.pending.clone()
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    /// Applies a lookup result. Returns false (and changes nothing) when
    /// `ticket` is not the latest outstanding lookup.
    pub fn commit(&mut self, ticket: u64, result: Result<Markup, AssetError>) -> bool {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {}
            _ => {
                tracing::debug!(
                    "Discarding stale flag lookup (ticket {}, current {})",
                    ticket,
                    self.ticket
                );
                return false;
            }
        }
        self.pending = None;

        self.state = match result {
            Ok(svg) => FlagState::Ready(svg),
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!("Failed to load flag for {}: {}", self.code, e);
                }
                if self.props.placeholder_image {
                    tracing::debug!("Using placeholder image for {}", self.code);
                    FlagState::Ready(Cow::Owned(placeholder_svg(&self.code)))
                } else {
                    FlagState::NotFound(format!(
                        "Flag not found for country: {}",
                        self.props.country
                    ))
                }
            }
        };
        true
    }

    /// Resolves the pending lookup through `source` and commits it.
    pub async fn load<S: AssetSource>(&mut self, source: &S) -> bool {
        let Some(pending) = self.pending.clone() else {
            return false;
        };
        let result = source.resolve(&pending.code).await;
        self.commit(pending.ticket, result)
    }

    /// Resolves the pending lookup against the library's own store.
    pub fn load_embedded(&mut self) -> bool {
        let Some(pending) = self.pending.clone() else {
            return false;
        };
        let result = self.library.store().lookup(&pending.code);
        self.commit(pending.ticket, result)
    }

    pub fn state(&self) -> &FlagState {
        &self.state
    }

    pub fn props(&self) -> &FlagProps {
        &self.props
    }

    /// Normalized country code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Rendered width and height; honoured in every state
    pub fn size(&self) -> (f64, f64) {
        (self.props.width, self.props.resolved_height())
    }

    pub fn pointer_enter(&mut self) {
        if self.props.clickable && self.state.is_ready() {
            self.hovered = true;
        }
    }

    pub fn pointer_leave(&mut self) {
        self.hovered = false;
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Click on a ready, clickable flag: notifies the handler and returns the
    /// normalized code.
    pub fn activate(&self) -> Option<String> {
        if !self.props.clickable || !self.state.is_ready() {
            return None;
        }
        if let Some(handler) = &self.props.on_select {
            handler(&self.code);
        }
        Some(self.code.clone())
    }

    /// Accessible label used for the SVG
    pub fn label(&self) -> String {
        match &self.props.label {
            Some(label) if !label.is_empty() => label.clone(),
            _ => format!("{} flag", self.library.display_name(&self.props.country)),
        }
    }

    /// Annotated SVG markup, once the flag is ready
    pub fn annotated(&self) -> Option<String> {
        let FlagState::Ready(svg) = &self.state else {
            return None;
        };
        let (width, height) = self.size();
        let annotation = Annotation {
            width,
            height,
            class: self.props.class.clone(),
            style: self.props.style.clone(),
            border: self.props.show_border.then(|| Border {
                width: self.props.border_width,
                color: self.props.border_color.clone(),
            }),
            clickable: self.props.clickable,
            label: self.label(),
        };
        Some(annotate::annotate(svg, &annotation))
    }

    /// HTML fragment for the current state.
    pub fn render(&self) -> String {
        let (width, height) = self.size();
        let size = StyleMap::new()
            .with("width", format!("{}px", format_number(width)))
            .with("height", format!("{}px", format_number(height)));
        let class_attr = self
            .props
            .class
            .as_deref()
            .map(|c| format!(" class=\"{}\"", escape_attr(c)))
            .unwrap_or_default();

        match &self.state {
            FlagState::Loading => {
                let mut style = size
                    .with("background-color", "#f3f4f6")
                    .with("display", "flex")
                    .with("align-items", "center")
                    .with("justify-content", "center");
                match self.props.border_css() {
                    Some(border) => {
                        style.set("border-radius", "4px");
                        style.set("border", border);
                    }
                    None => {
                        style.set("border-radius", "0");
                        style.set("border", "none");
                    }
                }
                format!(
                    "<div{} style=\"{}\">\
                     <span style=\"font-size: 12px; color: #6b7280\">Loading...</span></div>",
                    class_attr,
                    escape_attr(&style.to_css())
                )
            }
            FlagState::Invalid(reason) | FlagState::NotFound(reason) => {
                let style = size
                    .with("background-color", "#fef2f2")
                    .with("border", "1px solid #fecaca")
                    .with("border-radius", "4px")
                    .with("display", "flex")
                    .with("align-items", "center")
                    .with("justify-content", "center");
                format!(
                    "<div{} style=\"{}\" title=\"{}\">\
                     <span style=\"font-size: 12px; color: #dc2626\">{}</span></div>",
                    class_attr,
                    escape_attr(&style.to_css()),
                    escape_attr(reason),
                    escape_text(&self.props.fallback)
                )
            }
            FlagState::Ready(_) => {
                let mut style = StyleMap::new().with("display", "inline-block");
                if self.hovered {
                    style.set("transform", "scale(1.05)");
                }
                format!(
                    "<div data-country=\"{}\" style=\"{}\">{}</div>",
                    escape_attr(&self.code),
                    escape_attr(&style.to_css()),
                    self.annotated().unwrap_or_default()
                )
            }
        }
    }
}

impl fmt::Debug for FlagView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagView")
            .field("props", &self.props)
            .field("code", &self.code)
            .field("state", &self.state)
            .field("ticket", &self.ticket)
            .field("pending", &self.pending)
            .field("hovered", &self.hovered)
            .finish()
    }
}
