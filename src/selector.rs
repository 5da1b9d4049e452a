//! Country selector component.
//!
//! A controlled search-and-pick widget: the selected value belongs to the
//! owner and comes back in through [`SelectorProps::value`]; the selector only
//! reports picks through `on_change`. Internal state is just open/closed and
//! the search text.

use crate::annotate::{escape_attr, escape_text, format_number};
use crate::assets::normalize_country_code;
use crate::flag::{FlagProps, FlagView};
use crate::library::FlagLibrary;
use crate::registry::CountryInfo;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_FLAG_SIZE: f64 = 24.0;
pub const DEFAULT_PLACEHOLDER: &str = "Search countries...";

const NO_MATCHES: &str = "No countries found";
const NO_COUNTRIES: &str = "No countries available";

/// Receives the normalized code of a picked country
pub type ChangeHandler = Arc<dyn Fn(&str) + Send + Sync>;
/// Pre-filters the candidate countries
pub type CountryFilter = Arc<dyn Fn(&CountryInfo) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct SelectorProps {
    /// Currently selected code, owned by the caller
    pub value: Option<String>,
    pub on_change: Option<ChangeHandler>,
    /// Search input placeholder
    pub placeholder: String,
    pub disabled: bool,
    pub class: Option<String>,
    pub flag_size: f64,
    pub show_names: bool,
    pub show_search: bool,
    pub max_results: usize,
    pub filter: Option<CountryFilter>,
}

impl Default for SelectorProps {
    fn default() -> Self {
        Self {
            value: None,
            on_change: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            disabled: false,
            class: None,
            flag_size: DEFAULT_FLAG_SIZE,
            show_names: true,
            show_search: true,
            max_results: DEFAULT_MAX_RESULTS,
            filter: None,
        }
    }
}

impl SelectorProps {
    pub fn value(mut self, code: &str) -> Self {
        self.value = Some(code.to_string());
        self
    }

    pub fn on_change(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(handler));
        self
    }

    pub fn filter(
        mut self,
        predicate: impl Fn(&CountryInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(predicate));
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

impl fmt::Debug for SelectorProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorProps")
            .field("value", &self.value)
            .field("on_change", &self.on_change.is_some())
            .field("placeholder", &self.placeholder)
            .field("disabled", &self.disabled)
            .field("class", &self.class)
            .field("flag_size", &self.flag_size)
            .field("show_names", &self.show_names)
            .field("show_search", &self.show_search)
            .field("max_results", &self.max_results)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    Closed,
    Open,
}

pub struct CountrySelector {
    library: Arc<FlagLibrary>,
    props: SelectorProps,
    state: SelectorState,
    query: String,
}

impl CountrySelector {
    pub fn new(library: Arc<FlagLibrary>, props: SelectorProps) -> Self {
        Self {
            library,
            props,
            state: SelectorState::Closed,
            query: String::new(),
        }
    }

    /// Feeds new props (including the owner's current value) back in
    pub fn set_props(&mut self, props: SelectorProps) {
        self.props = props;
        if self.props.disabled {
            self.close();
        }
    }

    pub fn props(&self) -> &SelectorProps {
        &self.props
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SelectorState::Open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Click on the current-selection control
    pub fn toggle(&mut self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    /// Opens the dropdown with an empty search; no-op when disabled
    pub fn open(&mut self) {
        if self.props.disabled {
            return;
        }
        self.query.clear();
        self.state = SelectorState::Open;
    }

    pub fn close(&mut self) {
        self.state = SelectorState::Closed;
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Pointer press somewhere in the document. Presses outside the
    /// selector close an open dropdown.
    pub fn pointer_down(&mut self, inside: bool) {
        if !inside && self.is_open() {
            tracing::debug!("Pointer outside selector, closing dropdown");
            self.close();
        }
    }

    /// Picks a country: notifies the owner, closes and clears the search.
    /// The selected value itself is left to the owner.
    pub fn select(&mut self, code: &str) -> String {
        let code = normalize_country_code(code);
        if let Some(handler) = &self.props.on_change {
            handler(&code);
        }
        self.close();
        self.query.clear();
        code
    }

    /// Countries eligible for the list: flag and metadata present, caller
    /// filter passed, registry order.
    pub fn candidates(&self) -> Vec<&CountryInfo> {
        self.library
            .available_for_selection()
            .into_iter()
            .filter(|info| self.props.filter.as_ref().map_or(true, |keep| keep(*info)))
            .collect()
    }

    /// Entries currently shown in the dropdown
    pub fn visible(&self) -> Vec<&CountryInfo> {
        let candidates = self.candidates();
        if self.query.trim().is_empty() {
            return candidates.into_iter().take(self.props.max_results).collect();
        }
        self.library
            .registry()
            .search(&self.query)
            .into_iter()
            .filter(|hit| candidates.iter().any(|c| c.code == hit.code))
            .take(self.props.max_results)
            .collect()
    }

    /// Message for an empty list, `None` when there is something to show
    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.visible().is_empty() {
            return None;
        }
        if self.query.is_empty() {
            Some(NO_COUNTRIES)
        } else {
            Some(NO_MATCHES)
        }
    }

    /// Metadata for the owner's current value, if known
    pub fn selected(&self) -> Option<&CountryInfo> {
        let value = self.props.value.as_deref()?;
        self.library.registry().info_of(value)
    }

    fn flag_html(&self, code: &str) -> String {
        let props = FlagProps::new(code)
            .width(self.props.flag_size)
            .height(self.props.flag_size)
            .show_border(true);
        let mut view = FlagView::new(self.library.clone(), props);
        view.load_embedded();
        view.render()
    }

    /// HTML fragment: the selection control plus the dropdown when open.
    pub fn render(&self) -> String {
        let mut html = String::new();
        let class = match &self.props.class {
            Some(extra) => format!("flag-selector {}", extra),
            None => "flag-selector".to_string(),
        };
        html.push_str(&format!(
            "<div class=\"{}\" data-state=\"{}\">",
            escape_attr(&class),
            if self.is_open() { "open" } else { "closed" }
        ));

        html.push_str(&format!(
            "<div class=\"flag-selector-current\" aria-disabled=\"{}\">",
            self.props.disabled
        ));
        match self.selected() {
            Some(info) => {
                html.push_str(&self.flag_html(&info.code));
                if self.props.show_names {
                    html.push_str(&format!("<span>{}</span>", escape_text(&info.name)));
                }
            }
            None => html.push_str("<span>Select country</span>"),
        }
        html.push_str("<span>▼</span></div>");

        if self.is_open() {
            html.push_str("<div class=\"flag-selector-dropdown\">");
            if self.props.show_search {
                html.push_str(&format!(
                    "<input type=\"text\" value=\"{}\" placeholder=\"{}\"/>",
                    escape_attr(&self.query),
                    escape_attr(&self.props.placeholder)
                ));
            }
            html.push_str("<ul>");
            let visible = self.visible();
            for info in &visible {
                html.push_str(&format!(
                    "<li data-country=\"{}\" style=\"height: {}px\">",
                    escape_attr(&info.code),
                    format_number(self.props.flag_size)
                ));
                html.push_str(&self.flag_html(&info.code));
                if self.props.show_names {
                    html.push_str(&format!("<span>{}</span>", escape_text(&info.name)));
                }
                html.push_str("</li>");
            }
            html.push_str("</ul>");
            if let Some(message) = self.empty_message() {
                html.push_str(&format!("<div class=\"flag-selector-empty\">{}</div>", message));
            }
            html.push_str("</div>");
        }

        html.push_str("</div>");
        html
    }
}

impl fmt::Debug for CountrySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountrySelector")
            .field("props", &self.props)
            .field("state", &self.state)
            .field("query", &self.query)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetStore;
    use crate::registry::Registry;
    use std::sync::Mutex;

    fn library() -> Arc<FlagLibrary> {
        Arc::new(FlagLibrary::new(
            AssetStore::from_entries([
                ("us", "<svg></svg>"),
                ("gb", "<svg></svg>"),
                ("fr", "<svg></svg>"),
            ]),
            Registry::from_entries([
                CountryInfo::new("us", "United States"),
                CountryInfo::new("gb", "United Kingdom"),
                CountryInfo::new("jp", "Japan"),
            ]),
        ))
    }

    fn codes(list: Vec<&CountryInfo>) -> Vec<&str> {
        list.into_iter().map(|c| c.code.as_str()).collect()
    }

    #[test]
    fn test_open_search_select_scenario() {
        let picked = Arc::new(Mutex::new(None));
        let sink = picked.clone();
        let props = SelectorProps::default()
            .max_results(1)
            .on_change(move |code| *sink.lock().unwrap() = Some(code.to_string()));
        let mut selector = CountrySelector::new(library(), props);

        selector.toggle();
        assert!(selector.is_open());
        assert_eq!(selector.visible().len(), 1);

        selector.set_query("King");
        assert_eq!(codes(selector.visible()), vec!["gb"]);

        assert_eq!(selector.select("gb"), "gb");
        assert_eq!(picked.lock().unwrap().as_deref(), Some("gb"));
        assert_eq!(selector.state(), SelectorState::Closed);
        assert_eq!(selector.query(), "");
        assert!(selector.props().value.is_none());
    }

    #[test]
    fn test_opening_clears_query() {
        let mut selector = CountrySelector::new(library(), SelectorProps::default());
        selector.open();
        selector.set_query("uni");
        selector.toggle();
        assert!(!selector.is_open());
        selector.toggle();
        assert_eq!(selector.query(), "");
    }

    #[test]
    fn test_disabled_never_opens() {
        let mut selector = CountrySelector::new(library(), SelectorProps::default().disabled(true));
        selector.toggle();
        assert!(!selector.is_open());
    }

    #[test]
    fn test_outside_pointer_closes() {
        let mut selector = CountrySelector::new(library(), SelectorProps::default());
        selector.open();
        selector.pointer_down(true);
        assert!(selector.is_open());
        selector.pointer_down(false);
        assert!(!selector.is_open());
    }

    #[test]
    fn test_candidates_exclude_unsearchable_and_imageless() {
        let selector = CountrySelector::new(library(), SelectorProps::default());
        assert_eq!(codes(selector.candidates()), vec!["us", "gb"]);
    }

    #[test]
    fn test_search_respects_intersection_and_filter() {
        let mut selector = CountrySelector::new(
            library(),
            SelectorProps::default().filter(|info| info.code != "us"),
        );
        selector.open();
        selector.set_query("an");
        // only "Japan" matches and it has no flag
        assert!(selector.visible().is_empty());

        selector.set_query("UNITED");
        assert_eq!(codes(selector.visible()), vec!["gb"]);
    }

    #[test]
    fn test_empty_messages() {
        let mut selector = CountrySelector::new(library(), SelectorProps::default());
        selector.open();
        assert_eq!(selector.empty_message(), None);
        selector.set_query("zz");
        assert_eq!(selector.empty_message(), Some(NO_MATCHES));
        assert!(selector.render().contains(NO_MATCHES));

        let empty = Arc::new(FlagLibrary::new(AssetStore::default(), Registry::default()));
        let mut selector = CountrySelector::new(empty, SelectorProps::default());
        selector.open();
        assert_eq!(selector.empty_message(), Some(NO_COUNTRIES));
    }

    #[test]
    fn test_render_controlled_value() {
        let mut selector = CountrySelector::new(library(), SelectorProps::default());
        assert!(selector.render().contains("Select country"));

        selector.set_props(SelectorProps::default().value("GB"));
        let html = selector.render();
        assert!(html.contains("<span>United Kingdom</span>"));
        assert!(html.contains("data-state=\"closed\""));
        assert!(!html.contains("flag-selector-dropdown"));

        selector.open();
        let html = selector.render();
        assert!(html.contains("placeholder=\"Search countries...\""));
        assert!(html.contains("<li data-country=\"us\""));
        assert!(html.contains("aria-label=\"United States flag\""));
    }

    #[test]
    fn test_disabling_closes_open_dropdown() {
        let mut selector = CountrySelector::new(library(), SelectorProps::default());
        selector.open();
        selector.set_props(SelectorProps::default().disabled(true));
        assert!(!selector.is_open());
    }
}
