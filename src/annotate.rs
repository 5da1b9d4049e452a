//! SVG markup annotation.
//!
//! Rewrites the attributes of the root `<svg>` element to inject size,
//! class, inline style and accessibility attributes. The root start tag is
//! parsed into an ordered attribute list, so attributes of nested elements
//! (a `<rect width=...>` or a `stroke-width`) are never touched and applying
//! a step twice never duplicates an attribute. Markup without a recognizable
//! root tag is returned unchanged.

use crate::assets::{REFERENCE_HEIGHT, REFERENCE_WIDTH};

/// Ordered CSS declarations with last-writer-wins per property.
///
/// Property names are stored in kebab-case, so `maxWidth` and `max-width`
/// are the same property. Re-setting a property keeps its original
/// position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(String, String)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing any earlier value
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let property = kebab_case(property);
        let value = value.into();
        match self.entries.iter_mut().find(|(p, _)| *p == property) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((property, value)),
        }
    }

    /// Builder form of [`StyleMap::set`]
    pub fn with(mut self, property: &str, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    /// Applies every declaration of `other` in order
    pub fn extend(&mut self, other: &StyleMap) {
        for (property, value) in &other.entries {
            self.set(property, value.clone());
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let property = kebab_case(property);
        self.entries
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses an inline `style` attribute value
    pub fn parse(css: &str) -> Self {
        let mut map = Self::new();
        for declaration in css.split(';') {
            if let Some((property, value)) = declaration.split_once(':') {
                let (property, value) = (property.trim(), value.trim());
                if !property.is_empty() {
                    map.set(property, value);
                }
            }
        }
        map
    }

    /// Serializes as `prop: value; prop: value`
    pub fn to_css(&self) -> String {
        self.entries
            .iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (property, value) in iter {
            map.set(property.as_ref(), value);
        }
        map
    }
}

fn kebab_case(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") {
        // custom properties are case-sensitive
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    // msTransform -> -ms-transform; Webkit/Moz already start upper-case
    if property.len() > 2
        && property.starts_with("ms")
        && property.as_bytes()[2].is_ascii_uppercase()
    {
        out.push('-');
    }
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Border drawn around a flag
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub width: f64,
    pub color: String,
}

/// Everything the annotator injects in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub width: f64,
    pub height: f64,
    pub class: Option<String>,
    pub style: StyleMap,
    pub border: Option<Border>,
    pub clickable: bool,
    pub label: String,
}

impl Annotation {
    /// Final style: base layout, caller overrides, border, then clickable
    pub fn style_map(&self) -> StyleMap {
        let mut style = StyleMap::new()
            .with("display", "block")
            .with("max-width", "100%")
            .with("height", "auto");
        style.extend(&self.style);
        if let Some(border) = &self.border {
            style.set(
                "border",
                format!("{}px solid {}", format_number(border.width), border.color),
            );
            style.set("border-radius", "4px");
        }
        if self.clickable {
            style.set("cursor", "pointer");
            style.set("transition", "transform 0.2s ease-in-out");
        }
        style
    }
}

/// Applies size, class, style and accessibility attributes in that order.
pub fn annotate(svg: &str, annotation: &Annotation) -> String {
    let Some(mut root) = RootTag::parse(svg) else {
        tracing::debug!("Markup has no <svg> root tag, leaving it untouched");
        return svg.to_string();
    };
    root.set("width", &format_number(annotation.width));
    root.set("height", &format_number(annotation.height));
    if let Some(class) = annotation.class.as_deref().filter(|c| !c.trim().is_empty()) {
        root.add_class(class);
    }
    root.merge_style(&annotation.style_map());
    root.set_accessible(&annotation.label);
    root.render()
}

/// Sets the root width and height attributes.
pub fn resize(svg: &str, width: f64, height: f64) -> String {
    rewrite(svg, |root| {
        root.set("width", &format_number(width));
        root.set("height", &format_number(height));
    })
}

/// Adds class names to the root element, keeping existing ones.
pub fn add_class(svg: &str, class: &str) -> String {
    rewrite(svg, |root| root.add_class(class))
}

/// Merges declarations into the root inline style.
pub fn add_styles(svg: &str, styles: &StyleMap) -> String {
    rewrite(svg, |root| root.merge_style(styles))
}

/// Adds `role`, `aria-label` and `tabindex` to the root element.
pub fn make_accessible(svg: &str, label: &str) -> String {
    rewrite(svg, |root| root.set_accessible(label))
}

/// Value of the root `viewBox` attribute
pub fn view_box(svg: &str) -> Option<String> {
    RootTag::parse(svg)?.get("viewBox").map(str::to_string)
}

/// Root width and height, read as leading numbers (`"512px"` is 512)
pub fn dimensions(svg: &str) -> Option<(f64, f64)> {
    let root = RootTag::parse(svg)?;
    let width = parse_length(root.get("width")?)?;
    let height = parse_length(root.get("height")?)?;
    Some((width, height))
}

/// Width over height of the root element
pub fn aspect_ratio(svg: &str) -> Option<f64> {
    let (width, height) = dimensions(svg)?;
    (height > 0.0).then(|| width / height)
}

/// Height for `width` at the fixed 512x336 reference ratio
pub fn reference_height(width: f64) -> f64 {
    width * REFERENCE_HEIGHT / REFERENCE_WIDTH
}

/// Formats a pixel value without a trailing `.0` and with at most 3 decimals.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{}", value);
    }
    let s = format!("{:.3}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Escapes a string for use inside a double-quoted attribute
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Escapes text content
pub fn escape_text(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn parse_length(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let end = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

fn rewrite(svg: &str, edit: impl FnOnce(&mut RootTag<'_>)) -> String {
    match RootTag::parse(svg) {
        Some(mut root) => {
            edit(&mut root);
            root.render()
        }
        None => svg.to_string(),
    }
}

/// Parsed view of the root `<svg ...>` start tag.
///
/// Attribute values are kept as they appear in the source (already
/// escaped); values set through [`RootTag::set`] are escaped on the way in.
struct RootTag<'a> {
    before: &'a str,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    after: &'a str,
}

impl<'a> RootTag<'a> {
    fn parse(svg: &'a str) -> Option<Self> {
        let start = find_svg_open(svg)?;
        let before = &svg[..start];
        let bytes = svg.as_bytes();
        let mut pos = start + 4;
        let mut attrs = Vec::new();

        loop {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos)? {
                b'>' => {
                    return Some(Self {
                        before,
                        attrs,
                        self_closing: false,
                        after: &svg[pos + 1..],
                    });
                }
                b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                    return Some(Self {
                        before,
                        attrs,
                        self_closing: true,
                        after: &svg[pos + 2..],
                    });
                }
                _ => {}
            }

            let name_start = pos;
            while pos < bytes.len()
                && !matches!(bytes[pos], b'=' | b'>' | b'/')
                && !bytes[pos].is_ascii_whitespace()
            {
                pos += 1;
            }
            if pos == name_start {
                return None;
            }
            let name = svg[name_start..pos].to_string();

            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if bytes.get(pos) != Some(&b'=') {
                // valueless attribute
                attrs.push((name, String::new()));
                continue;
            }
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }

            let quote = *bytes.get(pos)?;
            if quote != b'"' && quote != b'\'' {
                return None;
            }
            let value_start = pos + 1;
            let value_len = svg[value_start..].find(quote as char)?;
            let mut value = svg[value_start..value_start + value_len].to_string();
            if quote == b'\'' {
                value = value.replace('"', "&quot;");
            }
            attrs.push((name, value));
            pos = value_start + value_len + 1;
        }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the first attribute called `name` in place (dropping any
    /// later duplicates) or appends it.
    fn set(&mut self, name: &str, value: &str) {
        self.set_raw(name, escape_attr(value));
    }

    fn set_raw(&mut self, name: &str, value: String) {
        match self.attrs.iter().position(|(n, _)| n == name) {
            Some(first) => {
                self.attrs[first].1 = value;
                let mut index = 0;
                self.attrs.retain(|(n, _)| {
                    let keep = index <= first || n != name;
                    index += 1;
                    keep
                });
            }
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    fn add_class(&mut self, class: &str) {
        let mut classes: Vec<String> = self
            .get("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        for name in class.split_whitespace() {
            let name = escape_attr(name);
            if !classes.contains(&name) {
                classes.push(name);
            }
        }
        self.set_raw("class", classes.join(" "));
    }

    fn merge_style(&mut self, styles: &StyleMap) {
        let mut merged = self
            .get("style")
            .map(|css| StyleMap::parse(&unescape_attr(css)))
            .unwrap_or_default();
        merged.extend(styles);
        self.set("style", &merged.to_css());
    }

    fn set_accessible(&mut self, label: &str) {
        self.set("role", "img");
        self.set("aria-label", label);
        self.set("tabindex", "0");
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.before.len() + self.after.len() + 256);
        out.push_str(self.before);
        out.push_str("<svg");
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
        out.push_str(if self.self_closing { "/>" } else { ">" });
        out.push_str(self.after);
        out
    }
}

/// Byte offset of the first `<svg` that opens an element named exactly `svg`
fn find_svg_open(svg: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(found) = svg[offset..].find("<svg") {
        let start = offset + found;
        match svg.as_bytes().get(start + 4) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(start),
            _ => offset = start + 4,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAG: &str = r##"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="512" height="336" viewBox="0 0 512 336">
  <rect width="512" height="168" fill="#fff"/>
  <path d="M0,0 L512,336" stroke="#000" stroke-width="20"/>
</svg>"##;

    fn annotation() -> Annotation {
        Annotation {
            width: 64.0,
            height: 42.0,
            class: None,
            style: StyleMap::new(),
            border: None,
            clickable: false,
            label: "Germany flag".to_string(),
        }
    }

    #[test]
    fn test_resize_touches_root_only() {
        let out = resize(FLAG, 64.0, 42.0);
        assert!(out.contains(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="42" viewBox="0 0 512 336">"#
        ));
        assert!(out.contains(r#"<rect width="512" height="168""#));
        assert!(out.contains(r#"stroke-width="20""#));
        assert!(out.starts_with("<?xml"));
    }

    #[test]
    fn test_resize_twice_yields_single_attributes() {
        let once = resize(FLAG, 64.0, 42.0);
        let twice = resize(&once, 64.0, 42.0);
        assert_eq!(once, twice);
        assert_eq!(dimensions(&twice), Some((64.0, 42.0)));
    }

    #[test]
    fn test_duplicate_root_attributes_are_collapsed() {
        let svg = r#"<svg width="1" width="2" height="3"></svg>"#;
        assert_eq!(resize(svg, 10.0, 20.0), r#"<svg width="10" height="20"></svg>"#);
    }

    #[test]
    fn test_add_class_appends() {
        let svg = r#"<svg class="flag"/>"#;
        assert_eq!(add_class(svg, "big flag"), r#"<svg class="flag big"/>"#);
        assert_eq!(add_class("<svg/>", "a"), r#"<svg class="a"/>"#);
    }

    #[test]
    fn test_make_accessible_replaces_root_markers() {
        let svg = r#"<svg role="presentation" tabindex="-1"><g role="group"/></svg>"#;
        let out = make_accessible(svg, "Trinidad & Tobago flag");
        assert_eq!(
            out,
            r#"<svg role="img" tabindex="0" aria-label="Trinidad &amp; Tobago flag"><g role="group"/></svg>"#
        );
        assert_eq!(make_accessible(&out, "Trinidad & Tobago flag"), out);
        assert_eq!(
            make_accessible("<svg/>", "France flag"),
            r#"<svg role="img" aria-label="France flag" tabindex="0"/>"#
        );
    }

    #[test]
    fn test_vendor_prefixed_properties() {
        let style = StyleMap::new()
            .with("msTransform", "none")
            .with("WebkitTransition", "none")
            .with("MozAppearance", "none")
            .with("mask", "none");
        assert_eq!(
            style.to_css(),
            "-ms-transform: none; -webkit-transition: none; -moz-appearance: none; mask: none"
        );
        assert_eq!(style.get("-ms-transform"), Some("none"));
    }

    #[test]
    fn test_style_map_last_writer_wins() {
        let mut style = StyleMap::new();
        style.set("display", "block");
        style.set("maxWidth", "100%");
        style.set("display", "inline");
        style.set("max-width", "50%");
        assert_eq!(style.to_css(), "display: inline; max-width: 50%");
    }

    #[test]
    fn test_style_order_base_overrides_border_clickable() {
        let mut a = annotation();
        a.style = StyleMap::new()
            .with("display", "inline")
            .with("opacity", "0.5")
            .with("cursor", "help");
        a.border = Some(Border { width: 2.0, color: "#000".into() });
        a.clickable = true;
        assert_eq!(
            a.style_map().to_css(),
            "display: inline; max-width: 100%; height: auto; opacity: 0.5; cursor: pointer; \
             border: 2px solid #000; border-radius: 4px; transition: transform 0.2s ease-in-out"
        );
    }

    #[test]
    fn test_style_merge_independent_of_key_order() {
        let mut a = annotation();
        a.style = StyleMap::new().with("opacity", "1").with("borderRadius", "9px");
        a.border = Some(Border { width: 1.0, color: "red".into() });
        let mut b = a.clone();
        b.style = StyleMap::new().with("border-radius", "9px").with("opacity", "1");

        let props = |s: StyleMap| {
            let mut v: Vec<(String, String)> =
                s.iter().map(|(p, v)| (p.to_string(), v.to_string())).collect();
            v.sort();
            v
        };
        assert_eq!(props(a.style_map()), props(b.style_map()));
        assert_eq!(a.style_map().get("border-radius"), Some("4px"));
    }

    #[test]
    fn test_annotate_full() {
        let mut a = annotation();
        a.class = Some("flag".into());
        let out = annotate(FLAG, &a);
        assert!(out.contains(r#"width="64" height="42""#));
        assert!(out.contains(r#"class="flag""#));
        assert!(out.contains(r#"style="display: block; max-width: 100%; height: auto""#));
        assert!(out.contains(r#"role="img" aria-label="Germany flag" tabindex="0""#));
    }

    #[test]
    fn test_annotate_merges_existing_inline_style() {
        let svg = r#"<svg style="background: red; display: none"></svg>"#;
        let out = annotate(svg, &annotation());
        assert!(out.contains(
            r#"style="background: red; display: block; max-width: 100%; height: auto""#
        ));
    }

    #[test]
    fn test_annotate_keeps_quoted_style_values() {
        let svg = r#"<svg style="font-family: &quot;Arial&quot;"></svg>"#;
        let out = add_styles(svg, &StyleMap::new().with("color", "red"));
        assert_eq!(out, r#"<svg style="font-family: &quot;Arial&quot;; color: red"></svg>"#);
    }

    #[test]
    fn test_annotate_escapes_label() {
        let mut a = annotation();
        a.label = r#"Trinidad & "Tobago""#.into();
        let out = annotate("<svg></svg>", &a);
        assert!(out.contains(r#"aria-label="Trinidad &amp; &quot;Tobago&quot;""#));
    }

    #[test]
    fn test_annotate_single_quoted_source() {
        let out = annotate("<svg viewBox='0 0 4 3' data-x='a\"b'></svg>", &annotation());
        assert!(out.contains(r#"viewBox="0 0 4 3""#));
        assert!(out.contains(r#"data-x="a&quot;b""#));
    }

    #[test]
    fn test_non_svg_is_untouched() {
        assert_eq!(annotate("<svgx/>", &annotation()), "<svgx/>");
        assert_eq!(resize("not markup", 1.0, 1.0), "not markup");
    }

    #[test]
    fn test_view_box_and_aspect_ratio() {
        assert_eq!(view_box(FLAG).as_deref(), Some("0 0 512 336"));
        assert_eq!(dimensions(r#"<svg width="30px" height="20px"/>"#), Some((30.0, 20.0)));
        let ratio = aspect_ratio(FLAG).unwrap();
        assert!((ratio - 512.0 / 336.0).abs() < 1e-9);
        assert_eq!(aspect_ratio("<svg/>"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(64.0), "64");
        assert_eq!(format_number(20.5), "20.5");
        assert_eq!(format_number(21.000000000000004), "21");
        assert_eq!(format_number(15.75), "15.75");
        assert_eq!(format_number(1.0 / 3.0), "0.333");
    }

    #[test]
    fn test_reference_height() {
        assert!((reference_height(64.0) - 42.0).abs() < 1e-9);
        assert!((reference_height(32.0) - 21.0).abs() < 1e-9);
    }
}
