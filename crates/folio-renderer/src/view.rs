//! Presentation-neutral view tree produced by the renderers.

use smol_str::SmolStr;

/// Tags that start a new line in the plain-text projection.
const BLOCK_TAGS: &[&str] = &[
    "div",
    "p",
    "h1",
    "h2",
    "h3",
    "ul",
    "ol",
    "li",
    "blockquote",
    "pre",
    "figure",
    "figcaption",
    "hr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: SmolStr,
    /// Attributes in emission order.
    pub attrs: Vec<(SmolStr, SmolStr)>,
    pub children: Vec<ViewNode>,
}

impl Element {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Append to the `class` attribute, creating it if needed.
    pub fn class(mut self, class: &str) -> Self {
        match self.attrs.iter_mut().find(|(name, _)| name == "class") {
            Some((_, value)) => {
                *value = smol_str::format_smolstr!("{} {}", value, class);
            }
            None => self.attrs.push((SmolStr::new_static("class"), SmolStr::new(class))),
        }
        self
    }

    pub fn child(mut self, child: impl Into<ViewNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ViewNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewNode {
    Element(Element),
    Text(SmolStr),
}

impl From<Element> for ViewNode {
    fn from(el: Element) -> Self {
        ViewNode::Element(el)
    }
}

impl ViewNode {
    pub fn text(text: impl Into<SmolStr>) -> Self {
        ViewNode::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            ViewNode::Element(el) => Some(el),
            ViewNode::Text(_) => None,
        }
    }

    /// Child nodes; text has none.
    pub fn children(&self) -> &[ViewNode] {
        match self {
            ViewNode::Element(el) => &el.children,
            ViewNode::Text(_) => &[],
        }
    }

    /// Depth-first search for the first element with `tag`.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        match self {
            ViewNode::Element(el) if el.tag == tag => Some(el),
            ViewNode::Element(el) => el.children.iter().find_map(|c| c.find(tag)),
            ViewNode::Text(_) => None,
        }
    }

    /// Visible text with block-level elements on their own lines.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_plain(&mut out);
        out.trim().to_string()
    }

    fn collect_plain(&self, out: &mut String) {
        match self {
            ViewNode::Text(text) => out.push_str(text),
            ViewNode::Element(el) => {
                let block = BLOCK_TAGS.contains(&el.tag.as_str());
                if block && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                for child in &el.children {
                    child.collect_plain(out);
                }
                if block && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_appends() {
        let el = Element::new("p").class("a").class("b");
        assert_eq!(el.get_attr("class"), Some("a b"));
        assert!(el.has_class("b"));
        assert!(!el.has_class("c"));
    }

    #[test]
    fn test_plain_text_separates_blocks() {
        let view: ViewNode = Element::new("div")
            .child(Element::new("h1").child(ViewNode::text("Title")))
            .child(
                Element::new("p")
                    .child(ViewNode::text("Hello "))
                    .child(Element::new("strong").child(ViewNode::text("world"))),
            )
            .child(Element::new("hr"))
            .into();
        assert_eq!(view.plain_text(), "Title\nHello world");
    }
}
