//! Rendering of the rich content tree.
//!
//! [`render_tree`] is total: every input produces a view. Nodes that break
//! the tree's shape rules are shown through an inert `folio-fallback`
//! container holding whatever children they have.

use folio_common::node::{Node, NodeKind};
use folio_common::{Mark, SmolStr};
use smol_str::format_smolstr;

use crate::view::{Element, ViewNode};

/// Heading tag for a stored level: missing renders as 1, out of range as 2.
pub fn heading_level(level: Option<i64>) -> u8 {
    match level {
        None => 1,
        Some(l @ 1..=3) => l as u8,
        Some(_) => 2,
    }
}

/// Render a `Doc` into a `div.folio-document`. A root of any other kind is
/// rendered as the document's only child.
pub fn render_tree(doc: &Node) -> ViewNode {
    let root = Element::new("div").class("folio-document");
    let root = if doc.kind == NodeKind::Doc && doc.marks.is_empty() {
        root.children(doc.children.iter().map(render_node))
    } else {
        root.child(render_node(doc))
    };
    root.into()
}

fn with_align(el: Element, node: &Node) -> Element {
    match node.attrs.text_align {
        Some(align) => el.class(&format!("align-{}", align.as_str())),
        None => el,
    }
}

fn render_children(el: Element, node: &Node) -> Element {
    el.children(node.children.iter().map(render_node))
}

fn render_node(node: &Node) -> ViewNode {
    if let Some(malformation) = node.malformation(false) {
        tracing::debug!(
            target: "folio::render",
            kind = %node.kind,
            ?malformation,
            "rendering malformed node through fallback"
        );
        return render_fallback(node);
    }

    let el = match &node.kind {
        NodeKind::Text => return render_text(node),
        NodeKind::Paragraph => render_children(Element::new("p"), node),
        NodeKind::Heading => {
            let level = heading_level(node.attrs.level);
            render_children(Element::new(format_smolstr!("h{}", level)), node)
        }
        NodeKind::BulletList => render_children(Element::new("ul"), node),
        NodeKind::OrderedList => render_children(Element::new("ol"), node),
        NodeKind::ListItem => render_children(Element::new("li"), node),
        NodeKind::Blockquote => render_children(Element::new("blockquote"), node),
        NodeKind::CodeBlock => {
            let mut code = Element::new("code");
            if let Some(lang) = node.attrs.language.as_deref().filter(|l| !l.is_empty()) {
                code = code.class(&format!("language-{}", lang));
            }
            Element::new("pre").child(render_children(code, node))
        }
        NodeKind::Image => render_image(node),
        NodeKind::HorizontalRule => Element::new("hr"),
        // Unreachable in practice: a non-root Doc is reported as malformed.
        NodeKind::Doc => return render_fallback(node),
        NodeKind::Unknown(name) => render_children(
            Element::new("div")
                .class("folio-unknown")
                .attr("data-kind", name.clone()),
            node,
        ),
    };
    with_align(el, node).into()
}

fn render_image(node: &Node) -> Element {
    let mut img = Element::new("img").attr("src", node.attrs.src.clone().unwrap_or_default());
    if let Some(alt) = &node.attrs.alt {
        img = img.attr("alt", alt.clone());
    }
    let mut style = Vec::new();
    if let Some(width) = node.attrs.width {
        style.push(format!("width: {}px", width));
    }
    if let Some(height) = node.attrs.height {
        style.push(format!("height: {}px", height));
    }
    if !style.is_empty() {
        img = img.attr("style", style.join("; "));
    }
    Element::new("figure").child(img)
}

fn render_fallback(node: &Node) -> ViewNode {
    let mut el = Element::new("div")
        .class("folio-fallback")
        .attr("data-kind", SmolStr::new(node.kind.as_str()));
    if let Some(text) = &node.text {
        el = el.child(ViewNode::text(text.clone()));
    }
    render_children(el, node).into()
}

/// Wrap a text leaf in its marks, innermost first.
fn render_text(node: &Node) -> ViewNode {
    let mut view = ViewNode::text(node.text_str());
    for mark in node.marks.in_composition_order() {
        view = match wrap_mark(mark) {
            Some(el) => el.child(view).into(),
            None => view,
        };
    }
    view
}

/// The wrapper element for a mark, or `None` when the mark has nothing to show.
fn wrap_mark(mark: &Mark) -> Option<Element> {
    let el = match mark {
        Mark::Code => Element::new("code"),
        Mark::Highlight => Element::new("mark"),
        Mark::Strike => Element::new("s"),
        Mark::Italic => Element::new("em"),
        Mark::Bold => Element::new("strong"),
        Mark::Link { href } if href.is_empty() => return None,
        Mark::Link { href } => Element::new("a")
            .attr("href", href.clone())
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer"),
        Mark::Style { color, font_family } => {
            let mut style = Vec::new();
            if let Some(color) = color.as_deref().filter(|c| !c.is_empty()) {
                style.push(format!("color: {}", color));
            }
            if let Some(font) = font_family.as_deref().filter(|f| !f.is_empty()) {
                style.push(format!("font-family: {}", font));
            }
            if style.is_empty() {
                return None;
            }
            Element::new("span").attr("style", style.join("; "))
        }
    };
    Some(el)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_common::node::TextAlign;
    use folio_common::{MarkSet, NodeAttrs};

    fn first_child(view: &ViewNode) -> &ViewNode {
        &view.children()[0]
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(heading_level(None), 1);
        assert_eq!(heading_level(Some(3)), 3);
        assert_eq!(heading_level(Some(0)), 2);
        assert_eq!(heading_level(Some(9)), 2);
    }

    #[test]
    fn test_align_class_only_when_present() {
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::text("a")]),
            Node::paragraph(vec![Node::text("b")]).with_align(TextAlign::Right),
        ]);
        let view = render_tree(&doc);
        let plain = view.children()[0].as_element().unwrap();
        let right = view.children()[1].as_element().unwrap();
        assert_eq!(plain.get_attr("class"), None);
        assert_eq!(right.get_attr("class"), Some("align-right"));
    }

    #[test]
    fn test_marks_nest_in_composition_order() {
        let marks: MarkSet = [Mark::link("/x"), Mark::Bold, Mark::Code]
            .into_iter()
            .collect();
        let doc = Node::doc(vec![Node::paragraph(vec![Node::marked_text("hi", marks)])]);
        let view = render_tree(&doc);
        let p = first_child(&view);
        let a = first_child(p).as_element().unwrap();
        assert_eq!(a.tag, "a");
        let strong = a.children[0].as_element().unwrap();
        assert_eq!(strong.tag, "strong");
        let code = strong.children[0].as_element().unwrap();
        assert_eq!(code.tag, "code");
        assert_eq!(code.children[0], ViewNode::text("hi"));
    }

    #[test]
    fn test_empty_link_and_style_add_nothing() {
        let marks: MarkSet = [
            Mark::link(""),
            Mark::Style {
                color: None,
                font_family: None,
            },
        ]
        .into_iter()
        .collect();
        let doc = Node::doc(vec![Node::paragraph(vec![Node::marked_text("x", marks)])]);
        let view = render_tree(&doc);
        assert_eq!(first_child(first_child(&view)), &ViewNode::text("x"));
    }

    #[test]
    fn test_malformed_nodes_fall_back() {
        let mut text = Node::text("outer");
        text.children.push(Node::text("inner"));
        let doc = Node::doc(vec![text, Node::image("")]);
        let view = render_tree(&doc);

        let fallback = view.children()[0].as_element().unwrap();
        assert!(fallback.has_class("folio-fallback"));
        assert_eq!(
            fallback.children,
            vec![ViewNode::text("outer"), ViewNode::text("inner")]
        );
        let image = view.children()[1].as_element().unwrap();
        assert!(image.has_class("folio-fallback"));
        assert_eq!(image.get_attr("data-kind"), Some("Image"));
    }

    #[test]
    fn test_unknown_kind_renders_children() {
        let node = Node {
            kind: NodeKind::Unknown("Callout".into()),
            attrs: NodeAttrs::default(),
            children: vec![Node::paragraph(vec![Node::text("note")])],
            marks: MarkSet::new(),
            text: None,
        };
        let view = render_tree(&Node::doc(vec![node]));
        let el = first_child(&view).as_element().unwrap();
        assert!(el.has_class("folio-unknown"));
        assert_eq!(view.plain_text(), "note");
    }

    #[test]
    fn test_stored_tree_with_odd_attrs_renders() {
        let json = r#"{"kind":"Doc","children":[{"kind":"Heading","attrs":{"level":"2"},"children":[{"kind":"Text","text":"Title"}]},{"children":[{"kind":"Text","text":"loose"}]}]}"#;
        let body = folio_common::wire::parse_body(json).unwrap();
        let view = render_tree(body.as_tree().unwrap());
        assert!(view.find("h1").is_some());
        let text = view.plain_text();
        assert!(text.contains("Title") && text.contains("loose"));
    }

    #[test]
    fn test_image_dimensions() {
        let mut image = Node::image("/a.png");
        image.attrs.width = Some(320);
        image.attrs.height = Some(200);
        let view = render_tree(&Node::doc(vec![image]));
        let img = view.find("img").unwrap();
        assert_eq!(img.get_attr("style"), Some("width: 320px; height: 200px"));
    }
}
