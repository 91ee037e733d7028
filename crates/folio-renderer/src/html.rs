//! HTML serialization of view trees.

use pulldown_cmark_escape::{escape_href, escape_html, escape_html_body_text};

use crate::view::{Element, ViewNode};

const VOID_TAGS: &[&str] = &["img", "hr"];

/// Attributes whose values are URLs.
const URL_ATTRS: &[&str] = &["href", "src"];

pub fn to_html(view: &ViewNode) -> String {
    let mut html = String::new();
    write_node(&mut html, view);
    html
}

fn write_node(html: &mut String, view: &ViewNode) {
    match view {
        ViewNode::Text(text) => {
            let _ = escape_html_body_text(&mut *html, text);
        }
        ViewNode::Element(el) => write_element(html, el),
    }
}

fn write_element(html: &mut String, el: &Element) {
    html.push('<');
    html.push_str(&el.tag);
    for (name, value) in &el.attrs {
        html.push(' ');
        html.push_str(name);
        html.push_str("=\"");
        if URL_ATTRS.contains(&name.as_str()) {
            let _ = escape_href(&mut *html, value);
        } else {
            let _ = escape_html(&mut *html, value);
        }
        html.push('"');
    }
    if VOID_TAGS.contains(&el.tag.as_str()) {
        html.push_str(" />");
        return;
    }
    html.push('>');
    for child in &el.children {
        write_node(html, child);
    }
    html.push_str("</");
    html.push_str(&el.tag);
    html.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_text_and_attributes() {
        let view: ViewNode = Element::new("p")
            .attr("title", "a \"quoted\" <title>")
            .child(ViewNode::text("1 < 2 & 3"))
            .into();
        insta::assert_snapshot!(
            to_html(&view),
            @r#"<p title="a &quot;quoted&quot; &lt;title&gt;">1 &lt; 2 &amp; 3</p>"#
        );
    }

    #[test]
    fn test_void_elements() {
        let view: ViewNode = Element::new("figure")
            .child(Element::new("img").attr("src", "/a.png"))
            .child(Element::new("hr"))
            .into();
        insta::assert_snapshot!(to_html(&view), @r#"<figure><img src="/a.png" /><hr /></figure>"#);
    }

    #[test]
    fn test_href_cannot_break_out_of_attribute() {
        let view: ViewNode = Element::new("a")
            .attr("href", "/x\"onclick=\"y")
            .child(ViewNode::text("x"))
            .into();
        let html = to_html(&view);
        assert!(!html.contains("\"onclick"));
    }
}
