//! Inline formatting marks carried by text leaves.
//!
//! A [`MarkSet`] holds at most one mark of each [`MarkKind`]. The set keeps
//! the order marks were added in so that stored content round-trips exactly,
//! but nothing that renders a set may depend on that order: use
//! [`MarkSet::in_composition_order`] instead.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A formatting attribute applied to a text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    Code,
    Highlight,
    Link {
        href: SmolStr,
    },
    Style {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<SmolStr>,
        #[serde(
            default,
            rename = "fontFamily",
            skip_serializing_if = "Option::is_none"
        )]
        font_family: Option<SmolStr>,
    },
}

/// Discriminant of a [`Mark`], without its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkKind {
    Code,
    Highlight,
    Strike,
    Italic,
    Bold,
    Link,
    Style,
}

/// Innermost to outermost. Code and highlight wrap the literal text, emphasis
/// is layered over them, link and style are the outer presentational wrappers.
pub const COMPOSITION_ORDER: [MarkKind; 7] = [
    MarkKind::Code,
    MarkKind::Highlight,
    MarkKind::Strike,
    MarkKind::Italic,
    MarkKind::Bold,
    MarkKind::Link,
    MarkKind::Style,
];

impl MarkKind {
    /// Position in [`COMPOSITION_ORDER`]; lower is applied first.
    pub fn composition_rank(self) -> usize {
        // The enum is declared in composition order.
        self as usize
    }
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Bold => MarkKind::Bold,
            Mark::Italic => MarkKind::Italic,
            Mark::Strike => MarkKind::Strike,
            Mark::Code => MarkKind::Code,
            Mark::Highlight => MarkKind::Highlight,
            Mark::Link { .. } => MarkKind::Link,
            Mark::Style { .. } => MarkKind::Style,
        }
    }

    pub fn link(href: impl Into<SmolStr>) -> Self {
        Mark::Link { href: href.into() }
    }

    pub fn color(color: impl Into<SmolStr>) -> Self {
        Mark::Style {
            color: Some(color.into()),
            font_family: None,
        }
    }
}

/// Set of marks on a text leaf, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    /// Add a mark, replacing any existing mark of the same kind in place.
    pub fn insert(&mut self, mark: Mark) {
        match self.0.iter_mut().find(|m| m.kind() == mark.kind()) {
            Some(existing) => *existing = mark,
            None => self.0.push(mark),
        }
    }

    /// Remove the mark of `kind`, returning it if present.
    pub fn remove(&mut self, kind: MarkKind) -> Option<Mark> {
        let idx = self.0.iter().position(|m| m.kind() == kind)?;
        Some(self.0.remove(idx))
    }

    pub fn get(&self, kind: MarkKind) -> Option<&Mark> {
        self.0.iter().find(|m| m.kind() == kind)
    }

    pub fn contains(&self, kind: MarkKind) -> bool {
        self.get(kind).is_some()
    }

    /// Set equality, ignoring the order marks were added in.
    pub fn same_marks(&self, other: &MarkSet) -> bool {
        self.len() == other.len() && self.0.iter().all(|m| other.get(m.kind()) == Some(m))
    }

    /// Marks sorted innermost first, per [`COMPOSITION_ORDER`].
    pub fn in_composition_order(&self) -> Vec<&Mark> {
        let mut marks: Vec<&Mark> = self.0.iter().collect();
        marks.sort_by_key(|m| m.kind().composition_rank());
        marks
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

impl<'de> Deserialize<'de> for MarkSet {
    /// Unrecognised marks are skipped rather than failing the whole body, and
    /// a repeated kind keeps its last occurrence.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
        let mut set = MarkSet::new();
        for value in raw {
            match serde_json::from_value::<Mark>(value) {
                Ok(mark) => set.insert(mark),
                Err(e) => {
                    tracing::warn!(target: "folio::wire", error = %e, "skipping unrecognised mark");
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_same_kind() {
        let mut set = MarkSet::new();
        set.insert(Mark::link("https://a.example"));
        set.insert(Mark::Bold);
        set.insert(Mark::link("https://b.example"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(MarkKind::Link), Some(&Mark::link("https://b.example")));
    }

    #[test]
    fn test_composition_order_ignores_insertion_order() {
        let a: MarkSet = [Mark::Bold, Mark::Code, Mark::link("x"), Mark::Italic]
            .into_iter()
            .collect();
        let b: MarkSet = [Mark::link("x"), Mark::Italic, Mark::Bold, Mark::Code]
            .into_iter()
            .collect();

        assert_eq!(a.in_composition_order(), b.in_composition_order());
        let kinds: Vec<_> = a.in_composition_order().iter().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            vec![MarkKind::Code, MarkKind::Italic, MarkKind::Bold, MarkKind::Link]
        );
    }

    #[test]
    fn test_same_marks_is_order_insensitive() {
        let a: MarkSet = [Mark::Bold, Mark::Italic].into_iter().collect();
        let b: MarkSet = [Mark::Italic, Mark::Bold].into_iter().collect();
        let c: MarkSet = [Mark::Italic].into_iter().collect();
        assert!(a.same_marks(&b));
        assert!(!a.same_marks(&c));
    }

    #[test]
    fn test_deserialize_skips_unknown_marks() {
        let json = r#"[{"kind":"Bold"},{"kind":"Underline"},{"kind":"Link","href":"/x"}]"#;
        let set: MarkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(MarkKind::Bold));
        assert!(set.contains(MarkKind::Link));
    }

    #[test]
    fn test_style_serializes_camel_case() {
        let mark = Mark::Style {
            color: None,
            font_family: Some("Georgia".into()),
        };
        let json = serde_json::to_string(&mark).unwrap();
        assert_eq!(json, r#"{"kind":"Style","fontFamily":"Georgia"}"#);
    }
}
