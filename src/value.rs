//! Key-paths, raw parser output, typed values, and the nested term tree.
//!
//! A small owned path type with segment-wise navigation, plus an
//! order-preserving map, tailored to the dynamic, schema-driven value
//! algebra this crate translates rather than to a static JSON object model.

use std::fmt;

/// A single segment of a [`KeyPath`]: either a literal name or the `*`
/// wildcard used in schema mapping keys (never in `.conf` keys).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A literal, possibly containing `.` (escaped as `\.` in `.conf` text).
    Literal(String),
    /// The `*` wildcard; matches exactly one segment.
    Wildcard,
}

impl Segment {
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s),
            Self::Wildcard => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.write_str(s),
            Self::Wildcard => f.write_str("*"),
        }
    }
}

/// An ordered, non-empty (once built) sequence of [`Segment`]s.
///
/// Equality is segment-wise, matching spec's key-path semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath(Vec<Segment>);

impl KeyPath {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    pub fn from_literals<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(|s| Segment::Literal(s.into())).collect())
    }

    /// Parses a dotted schema key, where an unescaped `.` separates segments,
    /// `\.` denotes a literal dot inside a segment, and a bare `*` segment is
    /// the wildcard. Used for schema mapping/translation keys (§3, §6).
    pub fn from_dotted(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut buf = String::new();
        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'.') => {
                    buf.push('.');
                    chars.next();
                }
                '.' => {
                    segments.push(Self::segment_from_buf(std::mem::take(&mut buf)));
                }
                other => buf.push(other),
            }
        }
        segments.push(Self::segment_from_buf(buf));
        Self(segments)
    }

    fn segment_from_buf(buf: String) -> Segment {
        if buf == "*" {
            Segment::Wildcard
        } else {
            Segment::Literal(buf)
        }
    }

    /// Renders this key-path back to dotted `.conf` form, escaping literal
    /// dots as `\.`.
    pub fn to_dotted(&self) -> String {
        self.0
            .iter()
            .map(|seg| match seg {
                Segment::Literal(s) => s.replace('.', "\\."),
                Segment::Wildcard => "*".to_owned(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_literal(&self) -> bool {
        self.0.iter().all(|seg| !seg.is_wildcard())
    }

    /// Number of `*` segments in this key-path, used to determine how many
    /// leading captures a `to` template consumes via [`Self::substitute_wildcards`].
    pub fn wildcard_count(&self) -> usize {
        self.0.iter().filter(|seg| seg.is_wildcard()).count()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Returns this key-path with its last segment removed.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(KeyPath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn joined(&self, segment: Segment) -> KeyPath {
        let mut out = self.clone();
        out.push(segment);
        out
    }

    /// True if `self` (used as a schema mapping key, possibly with
    /// wildcards) matches `concrete` segment-for-segment. Both paths must
    /// have the same length.
    pub fn matches(&self, concrete: &KeyPath) -> bool {
        if self.0.len() != concrete.0.len() {
            return false;
        }
        self.0.iter().zip(&concrete.0).all(|(pat, actual)| match pat {
            Segment::Wildcard => true,
            Segment::Literal(expected) => matches!(actual, Segment::Literal(a) if a == expected),
        })
    }

    /// Attempts to match `self` (a schema mapping key, possibly with
    /// wildcards) as a prefix "shape" against `concrete`: every literal
    /// segment must match exactly, every wildcard segment captures the
    /// corresponding concrete segment, and `concrete` must be at least as
    /// long as `self`. Returns the captured segments (in wildcard order) and
    /// the remaining child-path suffix.
    ///
    /// `listener.http.*` matching `listener.http.internal` is the boundary
    /// case (concrete is exactly as long as the mapping key, all of it
    /// consumed by captures, leaving an empty child-path) — see §4.5's
    /// worked example in spec.md and the discussion in DESIGN.md.
    pub fn capture_prefix(&self, concrete: &KeyPath) -> Option<(Vec<Segment>, KeyPath)> {
        if concrete.0.len() < self.0.len() {
            return None;
        }
        let mut captures = Vec::new();
        for (pat, actual) in self.0.iter().zip(&concrete.0) {
            match pat {
                Segment::Wildcard => captures.push(actual.clone()),
                Segment::Literal(expected) => match actual {
                    Segment::Literal(a) if a == expected => {}
                    _ => return None,
                },
            }
        }
        let child = KeyPath(concrete.0[self.0.len()..].to_vec());
        Some((captures, child))
    }

    /// Replaces this key-path's wildcards, in order, with `captures`.
    pub fn substitute_wildcards(&self, captures: &[Segment]) -> KeyPath {
        let mut it = captures.iter();
        let segments = self
            .0
            .iter()
            .map(|seg| match seg {
                Segment::Wildcard => it.next().cloned().unwrap_or(Segment::Wildcard),
                Segment::Literal(_) => seg.clone(),
            })
            .collect();
        KeyPath(segments)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

/// Uninterpreted output of the `.conf` parser (C1) for a single setting.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A single scalar, already trimmed / unescaped.
    Scalar(String),
    /// A comma-separated list of scalars.
    List(Vec<String>),
    /// A bracketed list of `key=value` pairs, e.g. `[a=1, b=2]`.
    PairList(Vec<(String, String)>),
}

/// A typed value produced by coercion, aggregation, or translation (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Atom(String),
    Str(String),
    CharList(Vec<char>),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// `(host, port)`.
    Pair(String, String),
    List(Vec<TypedValue>),
    /// An atom key paired with an inner-typed value (`PairedAtom`).
    AtomPair(String, Box<TypedValue>),
    /// A list of `(atom, value)` pairs, e.g. from bracketed list syntax.
    PairList(Vec<(String, TypedValue)>),
    /// A nested term (sub)tree, produced by aggregation (the `Complex`
    /// marker) and grafted into the final tree by C7.
    Term(TermTree),
}

/// An order-preserving `atom -> node` map, used both for the final term tree
/// and for sub-trees built during aggregation.
///
/// A plain `BTreeMap` would silently reorder keys alphabetically; spec.md §3
/// calls insertion order "significant when rendered", so this is backed by a
/// `Vec` instead, preserving declaration order the way an `IndexMap` would.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap(Vec<(String, TermNode)>);

#[derive(Debug, Clone, PartialEq)]
pub enum TermNode {
    Leaf(TypedValue),
    Tree(OrderedMap),
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&TermNode> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TermNode> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts `value` under `key`, overwriting any existing entry in place
    /// (preserving its original position) or appending a new one.
    pub fn insert(&mut self, key: impl Into<String>, value: TermNode) {
        let key = key.into();
        if let Some(existing) = self.0.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, TermNode)> {
        self.0.iter()
    }

    pub fn into_iter(self) -> impl Iterator<Item = (String, TermNode)> {
        self.0.into_iter()
    }

    /// Ensures a `Tree` node exists at `key`, returning a mutable reference
    /// to it, creating an empty one (and converting a pre-existing non-tree
    /// leaf into an empty tree) if necessary.
    pub fn ensure_tree(&mut self, key: &str) -> &mut OrderedMap {
        if self.get(key).is_none() {
            self.insert(key.to_owned(), TermNode::Tree(OrderedMap::new()));
        }
        match self.get_mut(key).unwrap() {
            TermNode::Tree(_) => {}
            leaf @ TermNode::Leaf(_) => *leaf = TermNode::Tree(OrderedMap::new()),
        }
        match self.get_mut(key).unwrap() {
            TermNode::Tree(tree) => tree,
            TermNode::Leaf(_) => unreachable!(),
        }
    }

    /// Deep-merges `other` into `self`, `other` taking priority. Trees merge
    /// recursively key-by-key; anything else (lists, scalars, pairs,
    /// char-lists) is replaced wholesale — "new wins" (see spec.md §9 and
    /// DESIGN.md for the merge-ambiguity resolution).
    pub fn merge(&mut self, other: OrderedMap) {
        for (key, new_node) in other.0 {
            match (self.get_mut(&key), new_node) {
                (Some(TermNode::Tree(existing)), TermNode::Tree(incoming)) => {
                    existing.merge(incoming);
                }
                (_, incoming) => self.insert(key, incoming),
            }
        }
    }
}

/// Alias used throughout the crate for the final nested structure handed to
/// callers (spec's "term tree").
pub type TermTree = OrderedMap;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_round_trip_for_escaped_dots() {
        let path = KeyPath::from_dotted(r"riak\.node.name");
        assert_eq!(path.segments().len(), 2);
        assert_eq!(path.to_dotted(), r"riak\.node.name");
    }

    #[test]
    fn wildcard_segment_parses_from_star() {
        let path = KeyPath::from_dotted("listener.*.internal");
        assert_eq!(
            path.segments(),
            &[
                Segment::literal("listener"),
                Segment::Wildcard,
                Segment::literal("internal"),
            ]
        );
    }

    #[test]
    fn matches_requires_equal_length_and_wildcard_any() {
        let pattern = KeyPath::from_dotted("a.*.c");
        assert!(pattern.matches(&KeyPath::from_dotted("a.b.c")));
        assert!(!pattern.matches(&KeyPath::from_dotted("a.b.d")));
        assert!(!pattern.matches(&KeyPath::from_dotted("a.b.c.d")));
    }

    #[test]
    fn capture_prefix_allows_boundary_case_with_empty_child() {
        let mapping_key = KeyPath::from_dotted("listener.http.*");
        let concrete = KeyPath::from_dotted("listener.http.internal");
        let (captures, child) = mapping_key.capture_prefix(&concrete).unwrap();
        assert_eq!(captures, vec![Segment::literal("internal")]);
        assert!(child.is_empty());
    }

    #[test]
    fn capture_prefix_collects_deeper_child_paths() {
        let mapping_key = KeyPath::from_dotted("a.*");
        let concrete = KeyPath::from_dotted("a.x.y");
        let (captures, child) = mapping_key.capture_prefix(&concrete).unwrap();
        assert_eq!(captures, vec![Segment::literal("x")]);
        assert_eq!(child, KeyPath::from_dotted("y"));
    }

    #[test]
    fn substitute_wildcards_replaces_in_order() {
        let to = KeyPath::from_dotted("out.*.*");
        let substituted = to.substitute_wildcards(&[Segment::literal("a"), Segment::literal("b")]);
        assert_eq!(substituted.to_dotted(), "out.a.b");
    }

    #[test]
    fn substitute_wildcards_leaves_a_wildcard_free_path_untouched() {
        let to = KeyPath::from_dotted("listener.http");
        let substituted = to.substitute_wildcards(&[Segment::literal("internal")]);
        assert_eq!(substituted, to);
    }

    #[test]
    fn wildcard_count_counts_star_segments() {
        assert_eq!(KeyPath::from_dotted("a.*.c.*").wildcard_count(), 2);
        assert_eq!(KeyPath::from_dotted("listener.http").wildcard_count(), 0);
    }

    #[test]
    fn ordered_map_preserves_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("b", TermNode::Leaf(TypedValue::Int(2)));
        map.insert("a", TermNode::Leaf(TypedValue::Int(1)));
        let keys: Vec<_> = map.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec!["b".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut tree = OrderedMap::new();
        tree.ensure_tree("listener")
            .insert("http", TermNode::Leaf(TypedValue::Str("x".into())));
        let clone = tree.clone();
        tree.merge(clone.clone());
        assert_eq!(tree, clone);
    }

    #[test]
    fn merge_prefers_new_for_lists() {
        let mut old = OrderedMap::new();
        old.insert("xs", TermNode::Leaf(TypedValue::List(vec![TypedValue::Int(1)])));
        let mut new = OrderedMap::new();
        new.insert("xs", TermNode::Leaf(TypedValue::List(vec![TypedValue::Int(2)])));
        old.merge(new);
        assert_eq!(
            old.get("xs"),
            Some(&TermNode::Leaf(TypedValue::List(vec![TypedValue::Int(2)])))
        );
    }
}
