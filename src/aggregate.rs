//! C5: the aggregator — collects entries still sitting raw in the working
//! table under a `Complex`/`List(Complex)` mapping's wildcard prefix, groups
//! them by their captured segments, and writes the resulting sub-trees back
//! into the table under the mapping's `to` path, with `to`'s own wildcards
//! (if any) substituted from the captures in order (spec.md §4.5 step 4).
//!
//! The match-shape rule (spec.md §4.5) is implemented via
//! [`KeyPath::capture_prefix`], which treats a mapping key as a *prefix*
//! that may consume the concrete key exactly (the `listener.http.*`
//! boundary case worked through in spec.md's scenario 5) or leave a deeper
//! child-path beyond it (`a.*` matching `a.x.y`). See DESIGN.md for why this
//! crate resolves that case in favor of the exact-length match, rather than
//! requiring a strictly-longer concrete key as one reading of spec.md §4.5's
//! prose alone would suggest.
//!
//! `to` only consumes as many leading captures as it has wildcard segments
//! of its own — `to.wildcard_count()` of them, via
//! [`KeyPath::substitute_wildcards`] — so a `to` override with fewer
//! wildcards than the mapping key (the `listener.http.*` → `listener.http`
//! case, zero wildcards) leaves the remaining captures to be folded into the
//! aggregated sub-tree instead, alongside any child-path segments.

use tracing::{debug, instrument, trace};

use crate::datatype::Datatype;
use crate::schema::{Mapping, Schema};
use crate::table::{Entry, WorkingTable};
use crate::value::{KeyPath, OrderedMap, RawValue, Segment, TermNode, TypedValue};
use crate::Error;

/// Best-effort conversion of a still-raw value into a typed leaf, used for
/// entries captured by a `Complex` aggregation that have no mapping of
/// their own specifying a datatype (spec.md scenario 5: the leaves stay
/// plain strings).
fn raw_to_leaf(raw: &RawValue) -> TypedValue {
    match raw {
        RawValue::Scalar(s) => TypedValue::Str(s.clone()),
        RawValue::List(items) => TypedValue::List(items.iter().cloned().map(TypedValue::Str).collect()),
        RawValue::PairList(pairs) => TypedValue::PairList(
            pairs.iter().map(|(k, v)| (k.clone(), TypedValue::Str(v.clone()))).collect(),
        ),
    }
}

/// Builds the sub-tree rooted at `captures ++ child_path`, with `leaf` at
/// the bottom (spec.md §4.5 step 3).
fn build_subtree(captures: &[Segment], child_path: &KeyPath, leaf: TypedValue) -> OrderedMap {
    let mut path_segments: Vec<&Segment> = captures.iter().collect();
    path_segments.extend(child_path.segments().iter());

    if path_segments.is_empty() {
        // No further segments at all: fold the leaf straight into an empty
        // tree isn't expressible, so the caller must guarantee at least one
        // capture or child segment — true whenever the mapping key has at
        // least one wildcard, which is required for `Complex` mappings.
        return OrderedMap::new();
    }

    let mut root = OrderedMap::new();
    {
        let mut cursor = &mut root;
        for segment in &path_segments[..path_segments.len() - 1] {
            cursor = cursor.ensure_tree(&segment.to_string());
        }
        let last = path_segments.last().unwrap();
        cursor.insert(last.to_string(), TermNode::Leaf(leaf));
    }
    root
}

/// Runs C5 over `table` in place.
#[instrument(level = "debug", skip_all)]
pub(crate) fn run(table: &mut WorkingTable, schema: &Schema) -> Result<(), Error> {
    for mapping in schema.mappings() {
        let is_list_complex = matches!(mapping.datatype, Datatype::List(ref inner) if matches!(**inner, Datatype::Complex));
        let is_complex = matches!(mapping.datatype, Datatype::Complex) || is_list_complex;
        if !is_complex {
            continue;
        }

        let matches = collect_matches(table, mapping);
        if matches.is_empty() {
            continue;
        }

        let to_wildcards = mapping.to.wildcard_count();
        let mut removed = Vec::with_capacity(matches.len());
        // Grouped by the *substituted* `to` key (spec.md §4.5 step 4), not
        // the raw `mapping.to` template — a `to` with its own wildcards
        // fans out into one table entry per captured group rather than one
        // shared entry, matching "substitute the captured values into `to`"
        // read literally instead of leaving `*` segments in the final key.
        let mut tree_groups: Vec<(KeyPath, OrderedMap)> = Vec::new();
        let mut list_groups: Vec<(KeyPath, Vec<TypedValue>)> = Vec::new();

        for (idx, captures, child_path, leaf) in matches {
            removed.push(idx);
            let consumed = to_wildcards.min(captures.len());
            let substituted_to = mapping.to.substitute_wildcards(&captures);
            let residual_captures = &captures[consumed..];
            let subtree = build_subtree(residual_captures, &child_path, leaf);

            if is_list_complex {
                match list_groups.iter_mut().find(|(key, _)| *key == substituted_to) {
                    Some((_, items)) => items.push(term_node_to_typed(TermNode::Tree(subtree))),
                    None => list_groups.push((substituted_to, vec![term_node_to_typed(TermNode::Tree(subtree))])),
                }
            } else {
                match tree_groups.iter_mut().find(|(key, _)| *key == substituted_to) {
                    Some((_, existing)) => existing.merge(subtree),
                    None => tree_groups.push((substituted_to, subtree)),
                }
            }
        }

        table.remove_indices(removed);

        for (to, tree) in tree_groups {
            trace!(to = %to, "aggregated complex mapping");
            merge_or_insert_tree(table, &to, tree);
        }
        for (to, items) in list_groups {
            trace!(to = %to, count = items.len(), "aggregated list(complex) mapping");
            merge_or_insert_list(table, &to, items);
        }
    }

    debug!(entries = table.len(), "aggregation pass complete");
    Ok(())
}

type MatchTuple = (usize, Vec<Segment>, KeyPath, TypedValue);

fn collect_matches(table: &WorkingTable, mapping: &Mapping) -> Vec<MatchTuple> {
    table
        .entries()
        .iter()
        .enumerate()
        .filter_map(|(idx, (key, entry))| {
            if entry.is_typed() {
                return None;
            }
            let (captures, child_path) = mapping.key.capture_prefix(key)?;
            let leaf = raw_to_leaf(entry.as_raw().expect("untyped entries are always Raw"));
            Some((idx, captures, child_path, leaf))
        })
        .collect()
}

fn term_node_to_typed(node: TermNode) -> TypedValue {
    match node {
        TermNode::Leaf(v) => v,
        TermNode::Tree(tree) => TypedValue::Term(tree),
    }
}

fn merge_or_insert_tree(table: &mut WorkingTable, to: &KeyPath, tree: OrderedMap) {
    if let Some(idx) = table.entries().iter().position(|(k, _)| k == to) {
        let existing = table.entries()[idx].1.clone();
        let merged = match existing {
            Entry::Typed(TypedValue::Term(mut existing_tree)) => {
                existing_tree.merge(tree);
                existing_tree
            }
            _ => tree,
        };
        table.replace_at(idx, to.clone(), Entry::Typed(TypedValue::Term(merged)));
    } else {
        table.set(to.clone(), Entry::Typed(TypedValue::Term(tree)));
    }
}

fn merge_or_insert_list(table: &mut WorkingTable, to: &KeyPath, mut items: Vec<TypedValue>) {
    if let Some(idx) = table.entries().iter().position(|(k, _)| k == to) {
        if let (_, Entry::Typed(TypedValue::List(existing))) = &table.entries()[idx] {
            let mut combined = existing.clone();
            combined.append(&mut items);
            table.replace_at(idx, to.clone(), Entry::Typed(TypedValue::List(combined)));
            return;
        }
    }
    table.set(to.clone(), Entry::Typed(TypedValue::List(items)));
}
