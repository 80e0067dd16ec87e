//! End-to-end scenarios mirroring spec.md §8's worked examples, run through
//! the public API the way a host application would use it.

use std::collections::BTreeSet;
use std::sync::Arc;

use cuttle_schema::{
    CustomType, Datatype, Engine, MappingSpec, RawValue, Schema, TermNode, TranslationFn, TranslationSpec, TypedValue,
};

fn leaf(tree: &cuttle_schema::TermTree, path: &[&str]) -> Option<TypedValue> {
    let mut node = TermNode::Tree(tree.clone());
    for segment in path {
        let TermNode::Tree(current) = node else { return None };
        node = current.get(segment)?.clone();
    }
    match node {
        TermNode::Leaf(value) => Some(value),
        TermNode::Tree(_) => None,
    }
}

#[test]
fn flat_binary_setting_lands_at_the_expected_path() {
    let schema = Schema::from_parts(vec![MappingSpec::new("platform.name", Datatype::Binary)], vec![]).unwrap();
    let engine = Engine::new(schema);
    let tree = engine.translate_standalone("platform.name = riak\n").unwrap();
    assert_eq!(leaf(&tree, &["platform", "name"]), Some(TypedValue::Str("riak".into())));
}

#[test]
fn integer_coercion_rejects_non_numeric_input() {
    let schema = Schema::from_parts(vec![MappingSpec::new("http.port", Datatype::Integer)], vec![]).unwrap();
    let engine = Engine::new(schema);
    assert!(engine.translate_standalone("http.port = not-a-number\n").is_err());
    let tree = engine.translate_standalone("http.port = 8080\n").unwrap();
    assert_eq!(leaf(&tree, &["http", "port"]), Some(TypedValue::Int(8080)));
}

#[test]
fn enum_allows_declared_values_and_rejects_others() {
    let schema = Schema::from_parts(
        vec![MappingSpec::new(
            "cache.policy",
            Datatype::Enum(BTreeSet::from(["lru".to_owned(), "fifo".to_owned()])),
        )],
        vec![],
    )
    .unwrap();
    let engine = Engine::new(schema);
    let tree = engine.translate_standalone("cache.policy = lru\n").unwrap();
    assert_eq!(leaf(&tree, &["cache", "policy"]), Some(TypedValue::Atom("lru".into())));
    assert!(engine.translate_standalone("cache.policy = random\n").is_err());
}

#[test]
fn list_of_ip_settings_parses_each_host_port_pair() {
    let schema =
        Schema::from_parts(vec![MappingSpec::new("nodes", Datatype::List(Box::new(Datatype::Ip)))], vec![]).unwrap();
    let engine = Engine::new(schema);
    let tree = engine.translate_standalone("nodes = 10.0.0.1:80, 10.0.0.2:81\n").unwrap();
    assert_eq!(
        leaf(&tree, &["nodes"]),
        Some(TypedValue::List(vec![
            TypedValue::Pair("10.0.0.1".into(), "80".into()),
            TypedValue::Pair("10.0.0.2".into(), "81".into()),
        ]))
    );
}

#[test]
fn complex_wildcard_groups_siblings_under_the_captured_key() {
    let schema = Schema::from_parts(vec![MappingSpec::new("listener.http.*", Datatype::Complex).to("listener.http")], vec![])
        .unwrap();
    let engine = Engine::new(schema);
    let tree = engine
        .translate_standalone("listener.http.internal = 127.0.0.1:8098\nlistener.http.external = 0.0.0.0:8098\n")
        .unwrap();
    assert_eq!(
        leaf(&tree, &["listener", "http", "internal"]),
        Some(TypedValue::Str("127.0.0.1:8098".into()))
    );
    assert_eq!(
        leaf(&tree, &["listener", "http", "external"]),
        Some(TypedValue::Str("0.0.0.0:8098".into()))
    );
}

#[test]
fn translation_function_rewrites_the_coerced_value() {
    let schema = Schema::from_parts(
        vec![MappingSpec::new("log.level", Datatype::Atom)],
        vec![TranslationSpec::new(
            "log.level",
            TranslationFn::Arity2(Arc::new(|_key, value| match value {
                TypedValue::Atom(level) if level == "info" => TypedValue::Int(6),
                TypedValue::Atom(level) if level == "warning" => TypedValue::Int(4),
                other => other.clone(),
            })),
        )],
    )
    .unwrap();
    let engine = Engine::new(schema);
    let tree = engine.translate_standalone("log.level = info\n").unwrap();
    assert_eq!(leaf(&tree, &["log", "level"]), Some(TypedValue::Int(6)));
}

#[test]
fn baseline_tree_survives_untouched_branches_and_loses_overlapping_ones() {
    let schema = Schema::from_parts(vec![MappingSpec::new("platform.name", Datatype::Binary)], vec![]).unwrap();
    let engine = Engine::new(schema);

    let mut baseline = cuttle_schema::TermTree::new();
    baseline.ensure_tree("platform").insert("name", TermNode::Leaf(TypedValue::Str("default".into())));
    baseline.ensure_tree("platform").insert("region", TermNode::Leaf(TypedValue::Str("us-east".into())));

    let tree = engine.translate("platform.name = riak\n", baseline).unwrap();
    assert_eq!(leaf(&tree, &["platform", "name"]), Some(TypedValue::Str("riak".into())));
    assert_eq!(leaf(&tree, &["platform", "region"]), Some(TypedValue::Str("us-east".into())));
}

/// A `Custom` datatype plug-in used end-to-end below: parses `"<n>s"` into
/// a plain second count, rejecting anything else (spec.md §4.2).
#[derive(Debug)]
struct DurationSeconds;

impl CustomType for DurationSeconds {
    fn name(&self) -> &str {
        "duration_seconds"
    }

    fn parse(&self, raw: &RawValue) -> Result<TypedValue, String> {
        let RawValue::Scalar(s) = raw else { return Err("expected a scalar".to_owned()) };
        let digits = s.strip_suffix('s').ok_or_else(|| format!("expected `<n>s`, got `{s}`"))?;
        digits.parse::<i64>().map(TypedValue::Int).map_err(|_| format!("invalid duration `{s}`"))
    }

    fn format(&self, value: &TypedValue) -> String {
        match value {
            TypedValue::Int(seconds) => format!("{seconds}s"),
            other => format!("{other:?}"),
        }
    }
}

#[test]
fn custom_datatype_runs_through_the_full_pipeline() {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    let schema = Schema::from_parts(
        vec![MappingSpec::new("cache.ttl", Datatype::Custom(Arc::new(DurationSeconds)))],
        vec![],
    )
    .unwrap();
    let engine = Engine::new(schema);

    let tree = engine.translate_standalone("cache.ttl = 30s\n").unwrap();
    assert_eq!(leaf(&tree, &["cache", "ttl"]), Some(TypedValue::Int(30)));

    let err = engine.translate_standalone("cache.ttl = thirty\n").unwrap_err();
    assert_matches!(err, cuttle_schema::Error::Coerce { .. });
}

#[test]
fn writer_emits_every_declared_mapping_in_declaration_order() {
    let schema = Schema::from_parts(
        vec![
            MappingSpec::new("z.setting", Datatype::Binary).doc("Should appear first."),
            MappingSpec::new("a.setting", Datatype::Binary).doc("Should appear second."),
        ],
        vec![],
    )
    .unwrap();
    let doc = Engine::new(schema).write_default_conf();
    let z_pos = doc.find("z.setting").unwrap();
    let a_pos = doc.find("a.setting").unwrap();
    assert!(z_pos < a_pos, "expected z.setting before a.setting, got:\n{doc}");
}
