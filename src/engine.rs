//! The top-level entry point: `Engine::translate` strings C1 → C4 → C5 → C6
//! → C7 together over one `.conf` document, and `Engine::write_default_conf`
//! exposes C8.
//!
//! A cheap, `Clone`-able handle (`Engine`) wraps an immutable, build-once
//! `Schema` and exposes the operations callers actually need, rather than
//! making callers thread `Schema` through every free function themselves.

use tracing::instrument;

use crate::schema::Schema;
use crate::table::WorkingTable;
use crate::value::TermTree;
use crate::{aggregate, coerce, conf, term, translate, writer, Error};

/// A translation engine bound to one [`Schema`]. Cheap to clone; holds no
/// per-call state.
#[derive(Debug, Clone)]
pub struct Engine {
    schema: Schema,
}

impl Engine {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Runs the full pipeline over `conf_text`, merging the result over
    /// `baseline` (spec.md §4.7).
    #[instrument(level = "debug", skip_all)]
    pub fn translate(&self, conf_text: &str, baseline: TermTree) -> Result<TermTree, Error> {
        let pairs = conf::parse(conf_text)?;
        let mut table = WorkingTable::from_pairs(pairs);

        coerce::run(&mut table, &self.schema)?;
        aggregate::run(&mut table, &self.schema)?;
        translate::run(&mut table, &self.schema)?;

        let tree = term::build(table)?;
        Ok(term::merge_baseline(baseline, tree))
    }

    /// Runs the full pipeline over `conf_text` against an empty baseline.
    pub fn translate_standalone(&self, conf_text: &str) -> Result<TermTree, Error> {
        self.translate(conf_text, TermTree::new())
    }

    /// Renders this engine's schema as an annotated default `.conf`
    /// document (C8).
    pub fn write_default_conf(&self) -> String {
        writer::write_default(&self.schema)
    }
}
