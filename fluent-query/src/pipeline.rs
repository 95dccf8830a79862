//! Aggregation pipeline compilation.
//!
//! Stages are always emitted in one fixed order, whatever order the fluent
//! calls were made in:
//!
//! ```text
//! $match -> $group -> $sort -> $skip -> $limit -> $project -> $count
//! ```
//!
//! Reordering changes results (limiting before matching, for instance), so
//! the order lives here and nowhere else.

use bson::{Bson, Document, doc};

use crate::options::QueryOptions;
use crate::version::ServerVersion;

/// One aggregation stage with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    /// `$match` filter.
    Match(Document),
    /// `$group` specification.
    Group(Document),
    /// `$sort` specification.
    Sort(Document),
    /// `$skip` count.
    Skip(u64),
    /// `$limit` count.
    Limit(u64),
    /// `$project` specification.
    Project(Document),
    /// `$count` output label.
    Count(String),
}

impl PipelineStage {
    /// The stage operator, e.g. `$match`.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Match(_) => "$match",
            PipelineStage::Group(_) => "$group",
            PipelineStage::Sort(_) => "$sort",
            PipelineStage::Skip(_) => "$skip",
            PipelineStage::Limit(_) => "$limit",
            PipelineStage::Project(_) => "$project",
            PipelineStage::Count(_) => "$count",
        }
    }

    /// Render the stage as a pipeline document.
    pub fn to_document(&self) -> Document {
        let payload = match self {
            PipelineStage::Match(doc)
            | PipelineStage::Group(doc)
            | PipelineStage::Sort(doc)
            | PipelineStage::Project(doc) => Bson::Document(doc.clone()),
            PipelineStage::Skip(n) | PipelineStage::Limit(n) => {
                Bson::Int64(i64::try_from(*n).unwrap_or(i64::MAX))
            }
            PipelineStage::Count(label) => Bson::String(label.clone()),
        };
        let mut stage = Document::new();
        stage.insert(self.name(), payload);
        stage
    }
}

/// Count the documents reaching this point of the pipeline.
///
/// Servers from [`ServerVersion::COUNT_STAGE`] on get a native `$count`.
/// Older servers get the equivalent `$group` with a null key and a
/// `$sum: 1` accumulator under the same label, so the result row has the
/// same shape either way.
pub fn count_stage(label: &str, version: ServerVersion) -> PipelineStage {
    if version.supports_count_stage() {
        PipelineStage::Count(label.to_string())
    } else {
        let mut group = doc! { "_id": Bson::Null };
        group.insert(label, doc! { "$sum": 1 });
        PipelineStage::Group(group)
    }
}

/// An ordered aggregation pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    /// The stages in execution order.
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Stage operator names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(PipelineStage::name).collect()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Render every stage as a pipeline document.
    pub fn to_documents(&self) -> Vec<Document> {
        self.stages.iter().map(PipelineStage::to_document).collect()
    }
}

/// Compiles accumulated options into a [`Pipeline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineCompiler {
    version: ServerVersion,
}

impl PipelineCompiler {
    /// Create a compiler targeting a server version.
    pub fn new(version: ServerVersion) -> Self {
        Self { version }
    }

    /// Compile the options into stages.
    pub fn compile(&self, options: &QueryOptions) -> Pipeline {
        let mut stages = Vec::new();

        if !options.filter().is_empty() {
            stages.push(PipelineStage::Match(options.filter().clone()));
        }
        if let Some(group) = options.group() {
            stages.push(PipelineStage::Group(group.clone()));
        }
        if let Some(sort) = options.sort() {
            stages.push(PipelineStage::Sort(sort.clone()));
        }
        let skip = options.skip_or(0);
        if skip > 0 {
            stages.push(PipelineStage::Skip(skip));
        }
        let limit = options.limit_or(0);
        if limit > 0 {
            stages.push(PipelineStage::Limit(limit));
        }
        if let Some(projection) = options.projection() {
            stages.push(PipelineStage::Project(projection.clone()));
        }
        if let Some(label) = options.count() {
            stages.push(count_stage(label, self.version));
        }

        Pipeline { stages }
    }
}
