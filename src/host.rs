//! Interfaces to the host database that this crate consumes: the cost-based
//! planner, its native plan trees, and the buffer cache.

use crate::arms::StrategyConfig;
use crate::plan::CacheCensus;

/// Namespace holding the host's system catalogs.
pub const CATALOG_NAMESPACE: &str = "pg_catalog";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Utility,
}

/// One entry of a query's range table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRef {
    /// Zero for range entries that are not backed by a relation.
    pub relation_id: u32,
    pub namespace: String,
}

impl RelationRef {
    pub fn new(relation_id: u32, namespace: impl Into<String>) -> Self {
        Self {
            relation_id,
            namespace: namespace.into(),
        }
    }
}

/// A parsed query as handed to the planner.
///
/// `Clone` must produce an independent deep copy: planning consumes its
/// input, and the caller's query must survive arm evaluation untouched.
pub trait PlannableQuery: Clone {
    fn statement_kind(&self) -> StatementKind;
    fn relations(&self) -> Vec<RelationRef>;
}

/// Whether a query may be optimized: a SELECT whose relations are all real
/// (non-zero id) and outside the system catalog.
pub fn is_eligible<Q: PlannableQuery>(query: &Q) -> bool {
    query.statement_kind() == StatementKind::Select
        && query
            .relations()
            .iter()
            .all(|rel| rel.relation_id != 0 && rel.namespace != CATALOG_NAMESPACE)
}

/// A node of the planner's own plan tree.
pub trait NativePlan {
    fn node_tag(&self) -> u32;
    fn total_cost(&self) -> f64;
    fn plan_rows(&self) -> f64;
    /// Scanned relation, for scan-type nodes.
    fn relation_name(&self) -> Option<&str>;
    fn children(&self) -> Vec<&Self>;
}

/// The host's cost-based planner.
pub trait QueryPlanner {
    type Query: PlannableQuery;
    /// Cursor options, bound parameters and whatever else the host passes along.
    type Params;
    type Plan: NativePlan;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Plan `query` with exactly the strategies in `strategy` enabled.
    fn plan(
        &self,
        query: Self::Query,
        params: &Self::Params,
        strategy: StrategyConfig,
    ) -> Result<Self::Plan, Self::Error>;
}

/// The host's buffer cache.
pub trait CacheInspector {
    /// Resident blocks per relation, excluding internal relations.
    fn census(&self) -> CacheCensus;
}

/// The host's instrumentation for one finished execution.
pub trait ExecutionTiming {
    /// False for plan-only paths such as a plain EXPLAIN.
    fn already_executed(&self) -> bool;
    /// True when the run carried its own instrumentation (EXPLAIN ANALYZE).
    fn instrumented(&self) -> bool;
    /// Total elapsed time, if timing was captured.
    fn elapsed_ms(&self) -> Option<f64>;
}
