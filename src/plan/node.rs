use crate::host::NativePlan;
use crate::plan::error::{PlanError, PlanResult};
use std::fmt;

/// Operator kinds the decision service distinguishes. Everything else is
/// reported as `Other`, with the raw node tag kept alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    SeqScan,
    IndexScan,
    IndexOnlyScan,
    BitmapIndexScan,
    NestedLoop,
    MergeJoin,
    HashJoin,
    Other,
}

impl OperatorKind {
    // Node tags as numbered by the host planner.
    pub const SEQ_SCAN_TAG: u32 = 110;
    pub const INDEX_SCAN_TAG: u32 = 112;
    pub const INDEX_ONLY_SCAN_TAG: u32 = 113;
    pub const BITMAP_INDEX_SCAN_TAG: u32 = 114;
    pub const NESTED_LOOP_TAG: u32 = 127;
    pub const MERGE_JOIN_TAG: u32 = 128;
    pub const HASH_JOIN_TAG: u32 = 129;

    pub const fn from_tag(tag: u32) -> Self {
        match tag {
            Self::SEQ_SCAN_TAG => Self::SeqScan,
            Self::INDEX_SCAN_TAG => Self::IndexScan,
            Self::INDEX_ONLY_SCAN_TAG => Self::IndexOnlyScan,
            Self::BITMAP_INDEX_SCAN_TAG => Self::BitmapIndexScan,
            Self::NESTED_LOOP_TAG => Self::NestedLoop,
            Self::MERGE_JOIN_TAG => Self::MergeJoin,
            Self::HASH_JOIN_TAG => Self::HashJoin,
            _ => Self::Other,
        }
    }

    /// The canonical tag for a named kind; `None` for `Other`.
    pub const fn tag(self) -> Option<u32> {
        match self {
            Self::SeqScan => Some(Self::SEQ_SCAN_TAG),
            Self::IndexScan => Some(Self::INDEX_SCAN_TAG),
            Self::IndexOnlyScan => Some(Self::INDEX_ONLY_SCAN_TAG),
            Self::BitmapIndexScan => Some(Self::BITMAP_INDEX_SCAN_TAG),
            Self::NestedLoop => Some(Self::NESTED_LOOP_TAG),
            Self::MergeJoin => Some(Self::MERGE_JOIN_TAG),
            Self::HashJoin => Some(Self::HASH_JOIN_TAG),
            Self::Other => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::SeqScan => "Seq Scan",
            Self::IndexScan => "Index Scan",
            Self::IndexOnlyScan => "Index Only Scan",
            Self::BitmapIndexScan => "Bitmap Index Scan",
            Self::NestedLoop => "Nested Loop",
            Self::MergeJoin => "Merge Join",
            Self::HashJoin => "Hash Join",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Host-independent copy of one node of a candidate plan. Strictly binary.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanTreeNode {
    pub tag: u32,
    pub total_cost: f64,
    pub row_estimate: f64,
    pub relation_name: Option<String>,
    pub left: Option<Box<PlanTreeNode>>,
    pub right: Option<Box<PlanTreeNode>>,
}

impl PlanTreeNode {
    pub fn leaf(tag: u32, total_cost: f64, row_estimate: f64) -> Self {
        Self {
            tag,
            total_cost,
            row_estimate,
            relation_name: None,
            left: None,
            right: None,
        }
    }

    #[must_use]
    pub fn with_relation(mut self, name: impl Into<String>) -> Self {
        self.relation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_left(mut self, child: Self) -> Self {
        self.left = Some(Box::new(child));
        self
    }

    #[must_use]
    pub fn with_right(mut self, child: Self) -> Self {
        self.right = Some(Box::new(child));
        self
    }

    pub const fn kind(&self) -> OperatorKind {
        OperatorKind::from_tag(self.tag)
    }

    /// Children in emission order: left, then right.
    pub fn children(&self) -> impl Iterator<Item = &Self> {
        self.left.iter().chain(self.right.iter()).map(|child| &**child)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().map(Self::node_count).sum::<usize>()
    }

    /// Copy a native plan depth-first. Nodes with more than two children
    /// cannot be represented and are rejected.
    pub fn from_native<P: NativePlan>(native: &P) -> PlanResult<Self> {
        let children = native.children();
        if children.len() > 2 {
            return Err(PlanError::TooManyChildren {
                tag: native.node_tag(),
                count: children.len(),
            });
        }

        let mut children = children.into_iter();
        let left = children
            .next()
            .map(|child| Self::from_native(child).map(Box::new))
            .transpose()?;
        let right = children
            .next()
            .map(|child| Self::from_native(child).map(Box::new))
            .transpose()?;

        Ok(Self {
            tag: native.node_tag(),
            total_cost: native.total_cost(),
            row_estimate: native.plan_rows(),
            relation_name: native.relation_name().map(str::to_owned),
            left,
            right,
        })
    }
}
