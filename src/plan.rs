pub mod census;
pub mod error;
pub mod node;
pub mod serialize;


pub use census::{CacheCensus, INTERNAL_PREFIXES, is_internal_relation};
pub use error::{PlanError, PlanResult};
pub use node::{OperatorKind, PlanTreeNode};
pub use serialize::{plan_from_json, plan_to_json};
