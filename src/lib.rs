pub mod arms;
pub mod config;
pub mod error;
pub mod explain;
pub mod hint;
pub mod host;
pub mod orchestrator;
pub mod plan;
pub mod protocol;
pub mod session;

// Re-export commonly used types
pub use arms::{Arm, ArmError, ArmSelector, MAX_ARMS, Strategy, StrategyConfig, configuration_for};
pub use config::{BaoSettings, ConfigError};
pub use error::{BaoError, BaoResult};
pub use explain::{ExplainGroup, ExplainValue};
pub use hint::{Hint, hint_for};
pub use host::{
    CacheInspector, ExecutionTiming, NativePlan, PlannableQuery, QueryPlanner, RelationRef,
    StatementKind,
};
pub use orchestrator::{
    ArmOrchestrator, Candidate, FallbackReason, OptimizationMode, Planned, QueryRecord, Selection,
};
pub use plan::{CacheCensus, OperatorKind, PlanError, PlanTreeNode, plan_from_json, plan_to_json};
pub use protocol::{Exchange, ProtocolClient, ProtocolError, RewardMessage};
pub use session::{
    BaoSession, ExecutionObserver, ExplainContributor, ExplainOutput, PlannedQuery,
    PlanningInterceptor, QueryId, RewardOutcome,
};
