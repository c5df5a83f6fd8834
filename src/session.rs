//! Glue between the three host call sites (planning, execution end and
//! explain) and the arm orchestrator.

use crate::arms::{ArmSelector, StrategyConfig};
use crate::config::BaoSettings;
use crate::error::{BaoError, BaoResult};
use crate::explain::{
    BUFFER_JSON_PROPERTY, ExplainGroup, ExplainValue, GROUP_NAME, HINT_PROPERTY, NO_HINT,
    PLAN_JSON_PROPERTY, PREDICTION_PROPERTY,
};
use crate::hint::hint_for;
use crate::host::{CacheInspector, ExecutionTiming, QueryPlanner};
use crate::orchestrator::{ArmOrchestrator, FallbackReason, Planned, QueryRecord};
use crate::plan::{PlanTreeNode, plan_to_json};
use crate::protocol::{ProtocolClient, RewardMessage};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Identifies one planned query from planning until execution ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(Uuid);

impl QueryId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A plan handed back to the host.
#[derive(Debug)]
pub struct PlannedQuery<P> {
    pub plan: P,
    /// Set when a query record is waiting for this query's reward.
    pub query_id: Option<QueryId>,
    /// The arm the plan came from; `None` for the host's default plan.
    pub selector: Option<ArmSelector>,
}

/// What happened to a query's reward at execution end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardOutcome {
    /// No record was attached to the query.
    Untracked,
    /// Reward reporting is switched off.
    Disabled,
    /// The query did not really run, or ran under EXPLAIN ANALYZE.
    Skipped,
    /// No timing was captured.
    MissingTiming,
    /// The reward exchange failed.
    Dropped,
    Reported,
}

/// Output of the explain call site.
#[derive(Debug)]
pub struct ExplainOutput<P> {
    pub plan: P,
    pub group: Option<ExplainGroup>,
}

/// Planning call site.
pub trait PlanningInterceptor {
    type Query;
    type Params;
    type Plan;

    fn plan_query(
        &mut self,
        query: &Self::Query,
        params: &Self::Params,
    ) -> BaoResult<PlannedQuery<Self::Plan>>;
}

/// Execution start/end call sites.
pub trait ExecutionObserver {
    /// Whether the host must capture timing for this query.
    fn execution_started(&self, query_id: Option<QueryId>) -> bool;

    fn execution_finished(
        &mut self,
        query_id: Option<QueryId>,
        timing: &dyn ExecutionTiming,
    ) -> RewardOutcome;
}

/// Explain call site.
pub trait ExplainContributor {
    type Query;
    type Params;
    type Plan;

    fn explain(
        &mut self,
        query: &Self::Query,
        params: &Self::Params,
    ) -> BaoResult<ExplainOutput<Self::Plan>>;
}

/// State for one host execution context. Owns the query records of its
/// in-flight queries; each record is removed exactly once.
pub struct BaoSession<Pl: QueryPlanner, C: CacheInspector> {
    planner: Pl,
    cache: C,
    settings: BaoSettings,
    ambient: StrategyConfig,
    records: HashMap<QueryId, QueryRecord>,
}

impl<Pl: QueryPlanner, C: CacheInspector> BaoSession<Pl, C> {
    pub fn new(planner: Pl, cache: C, settings: BaoSettings) -> BaoResult<Self> {
        settings.validate()?;
        Ok(Self {
            planner,
            cache,
            settings,
            ambient: StrategyConfig::ALL_ENABLED,
            records: HashMap::new(),
        })
    }

    pub const fn settings(&self) -> &BaoSettings {
        &self.settings
    }

    /// Replace the settings; the next query sees the new values.
    pub fn set_settings(&mut self, settings: BaoSettings) -> BaoResult<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// The caller's own strategy configuration, used for default planning
    /// and for the unconstrained candidate.
    pub const fn ambient_strategy(&self) -> StrategyConfig {
        self.ambient
    }

    pub fn set_ambient_strategy(&mut self, strategy: StrategyConfig) {
        self.ambient = strategy;
    }

    pub const fn planner(&self) -> &Pl {
        &self.planner
    }

    pub const fn cache(&self) -> &C {
        &self.cache
    }

    pub fn pending_records(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, query_id: QueryId) -> Option<&QueryRecord> {
        self.records.get(&query_id)
    }

    /// Drop the record of a query that will never execute.
    pub fn discard(&mut self, query_id: Option<QueryId>) -> bool {
        query_id
            .and_then(|id| self.records.remove(&id))
            .is_some()
    }

    fn client(&self) -> ProtocolClient {
        ProtocolClient::from_settings(&self.settings)
    }

    fn default_plan(
        &self,
        query: &Pl::Query,
        params: &Pl::Params,
    ) -> BaoResult<PlannedQuery<Pl::Plan>> {
        let plan = self
            .planner
            .plan(query.clone(), params, self.ambient)
            .map_err(BaoError::planner)?;
        Ok(PlannedQuery {
            plan,
            query_id: None,
            selector: None,
        })
    }

    /// Ask the decision service for a hint with selection forced on.
    fn recommend_hint(
        &self,
        query: &Pl::Query,
        params: &Pl::Params,
    ) -> BaoResult<Option<ExplainValue>> {
        let forced = BaoSettings {
            enable_selection: true,
            ..self.settings.clone()
        };
        let orchestrator = ArmOrchestrator::new(&self.planner, &self.cache, &forced, self.ambient);

        match orchestrator.plan(query, params) {
            Ok(Planned::Selected(selection)) => {
                let text = selection
                    .selector
                    .arm()
                    .and_then(hint_for)
                    .map_or_else(|| NO_HINT.to_string(), |hint| hint.to_string());
                Ok(Some(ExplainValue::Text(text)))
            }
            Ok(Planned::Fallback(FallbackReason::Ineligible)) => {
                log::debug!("Query not eligible, omitting hint");
                Ok(None)
            }
            Ok(Planned::Fallback(reason)) => {
                log::warn!("Could not select an arm during explain ({reason}), omitting hint");
                Ok(None)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::warn!("Could not select an arm during explain, omitting hint: {e}");
                Ok(None)
            }
        }
    }
}

impl<Pl: QueryPlanner, C: CacheInspector> PlanningInterceptor for BaoSession<Pl, C> {
    type Query = Pl::Query;
    type Params = Pl::Params;
    type Plan = Pl::Plan;

    fn plan_query(
        &mut self,
        query: &Pl::Query,
        params: &Pl::Params,
    ) -> BaoResult<PlannedQuery<Pl::Plan>> {
        let started = Instant::now();
        let outcome = ArmOrchestrator::new(&self.planner, &self.cache, &self.settings, self.ambient)
            .plan(query, params);

        let selection = match outcome {
            Ok(Planned::Selected(selection)) => selection,
            Ok(Planned::Fallback(reason)) => {
                log::debug!("Using the default plan: {reason}");
                return self.default_plan(query, params);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("Arm evaluation failed, using the default plan: {e}");
                return self.default_plan(query, params);
            }
        };

        log::info!(
            "Bao planning selected {} in {:.3} ms",
            selection.selector,
            started.elapsed().as_secs_f64() * 1000.0
        );

        let query_id = if self.settings.enable_rewards {
            let id = QueryId::new();
            self.records.insert(id, selection.record);
            Some(id)
        } else {
            None
        };

        Ok(PlannedQuery {
            plan: selection.plan,
            query_id,
            selector: Some(selection.selector),
        })
    }
}

impl<Pl: QueryPlanner, C: CacheInspector> ExecutionObserver for BaoSession<Pl, C> {
    fn execution_started(&self, query_id: Option<QueryId>) -> bool {
        self.settings.enable_rewards
            && query_id.is_some_and(|id| self.records.contains_key(&id))
    }

    fn execution_finished(
        &mut self,
        query_id: Option<QueryId>,
        timing: &dyn ExecutionTiming,
    ) -> RewardOutcome {
        let Some(record) = query_id.and_then(|id| self.records.remove(&id)) else {
            return RewardOutcome::Untracked;
        };

        if !self.settings.enable_rewards {
            return RewardOutcome::Disabled;
        }
        if !timing.already_executed() || timing.instrumented() {
            return RewardOutcome::Skipped;
        }
        let Some(latency_ms) = timing.elapsed_ms() else {
            log::warn!("No instrumentation result for the query, reward dropped");
            return RewardOutcome::MissingTiming;
        };

        let reward = RewardMessage::new(latency_ms);
        match self
            .client()
            .report_reward(&record.plan_json, &record.census_json, &reward)
        {
            Ok(()) => {
                log::debug!("Reported reward of {latency_ms:.3} ms");
                RewardOutcome::Reported
            }
            Err(e) => {
                log::warn!("Reward exchange failed, reward dropped: {e}");
                RewardOutcome::Dropped
            }
        }
    }
}

impl<Pl: QueryPlanner, C: CacheInspector> ExplainContributor for BaoSession<Pl, C> {
    type Query = Pl::Query;
    type Params = Pl::Params;
    type Plan = Pl::Plan;

    fn explain(
        &mut self,
        query: &Pl::Query,
        params: &Pl::Params,
    ) -> BaoResult<ExplainOutput<Pl::Plan>> {
        let planned = self.plan_query(query, params)?;
        // EXPLAIN never executes, so nothing will consume the record.
        self.discard(planned.query_id);

        if !self.settings.enable_bao {
            return Ok(ExplainOutput {
                plan: planned.plan,
                group: None,
            });
        }

        let tree = match PlanTreeNode::from_native(&planned.plan) {
            Ok(tree) => tree,
            Err(e) => {
                log::warn!("Plan cannot be described for the decision service: {e}");
                return Ok(ExplainOutput {
                    plan: planned.plan,
                    group: None,
                });
            }
        };
        let plan_json = plan_to_json(&tree)?;
        let census_json = self.cache.census().to_json()?;

        let mut group = ExplainGroup::new(GROUP_NAME);
        match self.client().predict(&plan_json, &census_json) {
            Ok(prediction) => {
                group.push(PREDICTION_PROPERTY, ExplainValue::float(prediction, "ms", 3));
            }
            Err(e) => log::warn!("Predict exchange failed, no prediction provided: {e}"),
        }

        if self.settings.include_json_in_explain {
            group.push(PLAN_JSON_PROPERTY, ExplainValue::Text(plan_json));
            group.push(BUFFER_JSON_PROPERTY, ExplainValue::Text(census_json));
        }

        if let Some(hint) = self.recommend_hint(query, params)? {
            group.push(HINT_PROPERTY, hint);
        }

        Ok(ExplainOutput {
            plan: planned.plan,
            group: Some(group),
        })
    }
}
