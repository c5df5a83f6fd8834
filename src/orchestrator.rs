use crate::arms::{Arm, ArmSelector, StrategyConfig, configuration_for};
use crate::config::BaoSettings;
use crate::error::{BaoError, BaoResult};
use crate::host::{CacheInspector, QueryPlanner, is_eligible};
use crate::plan::{PlanTreeNode, plan_to_json};
use crate::protocol::ProtocolClient;
use std::fmt;

/// How a query is handled, decided from the settings at planning time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationMode {
    /// Host plans as if this crate were absent.
    Disabled,
    /// One unconstrained candidate is kept for reward reporting; no service call.
    UnconstrainedTracking,
    /// One candidate per arm; the decision service picks.
    FullSelection,
}

impl OptimizationMode {
    pub const fn from_settings(settings: &BaoSettings) -> Self {
        match (settings.enable_bao, settings.enable_selection) {
            (false, _) => Self::Disabled,
            (true, false) => Self::UnconstrainedTracking,
            (true, true) => Self::FullSelection,
        }
    }
}

/// One plan produced under one arm, with its serialized form.
#[derive(Debug)]
pub struct Candidate<P> {
    pub selector: ArmSelector,
    pub plan: P,
    pub json: String,
}

/// Plan and census JSON kept from planning until the reward is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub plan_json: String,
    pub census_json: String,
}

/// The plan to run, with what is needed to report its reward later.
#[derive(Debug)]
pub struct Selection<P> {
    pub selector: ArmSelector,
    pub plan: P,
    pub record: QueryRecord,
}

/// Why the caller should plan the query the default way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Disabled,
    Ineligible,
    ServiceUnavailable,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "optimization disabled"),
            Self::Ineligible => write!(f, "query not eligible"),
            Self::ServiceUnavailable => write!(f, "decision service unavailable"),
        }
    }
}

#[derive(Debug)]
pub enum Planned<P> {
    Selected(Selection<P>),
    Fallback(FallbackReason),
}

impl<P> Planned<P> {
    pub fn selection(self) -> Option<Selection<P>> {
        match self {
            Self::Selected(selection) => Some(selection),
            Self::Fallback(_) => None,
        }
    }
}

/// Generates per-arm candidates and drives the query exchange.
///
/// The ambient strategy configuration is an immutable value: arms are
/// applied by passing a different configuration to the planner, never by
/// mutating shared state.
pub struct ArmOrchestrator<'a, Pl: QueryPlanner, C: CacheInspector> {
    planner: &'a Pl,
    cache: &'a C,
    settings: &'a BaoSettings,
    ambient: StrategyConfig,
    client: ProtocolClient,
}

impl<'a, Pl: QueryPlanner, C: CacheInspector> ArmOrchestrator<'a, Pl, C> {
    pub fn new(
        planner: &'a Pl,
        cache: &'a C,
        settings: &'a BaoSettings,
        ambient: StrategyConfig,
    ) -> Self {
        Self {
            planner,
            cache,
            settings,
            ambient,
            client: ProtocolClient::from_settings(settings),
        }
    }

    pub const fn mode(&self) -> OptimizationMode {
        OptimizationMode::from_settings(self.settings)
    }

    /// Plan a copy of `query` under `selector` and serialize the result.
    pub fn generate_candidate(
        &self,
        query: &Pl::Query,
        params: &Pl::Params,
        selector: ArmSelector,
    ) -> BaoResult<Candidate<Pl::Plan>> {
        let strategy = match selector {
            ArmSelector::Unconstrained => self.ambient,
            ArmSelector::Arm(arm) => configuration_for(arm),
        };

        let plan = self
            .planner
            .plan(query.clone(), params, strategy)
            .map_err(BaoError::planner)?;
        let json = plan_to_json(&PlanTreeNode::from_native(&plan)?)?;

        Ok(Candidate {
            selector,
            plan,
            json,
        })
    }

    pub fn plan(&self, query: &Pl::Query, params: &Pl::Params) -> BaoResult<Planned<Pl::Plan>> {
        match self.mode() {
            OptimizationMode::Disabled => Ok(Planned::Fallback(FallbackReason::Disabled)),
            _ if !is_eligible(query) => Ok(Planned::Fallback(FallbackReason::Ineligible)),
            OptimizationMode::UnconstrainedTracking => self.track(query, params),
            OptimizationMode::FullSelection => self.select(query, params),
        }
    }

    fn track(&self, query: &Pl::Query, params: &Pl::Params) -> BaoResult<Planned<Pl::Plan>> {
        let census_json = self.cache.census().to_json()?;
        let candidate = self.generate_candidate(query, params, ArmSelector::Unconstrained)?;

        Ok(Planned::Selected(Selection {
            selector: candidate.selector,
            plan: candidate.plan,
            record: QueryRecord {
                plan_json: candidate.json,
                census_json,
            },
        }))
    }

    fn select(&self, query: &Pl::Query, params: &Pl::Params) -> BaoResult<Planned<Pl::Plan>> {
        let census_json = self.cache.census().to_json()?;
        let candidates = Arm::first(self.settings.num_arms)
            .map(|arm| self.generate_candidate(query, params, arm.into()))
            .collect::<BaoResult<Vec<_>>>()?;

        let bodies: Vec<&str> = candidates.iter().map(|c| c.json.as_str()).collect();
        let arm = match self.client.select_arm(&bodies, &census_json) {
            Ok(arm) => arm,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                log::warn!(
                    "Query exchange with {} candidates failed, using the default plan: {e}",
                    candidates.len()
                );
                return Ok(Planned::Fallback(FallbackReason::ServiceUnavailable));
            }
        };

        let count = candidates.len();
        let Some(chosen) = candidates.into_iter().nth(arm.index()) else {
            return Err(BaoError::SelectionOutOfRange {
                index: arm.index(),
                candidates: count,
            });
        };

        Ok(Planned::Selected(Selection {
            selector: chosen.selector,
            plan: chosen.plan,
            record: QueryRecord {
                plan_json: chosen.json,
                census_json,
            },
        }))
    }
}
