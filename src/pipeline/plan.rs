//! Deferred batch plans: describe the work first, run it second.
//!
//! Plan construction is pure — no file is touched until `compute` — which is
//! what makes `dot()` useful: the full task graph can be inspected before
//! paying the execution cost. Cities are independent branches; rayon
//! schedules them in any order.

use rayon::prelude::*;
use tracing::warn;

use crate::model::City;
use crate::{Error, Result};

use super::{run_city, CityArtifacts, PipelineConfig};

/// Per-city stage names, in dependency order, for graph rendering.
const STAGES: &[&str] = &[
    "load_parks",
    "load_nodes",
    "load_edges",
    "build_network",
    "register_pois",
    "nearest_pois",
    "load_buildings",
    "accessibility",
    "render_figure",
];

/// Data-dependency edges between stages of one city.
const STAGE_EDGES: &[(&str, &str)] = &[
    ("load_nodes", "build_network"),
    ("load_edges", "build_network"),
    ("build_network", "register_pois"),
    ("load_parks", "register_pois"),
    ("register_pois", "nearest_pois"),
    ("register_pois", "accessibility"),
    ("load_buildings", "accessibility"),
    ("accessibility", "render_figure"),
    ("load_parks", "render_figure"),
];

/// Deferred pipeline run for one city.
#[derive(Debug, Clone)]
pub struct CityPlan {
    city: City,
    config: PipelineConfig,
}

impl CityPlan {
    pub fn new(config: PipelineConfig, city: City) -> Self {
        Self { city, config }
    }

    pub fn city(&self) -> &City {
        &self.city
    }

    /// Evaluate this city's pipeline now.
    pub fn compute(&self) -> Result<CityArtifacts> {
        run_city(&self.config, &self.city)
    }
}

/// Deferred pipeline runs for a city collection.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    plans: Vec<CityPlan>,
}

impl BatchPlan {
    /// Pure construction: nothing is loaded or executed here.
    pub fn new(config: PipelineConfig, cities: impl IntoIterator<Item = City>) -> Self {
        let plans = cities
            .into_iter()
            .map(|city| CityPlan::new(config.clone(), city))
            .collect();
        Self { plans }
    }

    /// A one-city plan, for lazy single-city execution.
    pub fn single(config: PipelineConfig, city: City) -> Self {
        Self::new(config, [city])
    }

    pub fn plans(&self) -> &[CityPlan] {
        &self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Graphviz DOT rendering of the task graph: one cluster per city, stage
    /// nodes connected by their data dependencies. Sibling clusters share no
    /// edges — cities are independent.
    pub fn dot(&self) -> String {
        let mut out = String::from("digraph batch {\n  rankdir=LR;\n  node [shape=box];\n");
        for (ci, plan) in self.plans.iter().enumerate() {
            out.push_str(&format!(
                "  subgraph cluster_{ci} {{\n    label=\"{}\";\n",
                plan.city().name()
            ));
            for stage in STAGES {
                out.push_str(&format!("    c{ci}_{stage} [label=\"{stage}\"];\n"));
            }
            for (from, to) in STAGE_EDGES {
                out.push_str(&format!("    c{ci}_{from} -> c{ci}_{to};\n"));
            }
            out.push_str("  }\n");
        }
        out.push_str("}\n");
        out
    }

    /// Evaluate all cities in parallel. Per-city failures are recorded in
    /// the report; no failure aborts a sibling city.
    pub fn compute(&self) -> BatchReport {
        let outcomes = self
            .plans
            .par_iter()
            .map(|plan| Self::evaluate(plan))
            .collect();
        BatchReport { outcomes }
    }

    /// Same semantics as [`compute`](Self::compute), one city at a time.
    pub fn compute_serial(&self) -> BatchReport {
        let outcomes = self.plans.iter().map(Self::evaluate).collect();
        BatchReport { outcomes }
    }

    fn evaluate(plan: &CityPlan) -> CityOutcome {
        let result = plan.compute();
        if let Err(err) = &result {
            warn!(city = %plan.city(), %err, "city pipeline failed");
        }
        CityOutcome { city: plan.city().clone(), result }
    }
}

/// One city's batch outcome: artifacts or the error that stopped it.
#[derive(Debug)]
pub struct CityOutcome {
    pub city: City,
    pub result: Result<CityArtifacts>,
}

impl CityOutcome {
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

/// Results of a batch evaluation, in city order.
#[derive(Debug)]
pub struct BatchReport {
    outcomes: Vec<CityOutcome>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[CityOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &CityOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &CityOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}
