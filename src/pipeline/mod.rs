//! Orchestration: eager per-city runs and deferred batch plans.

mod config;
mod plan;

pub use config::PipelineConfig;
pub use plan::{BatchPlan, BatchReport, CityOutcome, CityPlan};

use std::fs;
use std::path::PathBuf;

use tracing::{info, info_span};

use crate::analysis::{self, AccessibilityTable, DistanceTable};
use crate::io;
use crate::model::{City, LayerKind};
use crate::network::RoutableNetwork;
use crate::render::{self, RenderOptions};
use crate::Result;

/// Category name under which park centroids are registered.
pub const POI_CATEGORY: &str = "parks";

/// Everything one successful city run produces.
#[derive(Debug)]
pub struct CityArtifacts {
    pub city: City,
    pub proximity: DistanceTable,
    pub accessibility: AccessibilityTable,
    pub figure: PathBuf,
}

/// Run the full pipeline for one city, eagerly and serially.
///
/// Stages: load parks/nodes/edges → build network → register park centroids
/// as POIs → proximity table → load buildings → accessibility table → render
/// figure to `<fig_root>/<city>.png`.
pub fn run_city(config: &PipelineConfig, city: &City) -> Result<CityArtifacts> {
    let span = info_span!("city", name = %city);
    let _guard = span.enter();

    let parks = io::load_layer(&config.data_root, city, LayerKind::Parks)?;
    let nodes = io::load_layer(&config.data_root, city, LayerKind::Nodes)?;
    let edges = io::load_layer(&config.data_root, city, LayerKind::Edges)?;

    let mut net = RoutableNetwork::build(&nodes, &edges)?;
    let poi_points = parks.centroids();
    net.register_pois(
        POI_CATEGORY,
        &poi_points,
        config.poi_max_distance,
        config.poi_max_items,
    )?;

    let proximity = analysis::nearest_pois(
        &net,
        POI_CATEGORY,
        config.distance_threshold,
        config.poi_count,
    )?;

    let buildings = io::load_layer(&config.data_root, city, LayerKind::Buildings)?;
    let accessibility = analysis::building_accessibility(
        &net,
        POI_CATEGORY,
        config.distance_threshold,
        &buildings,
    )?;

    fs::create_dir_all(&config.fig_root)?;
    let figure = city.figure_path(&config.fig_root);
    render::render_access_map(
        &RenderOptions::default(),
        &buildings,
        &accessibility,
        &poi_points,
        &figure,
    )?;

    info!(figure = %figure.display(), "city pipeline finished");
    Ok(CityArtifacts { city: city.clone(), proximity, accessibility, figure })
}
