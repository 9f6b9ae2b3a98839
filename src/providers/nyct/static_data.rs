//! Static reference tables (stops.txt, routes.txt).
//!
//! Loaded once at startup and immutable for the process lifetime; both
//! request pipelines read them, nothing writes them.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::error::FeedError;

/// A subway stop or station complex (from stops.txt).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StopRecord {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Free-text list of route codes serving the stop. Incomplete or stale
    /// for some stations; the route matcher treats it as one signal among
    /// several.
    pub routes: Option<String>,
    /// Parent station id, set on child platform stops.
    pub parent: Option<String>,
}

/// A route summary row (from routes.txt).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RouteRecord {
    pub route_id: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub desc: Option<String>,
    #[serde(rename = "type")]
    pub route_type: Option<i32>,
    pub color: Option<String>,
    pub text_color: Option<String>,
}

/// The in-memory reference tables.
pub struct StaticTables {
    pub stops: HashMap<String, StopRecord>,
    pub routes: Vec<RouteRecord>,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

impl StaticTables {
    /// Load both tables from `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self, FeedError> {
        let stops_file = std::fs::File::open(data_dir.join("stops.txt"))?;
        let stops = parse_stops(stops_file)?;
        info!(count = stops.len(), "Parsed stops.txt");

        let routes_file = std::fs::File::open(data_dir.join("routes.txt"))?;
        let routes = parse_routes(routes_file)?;
        info!(count = routes.len(), "Parsed routes.txt");

        Ok(Self {
            stops,
            routes,
            loaded_at: chrono::Utc::now(),
        })
    }

    pub fn stop_name(&self, stop_id: &str) -> Option<&str> {
        self.stops.get(stop_id).map(|s| s.name.as_str())
    }
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn parse_stops<R: std::io::Read>(reader: R) -> Result<HashMap<String, StopRecord>, FeedError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let idx_id = headers
        .iter()
        .position(|h| h == "stop_id")
        .ok_or_else(|| FeedError::Parse("stops.txt missing stop_id".into()))?;
    let idx_name = headers.iter().position(|h| h == "stop_name");
    let idx_lat = headers.iter().position(|h| h == "stop_lat");
    let idx_lon = headers.iter().position(|h| h == "stop_lon");
    let idx_routes = headers.iter().position(|h| h == "routes");
    let idx_parent = headers.iter().position(|h| h == "parent_station");

    let mut stops = HashMap::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        let stop_id = record.get(idx_id).unwrap_or("").to_string();
        if stop_id.is_empty() {
            skipped += 1;
            continue;
        }
        stops.insert(
            stop_id.clone(),
            StopRecord {
                id: stop_id,
                name: idx_name
                    .and_then(|i| record.get(i))
                    .unwrap_or("")
                    .to_string(),
                lat: idx_lat
                    .and_then(|i| record.get(i))
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0),
                lon: idx_lon
                    .and_then(|i| record.get(i))
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0),
                routes: idx_routes.and_then(|i| record.get(i)).and_then(non_empty),
                parent: idx_parent.and_then(|i| record.get(i)).and_then(non_empty),
            },
        );
    }
    if skipped > 0 {
        warn!(skipped, "Skipped stops.txt records with empty stop_id");
    }
    Ok(stops)
}

fn parse_routes<R: std::io::Read>(reader: R) -> Result<Vec<RouteRecord>, FeedError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let idx_id = headers
        .iter()
        .position(|h| h == "route_id")
        .ok_or_else(|| FeedError::Parse("routes.txt missing route_id".into()))?;
    let idx_short = headers.iter().position(|h| h == "route_short_name");
    let idx_long = headers.iter().position(|h| h == "route_long_name");
    let idx_desc = headers.iter().position(|h| h == "route_desc");
    let idx_type = headers.iter().position(|h| h == "route_type");
    let idx_color = headers.iter().position(|h| h == "route_color");
    let idx_text = headers.iter().position(|h| h == "route_text_color");

    let mut routes = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        let route_id = record.get(idx_id).unwrap_or("").to_string();
        if route_id.is_empty() {
            skipped += 1;
            continue;
        }
        routes.push(RouteRecord {
            route_id,
            short_name: idx_short.and_then(|i| record.get(i)).and_then(non_empty),
            long_name: idx_long.and_then(|i| record.get(i)).and_then(non_empty),
            desc: idx_desc.and_then(|i| record.get(i)).and_then(non_empty),
            route_type: idx_type
                .and_then(|i| record.get(i))
                .and_then(|s| s.parse().ok()),
            color: idx_color.and_then(|i| record.get(i)).and_then(non_empty),
            text_color: idx_text.and_then(|i| record.get(i)).and_then(non_empty),
        });
    }
    if skipped > 0 {
        warn!(skipped, "Skipped routes.txt records with empty route_id");
    }
    Ok(routes)
}
