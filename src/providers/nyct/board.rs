//! Arrival-board construction and read-time relabeling.
//!
//! A board is built once per group per cache window and keeps absolute
//! instants only. The human-facing strings (`in`, `whenLocal`) are
//! recomputed against the current clock on every read, so a board cached
//! nineteen minutes ago still shows correct countdowns.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use super::realtime::TripUpdate;
use super::static_data::StaticTables;

/// Grace for arrivals just past, in seconds.
const PAST_GRACE_SECS: i64 = 60;
/// Board lookahead, in minutes.
const LOOKAHEAD_MINS: i64 = 20;
/// Cap on arrivals kept per stop.
const MAX_ARRIVALS_PER_STOP: usize = 8;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalMeta {
    pub arrival_delay: Option<i32>,
    pub departure_delay: Option<i32>,
}

/// One row on a stop's board.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalItem {
    pub stop_id: String,
    pub stop_name: Option<String>,
    #[serde(rename = "whenISO")]
    pub when_iso: String,
    pub when_local: Option<String>,
    /// Relative countdown label, e.g. "now", "3m", "2m ago".
    #[serde(rename = "in")]
    pub eta: String,
    pub route_id: Option<String>,
    pub trip_id: Option<String>,
    pub schedule_relationship: Option<String>,
    pub meta: ArrivalMeta,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub stop_id: String,
    pub stop_name: String,
    pub updated_at: String,
    pub arrivals: Vec<ArrivalItem>,
}

/// The per-group board: stop id to its upcoming arrivals.
pub type Board = HashMap<String, BoardRow>;

/// Response row for one stop, relabeled at read time.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopBoard {
    pub stop_id: String,
    pub stop_name: Option<String>,
    pub updated_at: Option<String>,
    pub now: String,
    pub arrivals: Vec<ArrivalItem>,
}

/// Build the per-stop board from a normalized feed.
///
/// Every stop update whose resolved time (arrival preferred, departure as
/// fallback) falls in `[now - 60s, now + 20min]` is kept; groups are sorted
/// ascending by time and truncated to the first 8.
pub fn build_board(feed: &[TripUpdate], tables: &StaticTables, now: DateTime<Utc>, tz: Tz) -> Board {
    let floor = now - Duration::seconds(PAST_GRACE_SECS);
    let cutoff = now + Duration::minutes(LOOKAHEAD_MINS);

    let mut by_stop: HashMap<String, Vec<ArrivalItem>> = HashMap::new();
    for record in feed {
        for su in &record.stop_updates {
            let Some(stop_id) = su.stop_id.clone() else {
                continue;
            };
            let Some(when_iso) = su.arrival.time.as_ref().or(su.departure.time.as_ref()) else {
                continue;
            };
            let Some(when) = parse_rfc3339(when_iso) else {
                continue;
            };
            if when < floor || when > cutoff {
                continue;
            }

            by_stop.entry(stop_id.clone()).or_default().push(ArrivalItem {
                stop_id,
                stop_name: su.stop_name.clone(),
                when_iso: when_iso.clone(),
                when_local: local_clock(Some(when), tz),
                eta: human_eta(Some(when), now),
                route_id: record.route_id.clone(),
                trip_id: record.trip_id.clone(),
                schedule_relationship: su.schedule_relationship.clone(),
                meta: ArrivalMeta {
                    arrival_delay: su.arrival.delay,
                    departure_delay: su.departure.delay,
                },
            });
        }
    }

    let mut board = Board::new();
    for (stop_id, mut arrivals) in by_stop {
        // RFC 3339 strings from one decode share a format, so the
        // lexicographic order is the chronological one.
        arrivals.sort_by(|a, b| a.when_iso.cmp(&b.when_iso));
        arrivals.truncate(MAX_ARRIVALS_PER_STOP);

        let stop_name = arrivals
            .first()
            .and_then(|a| a.stop_name.clone())
            .or_else(|| tables.stop_name(&stop_id).map(str::to_string))
            .unwrap_or_else(|| stop_id.clone());

        board.insert(
            stop_id.clone(),
            BoardRow {
                stop_id,
                stop_name,
                updated_at: now.to_rfc3339(),
                arrivals,
            },
        );
    }
    board
}

/// Project one stop's row out of a board, recomputing the human labels
/// against `now`. A stop with no row yields a well-formed empty result.
pub fn board_for_stop(board: &Board, stop_id: &str, now: DateTime<Utc>, tz: Tz) -> StopBoard {
    let Some(row) = board.get(stop_id) else {
        return StopBoard {
            stop_id: stop_id.to_string(),
            stop_name: None,
            updated_at: None,
            now: now.to_rfc3339(),
            arrivals: Vec::new(),
        };
    };

    let arrivals = row
        .arrivals
        .iter()
        .map(|a| {
            let when = parse_rfc3339(&a.when_iso);
            ArrivalItem {
                eta: human_eta(when, now),
                when_local: local_clock(when, tz),
                ..a.clone()
            }
        })
        .collect();

    StopBoard {
        stop_id: row.stop_id.clone(),
        stop_name: Some(row.stop_name.clone()),
        updated_at: Some(row.updated_at.clone()),
        now: now.to_rfc3339(),
        arrivals,
    }
}

/// Relative countdown label against `now`. More than 30s in the past reads
/// "Nm ago" with N rounded; within ±30s reads "now"; the future reads whole
/// minutes with a "1m" floor. An absent instant reads as an em-dash.
pub fn human_eta(when: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(when) = when else {
        return "—".to_string();
    };
    let secs = (when - now).num_seconds();
    if secs < -30 {
        let mins = ((-secs) as f64 / 60.0).round() as i64;
        return format!("{mins}m ago");
    }
    if secs <= 30 {
        return "now".to_string();
    }
    let mins = secs / 60;
    if mins <= 1 {
        "1m".to_string()
    } else {
        format!("{mins}m")
    }
}

/// Localized clock string, e.g. "3:05 PM".
pub fn local_clock(when: Option<DateTime<Utc>>, tz: Tz) -> Option<String> {
    when.map(|dt| dt.with_timezone(&tz).format("%-I:%M %p").to_string())
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
