//! GTFS-RT fetch, decode, and normalization.
//!
//! The wire feed is protobuf; everything downstream of this module works on
//! the flat `TripUpdate` records produced here. Times are carried as
//! RFC 3339 strings so the records serialize as-is.

use chrono::{DateTime, Utc};
use prost::Message;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use super::error::FeedError;
use super::static_data::{non_empty, StaticTables};

/// Maximum allowed protobuf response size (50 MB)
const MAX_FEED_SIZE: usize = 50 * 1024 * 1024;

/// A timed stop event: absolute instant plus the reported delay.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopTimeInfo {
    pub time: Option<String>,
    pub delay: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopUpdate {
    pub stop_id: Option<String>,
    pub stop_name: Option<String>,
    pub arrival: StopTimeInfo,
    pub departure: StopTimeInfo,
    pub schedule_relationship: Option<String>,
}

/// One vehicle's stop-by-stop update, flattened from a feed entity.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TripUpdate {
    pub id: Option<String>,
    pub route_id: Option<String>,
    pub trip_id: Option<String>,
    pub start_date: Option<String>,
    pub vehicle_id: Option<String>,
    pub stop_updates: Vec<StopUpdate>,
    /// Feed-header instant; the whole decode shares one value.
    pub timestamp: Option<String>,
}

/// Fetch and decode one group's GTFS-RT protobuf feed.
pub async fn fetch_feed_message(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    timeout: std::time::Duration,
) -> Result<gtfs_realtime::FeedMessage, FeedError> {
    let mut request = client.get(url).timeout(timeout);
    if let Some(key) = api_key {
        request = request.header("x-api-key", key);
    }

    let response = request.send().await?;

    if !response.status().is_success() {
        return Err(FeedError::Status(format!(
            "feed HTTP {}",
            response.status()
        )));
    }

    let bytes = response.bytes().await?;

    if bytes.len() > MAX_FEED_SIZE {
        return Err(FeedError::Status(format!(
            "feed response too large: {} bytes (max {} bytes)",
            bytes.len(),
            MAX_FEED_SIZE
        )));
    }

    gtfs_realtime::FeedMessage::decode(bytes.as_ref()).map_err(FeedError::from)
}

/// Flatten a decoded feed into trip-update records, resolving stop names
/// from the static stop table. Entities without a trip update (vehicle
/// positions, alerts) are dropped entirely.
pub fn normalize_trip_updates(
    feed: &gtfs_realtime::FeedMessage,
    tables: &StaticTables,
) -> Vec<TripUpdate> {
    let header_timestamp = feed
        .header
        .timestamp
        .and_then(|ts| epoch_to_rfc3339(ts as i64));

    let mut records = Vec::new();
    for entity in &feed.entity {
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };

        let vehicle_id = entity
            .vehicle
            .as_ref()
            .and_then(|vp| vp.vehicle.as_ref())
            .and_then(|vd| vd.id.as_deref())
            .and_then(non_empty);

        let stop_updates = trip_update
            .stop_time_update
            .iter()
            .map(|stu| {
                let stop_name = stu
                    .stop_id
                    .as_deref()
                    .and_then(|sid| tables.stop_name(sid))
                    .map(str::to_string);
                StopUpdate {
                    stop_id: stu.stop_id.as_deref().and_then(non_empty),
                    stop_name,
                    arrival: stop_time_info(stu.arrival.as_ref()),
                    departure: stop_time_info(stu.departure.as_ref()),
                    schedule_relationship: schedule_relationship_name(stu.schedule_relationship),
                }
            })
            .collect();

        records.push(TripUpdate {
            id: non_empty(&entity.id),
            route_id: trip_update.trip.route_id.as_deref().and_then(non_empty),
            trip_id: trip_update.trip.trip_id.as_deref().and_then(non_empty),
            start_date: trip_update.trip.start_date.as_deref().and_then(non_empty),
            vehicle_id,
            stop_updates,
            timestamp: header_timestamp.clone(),
        });
    }

    debug!(
        entities = feed.entity.len(),
        trip_updates = records.len(),
        "Normalized GTFS-RT feed"
    );
    records
}

fn stop_time_info(event: Option<&gtfs_realtime::trip_update::StopTimeEvent>) -> StopTimeInfo {
    StopTimeInfo {
        time: event
            .and_then(|e| e.time)
            .and_then(epoch_to_rfc3339),
        delay: event.and_then(|e| e.delay),
    }
}

/// Zero means "no value" in the wire feed; never produce epoch-zero
/// instants.
fn epoch_to_rfc3339(secs: i64) -> Option<String> {
    if secs <= 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339())
}

/// StopTimeUpdate.ScheduleRelationship wire values by number.
fn schedule_relationship_name(raw: Option<i32>) -> Option<String> {
    let name = match raw? {
        0 => "SCHEDULED",
        1 => "SKIPPED",
        2 => "NO_DATA",
        3 => "UNSCHEDULED",
        _ => return None,
    };
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::providers::nyct::static_data::StopRecord;

    fn make_tables() -> StaticTables {
        let mut stops = HashMap::new();
        stops.insert(
            "R15N".to_string(),
            StopRecord {
                id: "R15N".to_string(),
                name: "49 St".to_string(),
                lat: 40.7797,
                lon: -73.984,
                routes: None,
                parent: Some("R15".to_string()),
            },
        );
        StaticTables {
            stops,
            routes: Vec::new(),
            loaded_at: chrono::Utc::now(),
        }
    }

    fn make_feed_message(
        timestamp: Option<u64>,
        entities: Vec<gtfs_realtime::FeedEntity>,
    ) -> gtfs_realtime::FeedMessage {
        gtfs_realtime::FeedMessage {
            header: gtfs_realtime::FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                incrementality: Some(0),
                timestamp,
                ..Default::default()
            },
            entity: entities,
        }
    }

    fn make_trip_update_entity(
        entity_id: &str,
        route_id: Option<&str>,
        trip_id: Option<&str>,
        stop_time_updates: Vec<gtfs_realtime::trip_update::StopTimeUpdate>,
    ) -> gtfs_realtime::FeedEntity {
        gtfs_realtime::FeedEntity {
            id: entity_id.to_string(),
            trip_update: Some(gtfs_realtime::TripUpdate {
                trip: gtfs_realtime::TripDescriptor {
                    trip_id: trip_id.map(str::to_string),
                    route_id: route_id.map(str::to_string),
                    start_date: Some("20260806".to_string()),
                    ..Default::default()
                },
                stop_time_update: stop_time_updates,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn make_stop_time_update(
        stop_id: &str,
        arrival_time: Option<i64>,
        departure_time: Option<i64>,
    ) -> gtfs_realtime::trip_update::StopTimeUpdate {
        gtfs_realtime::trip_update::StopTimeUpdate {
            stop_id: Some(stop_id.to_string()),
            arrival: arrival_time.map(|t| gtfs_realtime::trip_update::StopTimeEvent {
                time: Some(t),
                delay: Some(30),
                ..Default::default()
            }),
            departure: departure_time.map(|t| gtfs_realtime::trip_update::StopTimeEvent {
                time: Some(t),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn entities_without_trip_updates_are_dropped() {
        let tables = make_tables();
        let vehicle_only = gtfs_realtime::FeedEntity {
            id: "v1".to_string(),
            vehicle: Some(gtfs_realtime::VehiclePosition::default()),
            ..Default::default()
        };
        let with_update = make_trip_update_entity("e1", Some("Q"), Some("t1"), vec![]);
        let feed = make_feed_message(Some(1_754_000_000), vec![vehicle_only, with_update]);

        let records = normalize_trip_updates(&feed, &tables);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("e1"));
        assert_eq!(records[0].route_id.as_deref(), Some("Q"));
        assert_eq!(records[0].trip_id.as_deref(), Some("t1"));
        assert_eq!(records[0].start_date.as_deref(), Some("20260806"));
    }

    #[test]
    fn stop_names_resolve_from_the_static_table() {
        let tables = make_tables();
        let entity = make_trip_update_entity(
            "e1",
            Some("Q"),
            Some("t1"),
            vec![
                make_stop_time_update("R15N", Some(1_754_000_100), None),
                make_stop_time_update("ZZZ", Some(1_754_000_200), None),
            ],
        );
        let feed = make_feed_message(Some(1_754_000_000), vec![entity]);

        let records = normalize_trip_updates(&feed, &tables);
        let updates = &records[0].stop_updates;
        assert_eq!(updates[0].stop_name.as_deref(), Some("49 St"));
        // Unknown stop id resolves to nothing, never an error.
        assert_eq!(updates[1].stop_name, None);
        assert_eq!(updates[1].stop_id.as_deref(), Some("ZZZ"));
    }

    #[test]
    fn times_and_delays_pass_through() {
        let tables = make_tables();
        let entity = make_trip_update_entity(
            "e1",
            Some("Q"),
            Some("t1"),
            vec![make_stop_time_update(
                "R15N",
                Some(1_754_000_100),
                Some(1_754_000_130),
            )],
        );
        let feed = make_feed_message(Some(1_754_000_000), vec![entity]);

        let records = normalize_trip_updates(&feed, &tables);
        let su = &records[0].stop_updates[0];
        assert_eq!(
            su.arrival.time.as_deref(),
            Some("2025-07-31T22:15:00+00:00")
        );
        assert_eq!(su.arrival.delay, Some(30));
        assert_eq!(
            su.departure.time.as_deref(),
            Some("2025-07-31T22:15:30+00:00")
        );
        assert_eq!(su.departure.delay, None);
    }

    #[test]
    fn zero_timestamps_become_absent() {
        let tables = make_tables();
        let stu = gtfs_realtime::trip_update::StopTimeUpdate {
            stop_id: Some("R15N".to_string()),
            arrival: Some(gtfs_realtime::trip_update::StopTimeEvent {
                time: Some(0),
                delay: Some(-15),
                ..Default::default()
            }),
            ..Default::default()
        };
        let entity = make_trip_update_entity("e1", Some("Q"), Some("t1"), vec![stu]);
        let feed = make_feed_message(Some(0), vec![entity]);

        let records = normalize_trip_updates(&feed, &tables);
        assert_eq!(records[0].timestamp, None);
        let su = &records[0].stop_updates[0];
        assert_eq!(su.arrival.time, None);
        // The delay survives even when the instant is absent.
        assert_eq!(su.arrival.delay, Some(-15));
        assert_eq!(su.departure.time, None);
        assert_eq!(su.departure.delay, None);
    }

    #[test]
    fn header_timestamp_is_shared_by_every_record() {
        let tables = make_tables();
        let feed = make_feed_message(
            Some(1_754_000_000),
            vec![
                make_trip_update_entity("e1", Some("N"), Some("t1"), vec![]),
                make_trip_update_entity("e2", Some("Q"), Some("t2"), vec![]),
            ],
        );
        let records = normalize_trip_updates(&feed, &tables);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, records[1].timestamp);
        assert!(records[0].timestamp.as_deref().unwrap().starts_with("2025-07-31T"));
    }

    #[test]
    fn schedule_relationship_maps_to_enum_names() {
        assert_eq!(schedule_relationship_name(None), None);
        assert_eq!(
            schedule_relationship_name(Some(0)).as_deref(),
            Some("SCHEDULED")
        );
        assert_eq!(
            schedule_relationship_name(Some(1)).as_deref(),
            Some("SKIPPED")
        );
        assert_eq!(
            schedule_relationship_name(Some(2)).as_deref(),
            Some("NO_DATA")
        );
        // Values outside the enumeration are dropped, not crashed on.
        assert_eq!(schedule_relationship_name(Some(99)), None);
    }

    #[test]
    fn vehicle_id_comes_from_the_entity_vehicle_position() {
        let tables = make_tables();
        let mut entity = make_trip_update_entity("e1", Some("Q"), Some("t1"), vec![]);
        entity.vehicle = Some(gtfs_realtime::VehiclePosition {
            vehicle: Some(gtfs_realtime::VehicleDescriptor {
                id: Some("car-8001".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        let feed = make_feed_message(Some(1_754_000_000), vec![entity]);

        let records = normalize_trip_updates(&feed, &tables);
        assert_eq!(records[0].vehicle_id.as_deref(), Some("car-8001"));
    }

    #[test]
    fn empty_entity_id_becomes_absent() {
        let tables = make_tables();
        let feed = make_feed_message(
            Some(1_754_000_000),
            vec![make_trip_update_entity("", None, None, vec![])],
        );
        let records = normalize_trip_updates(&feed, &tables);
        assert_eq!(records[0].id, None);
        assert_eq!(records[0].route_id, None);
        assert_eq!(records[0].trip_id, None);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let bad_bytes: &[u8] = &[0xFF; 16];
        let result = gtfs_realtime::FeedMessage::decode(bad_bytes);
        assert!(result.is_err());
    }

    #[test]
    fn trip_update_serializes_with_camel_case_wire_names() {
        let tables = make_tables();
        let entity = make_trip_update_entity(
            "e1",
            Some("Q"),
            Some("t1"),
            vec![make_stop_time_update("R15N", Some(1_754_000_100), None)],
        );
        let feed = make_feed_message(Some(1_754_000_000), vec![entity]);
        let records = normalize_trip_updates(&feed, &tables);

        let json = serde_json::to_value(&records[0]).unwrap();
        assert!(json.get("routeId").is_some());
        assert!(json.get("tripId").is_some());
        assert!(json.get("startDate").is_some());
        assert!(json.get("stopUpdates").is_some());
        assert!(json["stopUpdates"][0].get("stopName").is_some());
        assert!(json["stopUpdates"][0].get("scheduleRelationship").is_some());
    }
}
