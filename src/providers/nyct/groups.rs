//! The fixed NYCT feed-group enumeration.
//!
//! Each group is a cluster of subway lines sharing one real-time endpoint.
//! The set is closed; anything outside it is a caller error, not a lookup
//! miss.

/// One real-time feed endpoint covering a cluster of lines.
#[derive(Debug, Clone, Copy)]
pub struct FeedGroup {
    pub id: &'static str,
    pub url: &'static str,
}

pub const FEED_GROUPS: &[FeedGroup] = &[
    FeedGroup {
        id: "ACE",
        url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-ace",
    },
    FeedGroup {
        id: "BDFM",
        url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-bdfm",
    },
    FeedGroup {
        id: "G",
        url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-g",
    },
    FeedGroup {
        id: "JZ",
        url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-jz",
    },
    FeedGroup {
        id: "NQRW",
        url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-nqrw",
    },
    FeedGroup {
        id: "L",
        url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-l",
    },
    FeedGroup {
        id: "SI",
        url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-si",
    },
    FeedGroup {
        id: "1234567",
        url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs",
    },
];

/// Case-insensitive lookup into the enumeration.
pub fn resolve_group(id: &str) -> Option<&'static FeedGroup> {
    FEED_GROUPS.iter().find(|g| g.id.eq_ignore_ascii_case(id))
}

pub fn list_groups() -> Vec<&'static str> {
    FEED_GROUPS.iter().map(|g| g.id).collect()
}
