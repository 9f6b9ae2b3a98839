use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The requested group is outside the fixed feed enumeration. Raised
    /// before any network or decode work happens.
    #[error("Unknown feed group: {0}")]
    UnknownGroup(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Network error: {0}")]
    Status(String),
    #[error("Feed decode error: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Static table parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unknown_group() {
        let err = FeedError::UnknownGroup("XYZ".into());
        assert_eq!(err.to_string(), "Unknown feed group: XYZ");
    }

    #[test]
    fn error_display_status() {
        let err = FeedError::Status("feed HTTP 503".into());
        assert_eq!(err.to_string(), "Network error: feed HTTP 503");
    }

    #[test]
    fn error_display_parse() {
        let err = FeedError::Parse("stops.txt missing stop_id".into());
        assert_eq!(
            err.to_string(),
            "Static table parse error: stops.txt missing stop_id"
        );
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FeedError = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(matches!(err, FeedError::Io(_)));
    }

    #[test]
    fn error_from_prost_decode_error() {
        let bad_bytes: &[u8] = &[0xFF; 11];
        let result = <gtfs_realtime::FeedMessage as prost::Message>::decode(bad_bytes);
        let decode_err = result.unwrap_err();
        let err: FeedError = decode_err.into();
        assert!(matches!(err, FeedError::Decode(_)));
    }

    #[test]
    fn error_from_csv_error() {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(b"not,enough" as &[u8]);
        #[derive(serde::Deserialize)]
        struct ThreeFields {
            _a: String,
            _b: String,
            _c: String,
        }
        let result = rdr.deserialize::<ThreeFields>().next().unwrap();
        if let Err(csv_err) = result {
            let err: FeedError = csv_err.into();
            assert!(matches!(err, FeedError::Csv(_)));
        }
    }
}
