use super::error::{DecodeError, Error, PersistenceError, QueueError};
use super::logging;

#[test]
fn logging_init_accepts_levels() {
    // try_init makes repeated calls harmless
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
}

#[test]
fn parse_level_falls_back_to_info() {
    assert_eq!(logging::parse_level("WARNING"), tracing::Level::WARN);
    assert_eq!(logging::parse_level(" trace "), tracing::Level::TRACE);
    assert_eq!(logging::parse_level("loud"), tracing::Level::INFO);
}

#[test]
fn connectivity_error_names_stage_and_cause() {
    let err = QueueError::connectivity("dial", std::io::Error::other("refused"));
    let text = err.to_string();
    assert!(text.contains("dial"), "{text}");
    assert!(text.contains("refused"), "{text}");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn top_level_error_wraps_layers() {
    let err: Error = PersistenceError::InvalidRecord("empty name").into();
    assert!(matches!(err, Error::Persistence(_)));

    let err: Error = QueueError::acknowledgment(std::io::Error::other("gone")).into();
    assert!(matches!(err, Error::Queue(QueueError::Acknowledgment { .. })));

    assert_eq!(
        DecodeError::MissingInfoHash.to_string(),
        "payload has an empty infoHash"
    );
}
