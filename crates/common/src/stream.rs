//! Stream-name construction and parsing.
//!
//! Stream names follow the message store conventions:
//!
//! - `"{category}-{entityId}"` — entity stream
//! - `"{category}:command"` — command stream, one per category
//! - `"{subscriberId}+position"` — subscriber-owned position stream
//!
//! Categories must not contain a hyphen; the hyphen is what makes entity
//! stream names parseable. Entity IDs may themselves contain hyphens, so
//! only the first hyphen splits a stream name.

/// Suffix that marks a command stream.
pub const COMMAND_SUFFIX: &str = ":command";

/// Suffix that marks a subscriber position stream.
pub const POSITION_SUFFIX: &str = "+position";

/// Builds the command stream name for a category.
pub fn command_stream(category: &str) -> String {
    format!("{category}{COMMAND_SUFFIX}")
}

/// Builds the entity stream name for a `(category, entityId)` pair.
pub fn entity_stream(category: &str, entity_id: &str) -> String {
    format!("{category}-{entity_id}")
}

/// Builds the position stream name for a subscriber.
pub fn position_stream(subscriber_id: &str) -> String {
    format!("{subscriber_id}{POSITION_SUFFIX}")
}

/// Returns true if the stream name refers to a command stream.
pub fn is_command_stream(stream_name: &str) -> bool {
    stream_name.ends_with(COMMAND_SUFFIX)
}

/// Extracts the category portion of a stream name.
///
/// For command streams this is everything before the `":command"` suffix;
/// for entity streams everything before the first hyphen. Stream names with
/// neither shape (e.g. position streams) are their own category.
pub fn category_of(stream_name: &str) -> &str {
    if let Some(category) = stream_name.strip_suffix(COMMAND_SUFFIX) {
        return category;
    }
    match stream_name.split_once('-') {
        Some((category, _)) => category,
        None => stream_name,
    }
}

/// Extracts the entity ID from an entity stream name.
///
/// Returns `None` for command streams and stream names without a hyphen.
pub fn entity_id_of(stream_name: &str) -> Option<&str> {
    if is_command_stream(stream_name) {
        return None;
    }
    stream_name.split_once('-').map(|(_, entity_id)| entity_id)
}
