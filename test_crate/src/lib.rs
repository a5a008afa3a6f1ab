//! Helpers shared by the integration tests.

use propline::{PropertyModel, WriterConfig};
use std::sync::{Arc, Mutex};

/// Parse a document given as ISO-8859-1 characters, panicking on errors.
pub fn parse(text: &str) -> PropertyModel {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| u8::try_from(c).expect("not an ISO-8859-1 character"))
        .collect();
    PropertyModel::from_bytes(&bytes).expect("Parsing failed")
}

/// Writer settings with unix line endings so expected output is platform independent.
pub fn unix() -> WriterConfig {
    WriterConfig::default().with_line_separator("\n")
}

/// Serialize a document and decode the ISO-8859-1 bytes for easy comparison.
pub fn write(model: &PropertyModel, config: &WriterConfig) -> String {
    let bytes = model.to_bytes(config).expect("Writing failed");
    bytes.into_iter().map(char::from).collect()
}

/// Collects everything a listener was called with.
pub fn recorder<E: Clone + Send + 'static>() -> (Arc<Mutex<Vec<E>>>, impl FnMut(&E) + Send + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event: &E| sink.lock().unwrap().push(event.clone()))
}
