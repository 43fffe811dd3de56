pub mod batch;
pub mod classify;
pub mod document;
pub mod enhance;
pub mod logging;
pub mod query;
pub mod search_client;
pub mod segmenter;
pub mod settings;
pub mod token_processor;
