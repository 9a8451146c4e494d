//! Reference `OperationHandler` implementations (spec §4.9, component G).

pub mod ping_pong;

pub use ping_pong::{is_pong_response, round_trip_time, PingHandler};
