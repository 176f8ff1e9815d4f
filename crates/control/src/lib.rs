//! Control-plane API for the DHT node.
//!
//! A single HTTP endpoint accepting a JSON command document:
//!
//! ```text
//! {"JSONRPCMethod": "dht_putValue", "Key": "k1", "Value": "v1"}
//! {"JSONRPCMethod": "dht_getValue", "Key": "k1"}
//! ```
//!
//! Every request gets an explicit response. Failures carry a status code
//! and a JSON body of the form `{"error": "<code>", "message": "<text>"}`.

pub mod error;
pub mod handler;
pub mod request;
pub mod server;

pub use error::{ApiError, Result};
pub use handler::{build_router, ControlState};
pub use request::{Command, ControlRequest, GET_VALUE, PUT_VALUE};
pub use server::ControlServer;
