// Adapters between the room use cases and the outside world: HTTP routes, WebSocket
// sessions and the JSON wire format.

pub mod http;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;
