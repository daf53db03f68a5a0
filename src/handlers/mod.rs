mod handlers;
mod messages;
mod websockets;

pub use handlers::{AppState, Handle};
pub use messages::{ClientMessage, ServerMessage};
pub use websockets::WebSockets;
