pub mod http;
pub mod state;

pub use http::BackendClient;
pub use state::{ClientState, Redraw};
