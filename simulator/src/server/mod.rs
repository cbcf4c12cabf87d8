pub mod routes;

use crate::store::SharedState;
use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;

pub use routes::routes;

/// Binds the dashboard API on `addr`. Returns the bound address and the server future.
pub fn bind(
    state: SharedState,
    addr: SocketAddr,
) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)> {
    warp::serve(routes(state))
        .try_bind_ephemeral(addr)
        .with_context(|| format!("binding dashboard API on {}", addr))
}
