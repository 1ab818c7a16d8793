//! TCP reachability tests

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Whether a TCP connection to `host:port` succeeds within `deadline`
///
/// A port that is not monitored (`None`) is reported open so that a missing
/// signal never marks a node unhealthy on its own.
pub async fn is_port_open(host: &str, port: Option<u16>, deadline: Duration) -> bool {
    let Some(port) = port else {
        return true;
    };

    debug!("Testing port {}:{}", host, port);

    match timeout(deadline, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            debug!("Port {}:{} closed: {}", host, port, e);
            false
        }
        Err(_) => {
            debug!("Port {}:{} timed out after {:?}", host, port, deadline);
            false
        }
    }
}
