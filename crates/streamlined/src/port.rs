//! Ephemeral port allocation.

use std::io;
use std::net::{Ipv4Addr, TcpListener};

/// Asks the OS for a currently unused TCP port.
///
/// The probe socket is closed before returning, so another process can in
/// principle grab the port before the server binds it. Used only when the
/// configuration does not name a port.
pub fn allocate_ephemeral_port() -> io::Result<u16> {
    let probe = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    Ok(probe.local_addr()?.port())
}
