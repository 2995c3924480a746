//! Port allocation.
//!
//! Probes ascending ports by bind-then-release and returns the first free
//! one. The actual listener binds afterwards; a third party grabbing the
//! port in between is an accepted race, not a correctness bug of this
//! component. Callers get a sane ceiling via `MAX_PORT_PROBES`.

use std::net::{IpAddr, SocketAddr, TcpListener};

use crate::error::StartupError;

/// Maximum number of ports probed above the configured base.
pub const MAX_PORT_PROBES: u16 = 10;

/// Return the smallest port >= `start` that accepts a bind on `interface`.
pub fn allocate(interface: IpAddr, start: u16) -> Result<u16, StartupError> {
    for offset in 0..MAX_PORT_PROBES {
        let port = start.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);
        match TcpListener::bind(addr) {
            // Bind-then-immediate-release: the listener drops here
            Ok(_) => {
                if offset > 0 {
                    crate::log!("serve"; "port {} in use, using {} instead", start, port);
                }
                return Ok(port);
            }
            Err(_) => continue,
        }
    }

    Err(StartupError::NoFreePort {
        start,
        end: start.saturating_add(MAX_PORT_PROBES),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));

    /// Find a free port by binding to 0 and dropping the listener.
    fn free_port() -> u16 {
        TcpListener::bind((LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[test]
    fn test_returns_start_when_free() {
        let port = free_port();
        assert_eq!(allocate(LOCALHOST, port).unwrap(), port);
    }

    #[test]
    fn test_skips_bound_port() {
        let blocker = TcpListener::bind((LOCALHOST, 0)).unwrap();
        let taken = blocker.local_addr().unwrap().port();

        let allocated = allocate(LOCALHOST, taken).unwrap();
        assert!(allocated > taken);
        assert!(allocated <= taken + MAX_PORT_PROBES);
    }

    #[test]
    fn test_deterministic_when_nothing_listens() {
        let port = free_port();
        assert_eq!(
            allocate(LOCALHOST, port).unwrap(),
            allocate(LOCALHOST, port).unwrap()
        );
    }
}
