//! # Socket de Escucha
//! src/server/socket.rs
//!
//! Crea el socket de escucha con `libc` para poder fijar el backlog y las
//! opciones antes del `listen`:
//!
//! - `SO_REUSEADDR`: reiniciar el servidor sin esperar `TIME_WAIT`
//! - `SO_KEEPALIVE`
//! - `TCP_NODELAY`
//!
//! El socket queda en modo no bloqueante, listo para registrarse en `mio`.

use libc::{
    bind, c_int, c_void, listen, sa_family_t, setsockopt, sockaddr, sockaddr_in, sockaddr_in6,
    sockaddr_storage, socket, socklen_t, AF_INET, AF_INET6, IPPROTO_TCP, SOCK_CLOEXEC,
    SOCK_NONBLOCK, SOCK_STREAM, SOL_SOCKET, SO_KEEPALIVE, SO_REUSEADDR, TCP_NODELAY,
};
use std::io;
use std::mem::{size_of, zeroed};
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

/// Resuelve `host:port` a la primera dirección disponible
pub fn resolve(address: &str) -> io::Result<SocketAddr> {
    address.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("could not resolve {}", address),
        )
    })
}

/// Crea un listener no bloqueante con el backlog indicado
pub fn create_listening_socket(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let (storage, len, domain) = to_sockaddr(&addr);

    let raw = unsafe { socket(domain, SOCK_STREAM | SOCK_NONBLOCK | SOCK_CLOEXEC, 0) };
    if raw < 0 {
        return Err(io::Error::last_os_error());
    }
    // Desde aquí el fd se cierra solo en cualquier error
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    set_option(&fd, SOL_SOCKET, SO_REUSEADDR)?;
    set_option(&fd, SOL_SOCKET, SO_KEEPALIVE)?;
    set_option(&fd, IPPROTO_TCP, TCP_NODELAY)?;

    let res = unsafe {
        bind(
            fd.as_raw_fd(),
            &storage as *const sockaddr_storage as *const sockaddr,
            len,
        )
    };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }

    if unsafe { listen(fd.as_raw_fd(), backlog) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(TcpListener::from(fd))
}

fn set_option(fd: &OwnedFd, level: c_int, name: c_int) -> io::Result<()> {
    let yes: c_int = 1;
    let res = unsafe {
        setsockopt(
            fd.as_raw_fd(),
            level,
            name,
            &yes as *const c_int as *const c_void,
            size_of::<c_int>() as socklen_t,
        )
    };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn to_sockaddr(addr: &SocketAddr) -> (sockaddr_storage, socklen_t, c_int) {
    let mut storage: sockaddr_storage = unsafe { zeroed() };
    match addr {
        SocketAddr::V4(v4) => {
            let mut sa: sockaddr_in = unsafe { zeroed() };
            sa.sin_family = AF_INET as sa_family_t;
            sa.sin_port = v4.port().to_be();
            // Los octetos ya están en orden de red
            sa.sin_addr.s_addr = u32::from_ne_bytes(v4.ip().octets());
            unsafe {
                std::ptr::write(&mut storage as *mut _ as *mut sockaddr_in, sa);
            }
            (storage, size_of::<sockaddr_in>() as socklen_t, AF_INET)
        }
        SocketAddr::V6(v6) => {
            let mut sa: sockaddr_in6 = unsafe { zeroed() };
            sa.sin6_family = AF_INET6 as sa_family_t;
            sa.sin6_port = v6.port().to_be();
            sa.sin6_flowinfo = v6.flowinfo();
            sa.sin6_scope_id = v6.scope_id();
            sa.sin6_addr.s6_addr = v6.ip().octets();
            unsafe {
                std::ptr::write(&mut storage as *mut _ as *mut sockaddr_in6, sa);
            }
            (storage, size_of::<sockaddr_in6>() as socklen_t, AF_INET6)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    fn get_option(listener: &TcpListener, level: c_int, name: c_int) -> c_int {
        let mut value: c_int = 0;
        let mut len = size_of::<c_int>() as socklen_t;
        let res = unsafe {
            libc::getsockopt(
                listener.as_raw_fd(),
                level,
                name,
                &mut value as *mut c_int as *mut c_void,
                &mut len,
            )
        };
        assert_eq!(res, 0);
        value
    }

    #[test]
    fn test_bind_ephemeral_port() {
        let addr = resolve("127.0.0.1:0").unwrap();
        let listener = create_listening_socket(addr, 16).unwrap();
        let local = listener.local_addr().unwrap();

        assert_eq!(local.ip().to_string(), "127.0.0.1");
        assert_ne!(local.port(), 0);
    }

    #[test]
    fn test_socket_options() {
        let listener = create_listening_socket(resolve("127.0.0.1:0").unwrap(), 16).unwrap();

        assert_ne!(get_option(&listener, SOL_SOCKET, SO_REUSEADDR), 0);
        assert_ne!(get_option(&listener, SOL_SOCKET, SO_KEEPALIVE), 0);
        assert_ne!(get_option(&listener, IPPROTO_TCP, TCP_NODELAY), 0);
    }

    #[test]
    fn test_accepts_connections() {
        let listener = create_listening_socket(resolve("127.0.0.1:0").unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"ping").unwrap();

        listener.set_nonblocking(false).unwrap();
        let (mut server_side, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4];
        server_side.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[test]
    fn test_port_in_use() {
        let first = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = first.local_addr().unwrap();
        assert!(create_listening_socket(addr, 16).is_err());
    }
}
