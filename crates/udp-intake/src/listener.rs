// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! UDP socket ownership and the receive loop.
//!
//! The listener owns the socket exclusively: it is created, bound and dropped
//! here. Each wakeup drains at most one queue-capacity worth of datagrams via
//! non-blocking reads; a full intake queue blocks the loop, which is the
//! pipeline's backpressure (and, once the kernel buffer also fills, accepted
//! OS-level packet loss).

use std::io;
use std::net::{IpAddr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::IntakeConfig;

/// One received datagram, handed to exactly one worker.
pub(crate) struct Datagram {
    pub payload: Vec<u8>,
    pub sender: SocketAddr,
}

pub(crate) struct Listener {
    socket: UdpSocket,
    buffer_size: usize,
    drain_limit: usize,
    queue: flume::Sender<Datagram>,
    cancel: CancellationToken,
}

impl Listener {
    /// Creates and binds the socket, applying the requested SO_RCVBUF first.
    ///
    /// When the OS does not honor the exact receive buffer request, the
    /// effective size is kept and a warning is logged; on Linux the kernel
    /// reports back twice the requested value, so the warning fires there
    /// just as it did historically.
    pub(crate) fn bind(
        bind_ip: IpAddr,
        config: &IntakeConfig,
        queue: flume::Sender<Datagram>,
        cancel: CancellationToken,
    ) -> io::Result<Self> {
        let domain = if bind_ip.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

        if let Some(requested) = config.receive_buffer_bytes {
            socket.set_recv_buffer_size(requested)?;
        }

        let addr = SocketAddr::new(bind_ip, config.port);
        socket.bind(&addr.into())?;

        if let Some(requested) = config.receive_buffer_bytes {
            let effective = socket.recv_buffer_size()?;
            if effective != requested {
                warn!(
                    requested,
                    effective, "Unable to set receive_buffer_bytes to desired size"
                );
            }
        }

        socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(socket.into())?;

        Ok(Listener {
            socket,
            buffer_size: config.buffer_size,
            drain_limit: config.queue_size,
            queue,
            cancel,
        })
    }

    pub(crate) fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Forwards datagrams into the intake queue until cancelled or the socket
    /// fails. The socket closes by drop when this returns.
    pub(crate) async fn run(&self) -> io::Result<()> {
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("UDP listener stopping");
                    return Ok(());
                }
                ready = self.socket.readable() => {
                    ready?;
                    self.drain_cycle(&mut buf).await?;
                }
            }
        }
    }

    /// Reads up to `drain_limit` datagrams without blocking, stopping early
    /// on would-block or an empty payload. A disconnected queue means every
    /// worker is gone; reading on would only discard data, so that is fatal.
    async fn drain_cycle(&self, buf: &mut [u8]) -> io::Result<()> {
        for _ in 0..self.drain_limit {
            match self.socket.try_recv_from(buf) {
                Ok((0, _)) => break,
                Ok((len, sender)) => {
                    let datagram = Datagram {
                        payload: buf[..len].to_vec(),
                        sender,
                    };
                    // blocks while the queue is full; backpressure lands here
                    if self.queue.send_async(datagram).await.is_err() {
                        return Err(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "intake queue disconnected",
                        ));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
