// The link cable boundary. A transport moves single bytes to and from the
// peer; the shuttle thread owns it and exchanges bytes with the emulation
// thread through two lock protected queues, so the core itself never
// blocks on the network.
use super::config::{LinkConfig, LinkKind};
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub trait Transport: Send {
    // Non-blocking single byte read; false when nothing has arrived yet.
    fn read(&mut self, byte: &mut u8) -> bool;

    fn write(&mut self, byte: u8) -> bool;
}

pub struct SocketTransport {
    stream: TcpStream,
}

impl SocketTransport {
    // The master side dials the peer.
    pub fn connect(addr: &str, port: u16) -> std::io::Result<Self> {
        let stream = TcpStream::connect((addr, port))?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    // The slave side waits for exactly one peer. The listener polls so that
    // a stop request is honored while nobody connects.
    pub fn accept(addr: &str, port: u16, stop: &AtomicBool) -> std::io::Result<Self> {
        let listener = TcpListener::bind((addr, port))?;
        listener.set_nonblocking(true)?;
        loop {
            if stop.load(Ordering::Acquire) {
                return Err(std::io::Error::new(std::io::ErrorKind::Interrupted, "stopped"));
            }
            match listener.accept() {
                Ok((stream, peer)) => {
                    rog::debugln!("Link peer connected from {}", peer);
                    stream.set_nonblocking(true)?;
                    stream.set_nodelay(true)?;
                    return Ok(Self { stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Transport for SocketTransport {
    fn read(&mut self, byte: &mut u8) -> bool {
        let mut buf = [0x00];
        match self.stream.read(&mut buf) {
            Ok(1) => {
                *byte = buf[0];
                true
            }
            _ => false,
        }
    }

    fn write(&mut self, byte: u8) -> bool {
        self.stream.write_all(&[byte]).is_ok()
    }
}

// The emulation facing half: two byte queues shared with the shuttle
// thread. Cloning hands the serial engine its own reference.
#[derive(Clone)]
pub struct LinkPort {
    tx: Arc<Mutex<VecDeque<u8>>>,
    rx: Arc<Mutex<VecDeque<u8>>>,
}

impl LinkPort {
    pub fn send(&self, v: u8) {
        self.tx.lock().unwrap().push_back(v);
    }

    pub fn recv(&self) -> Option<u8> {
        self.rx.lock().unwrap().pop_front()
    }
}

pub struct Link {
    port: LinkPort,
    stop: Arc<AtomicBool>,
    shuttle: Option<thread::JoinHandle<()>>,
}

impl Link {
    pub fn power_up(mut transport: Box<dyn Transport>, stop: Arc<AtomicBool>) -> Self {
        let port = LinkPort { tx: Arc::new(Mutex::new(VecDeque::new())), rx: Arc::new(Mutex::new(VecDeque::new())) };
        let shuttle_port = port.clone();
        let shuttle_stop = stop.clone();
        let shuttle = thread::spawn(move || {
            while !shuttle_stop.load(Ordering::Acquire) {
                let outgoing = shuttle_port.tx.lock().unwrap().pop_front();
                if let Some(v) = outgoing {
                    if !transport.write(v) {
                        rog::debugln!("Link peer went away on write");
                        break;
                    }
                }
                let mut v = 0xff;
                if transport.read(&mut v) {
                    shuttle_port.rx.lock().unwrap().push_back(v);
                }
                thread::sleep(Duration::from_millis(1));
            }
        });
        Self { port, stop, shuttle: Some(shuttle) }
    }

    pub fn port(&self) -> LinkPort {
        self.port.clone()
    }

    pub fn power_down(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(shuttle) = self.shuttle.take() {
            let _ = shuttle.join();
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.power_down();
    }
}

// Builds the configured link, if any. The stop flag is shared with the
// console so one cancellation request reaches every thread.
pub fn from_config(cfg: &LinkConfig, stop: Arc<AtomicBool>) -> Option<Link> {
    if !cfg.enable {
        return None;
    }
    match cfg.kind {
        LinkKind::Socket => {
            let transport = if cfg.master {
                SocketTransport::connect(&cfg.addr, cfg.port)
            } else {
                SocketTransport::accept(&cfg.addr, cfg.port, &stop)
            };
            match transport {
                Ok(t) => Some(Link::power_up(Box::new(t), stop)),
                Err(e) => {
                    rog::println!("Link setup failed: {}", e);
                    None
                }
            }
        }
        LinkKind::Pipe => {
            rog::println!("Pipe link is not yet supported");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A transport that echoes everything written to it.
    struct Loopback {
        pending: VecDeque<u8>,
    }

    impl Transport for Loopback {
        fn read(&mut self, byte: &mut u8) -> bool {
            match self.pending.pop_front() {
                Some(v) => {
                    *byte = v;
                    true
                }
                None => false,
            }
        }

        fn write(&mut self, byte: u8) -> bool {
            self.pending.push_back(byte);
            true
        }
    }

    #[test]
    fn test_shuttle_round_trip() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut link = Link::power_up(Box::new(Loopback { pending: VecDeque::new() }), stop);
        let port = link.port();
        port.send(0x5a);
        let mut back = None;
        for _ in 0..100 {
            back = port.recv();
            if back.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(back, Some(0x5a));
        link.power_down();
    }

    #[test]
    fn test_socket_pair_exchanges_bytes() {
        let stop = Arc::new(AtomicBool::new(false));
        let accept_stop = stop.clone();
        let server = thread::spawn(move || SocketTransport::accept("127.0.0.1", 18765, &accept_stop).unwrap());
        // Give the listener a moment to bind.
        thread::sleep(Duration::from_millis(50));
        let mut client = SocketTransport::connect("127.0.0.1", 18765).unwrap();
        let mut server = server.join().unwrap();

        assert!(client.write(0x42));
        let mut v = 0x00;
        for _ in 0..100 {
            if server.read(&mut v) {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(v, 0x42);
    }
}
