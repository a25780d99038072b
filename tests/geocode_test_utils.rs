use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

static INIT_LOGGER: Once = Once::new();

pub fn initialize_logger_once() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub mod shared {
    use super::*;

    /// A local HTTP server answering every request with one canned geocoder response.
    pub struct StubGeocoder {
        addr: SocketAddr,
        requests: Arc<Mutex<Vec<String>>>,
        handle: JoinHandle<()>,
    }

    impl StubGeocoder {
        #[allow(dead_code)]
        pub async fn start(status: u16, body: &str) -> Self {
            Self::start_with_delay(status, body, Duration::ZERO).await
        }

        /// Waits `delay` after reading a request before answering it.
        #[allow(dead_code)]
        pub async fn start_with_delay(status: u16, body: &str, delay: Duration) -> Self {
            initialize_logger_once();
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind stub geocoder");
            let addr = listener.local_addr().expect("Stub geocoder has no address");
            let requests = Arc::new(Mutex::new(Vec::new()));

            let recorded = Arc::clone(&requests);
            let body = body.to_string();
            let handle = tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let recorded = Arc::clone(&recorded);
                    let body = body.clone();
                    tokio::spawn(async move {
                        let _ = serve(stream, status, &body, delay, recorded).await;
                    });
                }
            });

            StubGeocoder {
                addr,
                requests,
                handle,
            }
        }

        #[allow(dead_code)]
        pub fn base_url(&self) -> String {
            format!("http://{}/maps/geo", self.addr)
        }

        /// Request targets (path and query) received so far.
        #[allow(dead_code)]
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().expect("requests lock poisoned").clone()
        }
    }

    impl Drop for StubGeocoder {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    async fn serve(
        mut stream: TcpStream,
        status: u16,
        body: &str,
        delay: Duration,
        requests: Arc<Mutex<Vec<String>>>,
    ) -> std::io::Result<()> {
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        if let Some(target) = request_line.split_whitespace().nth(1) {
            requests
                .lock()
                .expect("requests lock poisoned")
                .push(target.to_string());
        }
        loop {
            let mut header = String::new();
            let n = reader.read_line(&mut header).await?;
            if n == 0 || header == "\r\n" || header == "\n" {
                break;
            }
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reason = if status == 200 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        write_half.write_all(response.as_bytes()).await?;
        write_half.shutdown().await
    }

    /// A base URL nobody listens on.
    #[allow(dead_code)]
    pub async fn unreachable_base_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind throwaway listener");
        let addr = listener.local_addr().expect("Probe listener has no address");
        drop(listener);
        format!("http://{}/maps/geo", addr)
    }
}
