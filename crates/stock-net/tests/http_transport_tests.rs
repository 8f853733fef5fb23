//! Tests for the reqwest-backed transport.

use std::net::TcpListener;
use std::sync::mpsc;
use std::time::Duration;

use stock_core::CancellationToken;
use stock_net::{HttpTransport, NetworkError, Session, SessionConfig, Transport};

#[test]
fn test_connection_refused() {
    // Reserve a port, then free it so nothing is listening
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let transport = HttpTransport::builder()
        .connect_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let mut body = Vec::new();
    let result = transport.fetch(
        &format!("http://127.0.0.1:{port}/"),
        &mut body,
        &CancellationToken::new(),
    );

    assert!(matches!(
        result,
        Err(NetworkError::Connection(_) | NetworkError::Request(_))
    ));
}

#[test]
fn test_session_reports_connection_failure() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = SessionConfig::builder()
        .worker_count(1)
        .connect_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let session = Session::new(config).unwrap();
    let (tx, rx) = mpsc::channel();

    session.submit(format!("http://127.0.0.1:{port}/"), move |r| {
        tx.send(r).unwrap();
    });

    let response = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(response.is_failure());
    assert_eq!(response.status, None);
}

#[test]
fn test_session_rejects_unparseable_url() {
    let config = SessionConfig::builder().worker_count(1).build().unwrap();
    let session = Session::new(config).unwrap();
    let (tx, rx) = mpsc::channel();

    session.submit("definitely not a url", move |r| tx.send(r).unwrap());

    let response = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(response.is_failure());
}

// Note: We use wiremock for mocked HTTP tests. The mock server needs a Tokio
// runtime, but sessions must be dropped outside of one, so these tests are
// synchronous and drive the server from a runtime they own.
#[cfg(feature = "integration-tests")]
mod integration_tests {
    use super::*;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runtime() -> Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn session() -> Session {
        let config = SessionConfig::builder()
            .worker_count(2)
            .abort_poll_interval(Duration::from_millis(10))
            .build()
            .unwrap();
        Session::new(config).unwrap()
    }

    #[test]
    fn test_fetch_success() {
        let rt = runtime();
        let mock_server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/tile"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tile-bytes".to_vec()))
                .mount(&server)
                .await;
            server
        });

        let session = session();
        let (tx, rx) = mpsc::channel();
        session.submit(format!("{}/tile", mock_server.uri()), move |r| {
            tx.send(r).unwrap();
        });

        let response = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(response.successful);
        assert!(!response.canceled);
        assert_eq!(response.status, Some(200));
        assert_eq!(response.data, b"tile-bytes");
    }

    #[test]
    fn test_fetch_not_found() {
        let rt = runtime();
        let mock_server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/missing"))
                .respond_with(ResponseTemplate::new(404).set_body_string("no such tile"))
                .mount(&server)
                .await;
            server
        });

        let session = session();
        let (tx, rx) = mpsc::channel();
        session.submit(format!("{}/missing", mock_server.uri()), move |r| {
            tx.send(r).unwrap();
        });

        let response = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(!response.successful);
        assert!(!response.canceled);
        assert_eq!(response.status, Some(404));
        assert_eq!(response.text(), "no such tile");
    }

    #[test]
    fn test_cancel_in_flight() {
        let rt = runtime();
        let mock_server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/slow"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string("late")
                        .set_delay(Duration::from_secs(30)),
                )
                .mount(&server)
                .await;
            server
        });

        let session = session();
        let (tx, rx) = mpsc::channel();
        let handle = session.submit(format!("{}/slow", mock_server.uri()), move |r| {
            tx.send(r).unwrap();
        });

        // Wait until a worker has claimed it
        while session.active_count() == 0 {
            std::thread::sleep(Duration::from_millis(5));
        }
        session.cancel(handle);

        let response = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(response.canceled);
        assert!(!response.successful);
    }

    #[test]
    fn test_drop_cancels_in_flight() {
        let rt = runtime();
        let mock_server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
                .mount(&server)
                .await;
            server
        });

        let session = session();
        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            session.submit(format!("{}/{i}", mock_server.uri()), move |r| {
                tx.send(r).unwrap();
            });
        }
        drop(tx);
        while session.active_count() < 2 {
            std::thread::sleep(Duration::from_millis(5));
        }

        drop(session);

        let responses: Vec<_> = rx.try_iter().collect();
        assert_eq!(responses.len(), 4);
        assert!(responses.iter().all(|r| r.canceled));
    }
}
