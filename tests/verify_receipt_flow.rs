//! End-to-end verification flows against a local verifyReceipt stub.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use fractic_receipt_verifier::{
    config::ReceiptVerifierConfig,
    domain::entities::verification_verdict::{VERDICT_CODE_FAILURE, VERDICT_CODE_SUCCESS},
    util::ReceiptVerifierUtil,
    FileRedemptionLedgerDatasource, InMemoryRedemptionLedgerDatasource,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

const BUNDLE_ID: &str = "com.example.app";
const RECEIPT: &str = "TUlJVGVzdFJlY2VpcHQ=";

/// Serves the given JSON bodies in order, one per connection.
async fn spawn_stub(bodies: Vec<String>) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let served = Arc::new(AtomicUsize::new(0));
    let counter = served.clone();
    tokio::spawn(async move {
        for body in bodies {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut socket).await;
            assert!(request.contains("\"exclude-old-transactions\":true"));
            counter.fetch_add(1, Ordering::SeqCst);
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    (addr, served)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).into_owned();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn config_for(addr: SocketAddr) -> ReceiptVerifierConfig {
    let url = format!("http://{addr}/verifyReceipt");
    let mut config = ReceiptVerifierConfig::new("secret", BUNDLE_ID);
    config.verify_url = url;
    config
}

fn valid_body(transaction_id: &str) -> String {
    serde_json::json!({
        "status": 0,
        "environment": "Sandbox",
        "receipt": {
            "bundle_id": BUNDLE_ID,
            "in_app": [{
                "transaction_id": transaction_id,
                "expires_date": "2099-01-01 00:00:00 Etc/GMT",
                "expires_date_ms": "4070908800000"
            }]
        }
    })
    .to_string()
}

fn status_body(status: i64) -> String {
    serde_json::json!({ "status": status }).to_string()
}

#[tokio::test]
async fn test_status_21007_then_success_redeems() {
    let (addr, served) = spawn_stub(vec![status_body(21007), valid_body("2000")]).await;
    let util = ReceiptVerifierUtil::new(&config_for(addr), InMemoryRedemptionLedgerDatasource::new())
        .expect("util");

    let verdict = util.verify_receipt("user-1", RECEIPT).await;
    assert_eq!(verdict.code, VERDICT_CODE_SUCCESS);
    assert_eq!(served.load(Ordering::SeqCst), 2);

    // The retry path goes through the ledger like the primary path.
    let entry = util
        .get_redemption("user-1")
        .await
        .expect("ledger")
        .expect("entry");
    assert_eq!(entry.last_transaction_id, "2000");
}

#[tokio::test]
async fn test_status_21007_twice_fails_after_one_retry() {
    let (addr, served) = spawn_stub(vec![
        status_body(21007),
        status_body(21007),
        valid_body("2000"),
    ])
    .await;
    let util = ReceiptVerifierUtil::new(&config_for(addr), InMemoryRedemptionLedgerDatasource::new())
        .expect("util");

    let verdict = util.verify_receipt("user-1", RECEIPT).await;
    assert_eq!(verdict.code, VERDICT_CODE_FAILURE);
    assert_eq!(served.load(Ordering::SeqCst), 2);
    assert!(util.get_redemption("user-1").await.expect("ledger").is_none());
}

#[tokio::test]
async fn test_duplicate_redemption_with_file_ledger() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (addr, _) = spawn_stub(vec![valid_body("3000"), valid_body("3000")]).await;
    let ledger = FileRedemptionLedgerDatasource::open(dir.path()).expect("ledger");
    let util = ReceiptVerifierUtil::new(&config_for(addr), ledger).expect("util");

    let first = util.verify_receipt_json("user-1", RECEIPT).await;
    assert_eq!(first, r#"{"code":200,"message":""}"#);

    let second = util.verify_receipt("user-1", RECEIPT).await;
    assert_eq!(second.code, VERDICT_CODE_FAILURE);
    assert!(second.message.contains("already redeemed"));
}

#[tokio::test]
async fn test_rejected_status_does_not_retry() {
    let (addr, served) = spawn_stub(vec![status_body(21002), valid_body("4000")]).await;
    let util = ReceiptVerifierUtil::new(&config_for(addr), InMemoryRedemptionLedgerDatasource::new())
        .expect("util");

    let verdict = util.verify_receipt("user-1", RECEIPT).await;
    assert_eq!(verdict.code, VERDICT_CODE_FAILURE);
    assert_eq!(served.load(Ordering::SeqCst), 1);
    assert!(util.get_redemption("user-1").await.expect("ledger").is_none());
}
