use std::collections::HashSet;
use std::io::Cursor;
use std::net::{Ipv4Addr, Ipv6Addr};

use ris2bmp::bmp::{BmpFrame, BmpFrameCodec, MessageType, PEER_FLAG_V};
use ris2bmp::bridge::{Dispatcher, Forwarder};
use ris2bmp::error::BridgeError;
use ris2bmp::ris::LineSource;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;

const RAW: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF00A4020000008D900E00490002012020010504000100000000A53971430001FE8000000000000002163EFFFE56DD0300212804";

fn update_line(peer: &str, asn: &str, id: usize) -> String {
    format!(
        r#"{{"type":"ris_message","data":{{"timestamp":1598790597.83,"peer":"{}","peer_asn":"{}","id":"{}","host":"rrc11","type":"UPDATE","path":[397143,6939],"origin":"igp","raw":"{}"}}}}"#,
        peer, asn, id, RAW
    ) + "\n"
}

/// Accept one connection and collect every frame until the bridge closes it.
async fn collector() -> (String, JoinHandle<Vec<BmpFrame>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut frames = FramedRead::new(socket, BmpFrameCodec);
        let mut received = vec![];
        while let Some(Ok(frame)) = frames.next().await {
            received.push(frame);
        }
        received
    });
    (addr, handle)
}

async fn run_bridge(body: String, max_in_flight: usize) -> (BridgeError, u64, Vec<BmpFrame>) {
    let (addr, collected) = collector().await;
    let forwarder = Forwarder::connect(&addr, 8).await.unwrap();
    let mut source = LineSource::spawn(Cursor::new(body.into_bytes()), 8).unwrap();
    let mut dispatcher = Dispatcher::new(Ipv4Addr::new(1, 1, 1, 1), max_in_flight);

    let e = dispatcher.run(&mut source, forwarder).await;
    let frames = collected.await.unwrap();
    (e, dispatcher.stats().forwarded, frames)
}

#[tokio::test]
async fn every_update_forwarded_exactly_once() {
    let n = 200;
    let mut body = String::new();
    for i in 1..=n {
        body.push_str(&update_line("192.0.2.1", &i.to_string(), i));
        if i % 10 == 0 {
            body.push_str(r#"{"type":"ris_message","data":{"type":"KEEPALIVE","peer":"192.0.2.1"}}"#);
            body.push('\n');
        }
    }
    body.push_str("{\"type\":\"ris_subscribe_ok\",\"data\":{}}\n");

    let (e, forwarded, frames) = run_bridge(body, 16).await;

    // The stream ending is what stops the bridge.
    assert!(matches!(e, BridgeError::Stream(_)));
    assert_eq!(forwarded, n as u64);
    assert_eq!(frames.len(), n);

    let asns: HashSet<u32> = frames
        .iter()
        .map(|f| f.per_peer_header().unwrap().peer_as)
        .collect();
    let expected: HashSet<u32> = (1..=n as u32).collect();
    assert_eq!(asns, expected);

    for frame in &frames {
        assert_eq!(frame.len(), 48 + RAW.len() / 2);
        assert_eq!(frame.common_header().unwrap().message_length as usize, frame.len());
    }
}

#[tokio::test]
async fn ipv6_update_end_to_end() {
    let body = update_line("2001:504:1::a539:7143:1", "397143", 1);
    let (_, forwarded, frames) = run_bridge(body, 1).await;

    assert_eq!(forwarded, 1);
    assert_eq!(frames.len(), 1);

    let bytes = frames[0].as_bytes();
    let peer: Ipv6Addr = "2001:504:1::a539:7143:1".parse().unwrap();
    assert_eq!(bytes[0], 3);
    assert_eq!(bytes[5], MessageType::RouteMonitoring as u8);
    assert_ne!(bytes[7] & PEER_FLAG_V, 0);
    assert_eq!(&bytes[16..32], &peer.octets());
    assert_eq!(bytes.len(), 48 + RAW.len() / 2);
}

#[tokio::test]
async fn malformed_asn_still_forwarded() {
    let body = update_line("192.0.2.1", "abc", 1);
    let (_, forwarded, frames) = run_bridge(body, 1).await;

    assert_eq!(forwarded, 1);
    assert_eq!(frames[0].per_peer_header().unwrap().peer_as, 0);
}

#[tokio::test]
async fn malformed_record_stops_bridge() {
    let mut body = String::new();
    for i in 1..=5 {
        body.push_str(&update_line("192.0.2.1", "65001", i));
    }
    body.push_str("{\"type\":\"ris_message\",\"data\":\n");
    body.push_str(&update_line("192.0.2.1", "65001", 6));

    let (e, _, _) = run_bridge(body, 2).await;
    assert!(matches!(e, BridgeError::Decode(_)));
}

#[tokio::test]
async fn bad_peer_address_stops_bridge() {
    let mut body = update_line("192.0.2.1", "65001", 1);
    body.push_str(&update_line("not-an-address", "65001", 2));

    let (e, _, _) = run_bridge(body, 4).await;
    assert!(matches!(e, BridgeError::Address(a) if a == "not-an-address"));
}
