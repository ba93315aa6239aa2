use pretty_assertions::assert_eq;
use std::net::{IpAddr, Ipv4Addr};

fn per_peer(peer: &str) -> PerPeerHeader {
    let peer_address: IpAddr = peer.parse().unwrap();
    PerPeerHeaderBuilder::default()
        .peer_flags(address_family_flags(&peer_address))
        .peer_address(peer_address)
        .peer_as(397143u32)
        .peer_bgp_id(Ipv4Addr::new(1, 1, 1, 1))
        .timestamp(PeerTimestamp {
            seconds: 1598790597,
            fraction: 83,
        })
        .build()
        .unwrap()
}

#[test]
fn test_frame_length_matches_header() {
    for len in [0usize, 1, 19, 164, 4096, 70000] {
        let payload = vec![0xab; len];
        let frame = BmpFrame::route_monitoring(&per_peer("192.0.2.1"), &payload).unwrap();

        assert_eq!(frame.len(), HEADERS_LENGTH + len);
        let common = frame.common_header().unwrap();
        assert_eq!(common.message_length as usize, frame.len());
        assert_eq!(common.message_type, MessageType::RouteMonitoring);
        assert_eq!(frame.payload(), &payload[..]);
    }
}

#[test]
fn test_assemble_overrides_common_header_length() {
    let common = CommonHeader {
        version: VERSION,
        message_length: 0,
        message_type: MessageType::RouteMonitoring,
    };
    let header = per_peer("192.0.2.1");
    let frame = assemble_frame(common, &header, &[1, 2, 3]).unwrap();

    assert_eq!(&frame.as_bytes()[..6], &[3, 0, 0, 0, 51, 0]);
    assert_eq!(&frame.as_bytes()[6..48], &header.to_bytes()[..]);
    assert_eq!(&frame.as_bytes()[48..], &[1, 2, 3]);
}

#[test]
fn test_frame_is_deterministic() {
    let header = per_peer("2001:db8::1");
    let payload = [0xffu8; 23];
    let first = BmpFrame::route_monitoring(&header, &payload).unwrap();
    let second = BmpFrame::route_monitoring(&header, &payload).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_frame_per_peer_header_round_trip() {
    let header = per_peer("2001:504:1::a539:7143:1");
    let frame = BmpFrame::route_monitoring(&header, &[0xff; 19]).unwrap();
    assert_eq!(frame.per_peer_header().unwrap(), header);
}

#[test]
fn test_frame_debug_is_hex() {
    let frame = BmpFrame::route_monitoring(&per_peer("192.0.2.1"), &[]).unwrap();
    let debug = format!("{:?}", frame);
    assert!(debug.starts_with("BmpFrame(48 bytes: 030000003000"));
}
