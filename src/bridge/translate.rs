use std::net::Ipv4Addr;

use crate::bmp::{
    address_family_flags, parse_peer_address, parse_peer_asn, BmpFrame, PeerTimestamp,
    PerPeerHeader, PerPeerHeaderBuilder, PeerType,
};
use crate::error::BridgeError;
use crate::ris::RoutingEvent;

/// Build the Per-Peer Header for `event`. Only an unusable peer address is an
/// error; a bad ASN or timestamp degrades to zero.
pub fn build_per_peer_header(
    event: &RoutingEvent,
    bgp_id: Ipv4Addr,
) -> Result<PerPeerHeader, BridgeError> {
    let peer_address = parse_peer_address(&event.peer)?;
    PerPeerHeaderBuilder::default()
        .peer_type(PeerType::GlobalInstance)
        .peer_flags(address_family_flags(&peer_address))
        .peer_distinguisher([0u8; 8])
        .peer_address(peer_address)
        .peer_as(parse_peer_asn(&event.peer_asn))
        .peer_bgp_id(bgp_id)
        .timestamp(PeerTimestamp::parse(&event.timestamp))
        .build()
        .map_err(BridgeError::Build)
}

/// Raw BGP UPDATE bytes. Undecodable hex yields an empty payload.
pub fn decode_payload(raw: &str) -> Vec<u8> {
    match hex::decode(raw) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("invalid raw data, failed to decode with error: {}", e);
            vec![]
        }
    }
}

/// Translate one routing event into a Route Monitoring frame.
pub fn translate(event: &RoutingEvent, bgp_id: Ipv4Addr) -> Result<BmpFrame, BridgeError> {
    let per_peer = build_per_peer_header(event, bgp_id)?;
    let payload = decode_payload(&event.raw);
    log::trace!("{} -> {}", event, per_peer);
    BmpFrame::route_monitoring(&per_peer, &payload)
}
