//! RIS Live message decoding.
//!
//! Schema: <https://ris-live.ripe.net/schemas/v1/ris_message.schema.json>

use serde_derive::Deserialize;
use serde_json::value::RawValue;
use std::fmt;

use crate::error::BridgeError;

pub const RIS_MESSAGE: &str = "ris_message";
pub const UPDATE: &str = "UPDATE";

#[derive(Deserialize, Debug)]
struct RisEnvelope {
    #[serde(rename = "type", default)]
    kind: String,
    data: Option<Box<RawValue>>,
}

#[derive(Deserialize, Debug)]
struct RisData {
    #[serde(rename = "type", default)]
    kind: String,
    timestamp: Option<Box<RawValue>>,
    #[serde(default)]
    peer: String,
    #[serde(default)]
    peer_asn: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    raw: String,
    #[serde(default)]
    host: String,
}

/// A BGP UPDATE seen by a RIS collector. Fields are kept as received; the
/// header builders decide how to interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingEvent {
    /// Timestamp literal as found in the feed, e.g. `1598790597.83`.
    pub timestamp: String,
    pub peer: String,
    pub peer_asn: String,
    pub raw: String,
    pub host: String,
    pub id: String,
}

impl fmt::Display for RoutingEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} peer {} ASN {}",
            self.host, self.id, self.peer, self.peer_asn
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Update(RoutingEvent),
    /// Anything that is not a route update, tagged with its message type.
    Skip(String),
}

/// Decode one line of the stream.
pub fn decode_record(line: &[u8]) -> Result<Record, BridgeError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(Record::Skip(String::new()));
    }

    let envelope: RisEnvelope = serde_json::from_slice(line)?;
    if envelope.kind != RIS_MESSAGE {
        return Ok(Record::Skip(envelope.kind));
    }

    let data: RisData = match envelope.data {
        Some(d) => serde_json::from_str(d.get())?,
        None => return Ok(Record::Skip(envelope.kind)),
    };
    if data.kind != UPDATE {
        return Ok(Record::Skip(data.kind));
    }

    let timestamp = match data.timestamp {
        Some(t) => timestamp_literal(&t)?,
        None => String::new(),
    };

    Ok(Record::Update(RoutingEvent {
        timestamp,
        peer: data.peer,
        peer_asn: data.peer_asn,
        raw: data.raw,
        host: data.host,
        id: data.id,
    }))
}

// Numbers keep their literal digits; quoted timestamps are unquoted.
fn timestamp_literal(raw: &RawValue) -> Result<String, BridgeError> {
    let text = raw.get().trim();
    if text.starts_with('"') {
        Ok(serde_json::from_str::<String>(text)?)
    } else {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPDATE_LINE: &str = r#"{"type":"ris_message","data":{"timestamp":1598790597.83,"peer":"2001:504:1::a539:7143:1","peer_asn":"397143","id":"11-2001-504-1-a539-7143-1-141235381","host":"rrc11","type":"UPDATE","path":[397143,6939,18881,18881],"origin":"igp","raw":"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF001304"}}"#;

    #[test]
    fn test_decode_update() {
        let record = decode_record(UPDATE_LINE.as_bytes()).unwrap();
        let expected = RoutingEvent {
            timestamp: "1598790597.83".into(),
            peer: "2001:504:1::a539:7143:1".into(),
            peer_asn: "397143".into(),
            raw: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF001304".into(),
            host: "rrc11".into(),
            id: "11-2001-504-1-a539-7143-1-141235381".into(),
        };
        assert_eq!(record, Record::Update(expected));
    }

    #[test]
    fn test_decode_keeps_timestamp_digits() {
        let line = br#"{"type":"ris_message","data":{"type":"UPDATE","timestamp":1598790597.10,"peer":"192.0.2.1","peer_asn":"1","raw":""}}"#;
        match decode_record(line).unwrap() {
            Record::Update(e) => assert_eq!(e.timestamp, "1598790597.10"),
            r => panic!("unexpected record {:?}", r),
        }
    }

    #[test]
    fn test_decode_quoted_timestamp() {
        let line = br#"{"type":"ris_message","data":{"type":"UPDATE","timestamp":"1598790597.83","peer":"192.0.2.1"}}"#;
        match decode_record(line).unwrap() {
            Record::Update(e) => {
                assert_eq!(e.timestamp, "1598790597.83");
                assert_eq!(e.peer_asn, "");
            }
            r => panic!("unexpected record {:?}", r),
        }
    }

    #[test]
    fn test_decode_trailing_newline() {
        let line = format!("{}\n", UPDATE_LINE);
        assert!(matches!(
            decode_record(line.as_bytes()).unwrap(),
            Record::Update(_)
        ));
    }

    #[test]
    fn test_skip_non_update() {
        let keepalive = br#"{"type":"ris_message","data":{"type":"KEEPALIVE","timestamp":1.0,"peer":"192.0.2.1","peer_asn":"1","id":"x","host":"rrc00"}}"#;
        assert_eq!(
            decode_record(keepalive).unwrap(),
            Record::Skip("KEEPALIVE".into())
        );
    }

    #[test]
    fn test_skip_other_message_types() {
        let ok = br#"{"type":"ris_subscribe_ok","data":{"subscription":{"host":"rrc21"},"socketOptions":{}}}"#;
        assert_eq!(
            decode_record(ok).unwrap(),
            Record::Skip("ris_subscribe_ok".into())
        );

        let rrc_list = br#"{"type":"ris_rrc_list","data":["rrc00","rrc01"]}"#;
        assert_eq!(
            decode_record(rrc_list).unwrap(),
            Record::Skip("ris_rrc_list".into())
        );

        let pong = br#"{"type":"pong","data":null}"#;
        assert_eq!(decode_record(pong).unwrap(), Record::Skip("pong".into()));
    }

    #[test]
    fn test_skip_missing_data() {
        let line = br#"{"type":"ris_message"}"#;
        assert_eq!(
            decode_record(line).unwrap(),
            Record::Skip(RIS_MESSAGE.into())
        );
    }

    #[test]
    fn test_skip_blank_line() {
        assert_eq!(decode_record(b"\n").unwrap(), Record::Skip(String::new()));
        assert_eq!(decode_record(b"").unwrap(), Record::Skip(String::new()));
    }

    #[test]
    fn test_decode_malformed_json() {
        assert!(matches!(
            decode_record(b"{\"type\":\"ris_message\",\"data\":"),
            Err(BridgeError::Decode(_))
        ));
        assert!(matches!(
            decode_record(b"not json\n"),
            Err(BridgeError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_wrong_field_type() {
        let line = br#"{"type":"ris_message","data":{"type":"UPDATE","peer":42}}"#;
        assert!(matches!(decode_record(line), Err(BridgeError::Decode(_))));
    }

    #[test]
    fn test_routing_event_display() {
        let event = RoutingEvent {
            peer: "192.0.2.1".into(),
            peer_asn: "65001".into(),
            host: "rrc00".into(),
            id: "abc".into(),
            ..Default::default()
        };
        assert_eq!(format!("{}", event), "rrc00 abc peer 192.0.2.1 ASN 65001");
    }
}
