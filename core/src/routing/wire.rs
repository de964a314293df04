//! The indexer's wire format.
//!
//! `GET {indexer}/multihash/{base58-multihash}` returns a JSON body of
//! multihash-indexed provider results. Byte fields (`Multihash`, `ContextID`,
//! `Metadata`) are base64-encoded, matching how Go's `encoding/json` marshals
//! `[]byte`; `Provider.ID` is a libp2p peer ID string, `Provider.Addrs` are
//! multiaddr strings.

use super::error::RoutingError;
use super::record::{Provider, RoutingRecord};
use crate::cid::Cid;
use base64::Engine;
use libp2p::{Multiaddr, PeerId};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(rename = "MultihashResults", default)]
    multihash_results: Vec<MultihashResult>,
}

#[derive(Debug, Deserialize)]
struct MultihashResult {
    #[serde(rename = "Multihash")]
    multihash: String,
    #[serde(rename = "ProviderResults", default)]
    provider_results: Vec<ProviderResult>,
}

#[derive(Debug, Deserialize)]
struct ProviderResult {
    #[serde(rename = "Metadata")]
    metadata: String,
    #[serde(rename = "Provider")]
    provider: WireProvider,
}

#[derive(Debug, Deserialize)]
struct WireProvider {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Addrs", default)]
    addrs: Vec<String>,
}

/// Parse an indexer response body into one record per provider result whose
/// multihash matches `query`. Decoding failures for an individual result
/// become an `Error` record rather than aborting the whole batch.
pub fn decode_response(query: Cid, body: &[u8]) -> Result<Vec<RoutingRecord>, RoutingError> {
    let parsed: FindResponse = serde_json::from_slice(body)
        .map_err(|e| RoutingError::MalformedResponse(e.to_string()))?;

    let query_hash = query.hash().to_bytes();
    let mut records = Vec::new();

    for mh_result in parsed.multihash_results {
        let Ok(decoded_hash) = base64::engine::general_purpose::STANDARD.decode(&mh_result.multihash)
        else {
            records.push(error_record(query, "multihash is not valid base64"));
            continue;
        };
        if decoded_hash != query_hash {
            continue;
        }

        for pr in mh_result.provider_results {
            match decode_provider_result(query, pr) {
                Ok(record) => records.push(record),
                Err(msg) => records.push(error_record(query, &msg)),
            }
        }
    }

    Ok(records)
}

fn decode_provider_result(query: Cid, pr: ProviderResult) -> Result<RoutingRecord, String> {
    let metadata_bytes = base64::engine::general_purpose::STANDARD
        .decode(&pr.metadata)
        .map_err(|e| format!("metadata is not valid base64: {e}"))?;
    let (protocol, tail) = unsigned_varint::decode::u64(&metadata_bytes)
        .map_err(|e| format!("metadata does not start with a varint protocol code: {e}"))?;

    let peer_id = PeerId::from_str(&pr.provider.id)
        .map_err(|e| format!("provider id {:?} is not a valid peer id: {e}", pr.provider.id))?;
    let mut addrs = Vec::with_capacity(pr.provider.addrs.len());
    for addr in &pr.provider.addrs {
        addrs.push(
            Multiaddr::from_str(addr)
                .map_err(|e| format!("multiaddr {addr:?} is invalid: {e}"))?,
        );
    }

    Ok(RoutingRecord::Provider {
        request: query,
        protocol,
        provider: Provider { peer_id, addrs },
        metadata: bytes::Bytes::copy_from_slice(tail),
    })
}

fn error_record(request: Cid, msg: &str) -> RoutingRecord {
    RoutingRecord::Error {
        request,
        cause: Arc::new(RoutingError::MalformedMetadata(msg.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multicodec::{RAW, TRANSPORT_HTTP};

    fn sample_body(query: &Cid, protocol: u64, peer_id: &str) -> String {
        let mh = base64::engine::general_purpose::STANDARD.encode(query.hash().to_bytes());
        let mut metadata = Vec::new();
        let mut buf = unsigned_varint::encode::u64_buffer();
        metadata.extend_from_slice(unsigned_varint::encode::u64(protocol, &mut buf));
        let metadata = base64::engine::general_purpose::STANDARD.encode(metadata);
        format!(
            r#"{{"MultihashResults":[{{"Multihash":"{mh}","ProviderResults":[{{"Metadata":"{metadata}","Provider":{{"ID":"{peer_id}","Addrs":["/ip4/127.0.0.1/tcp/4001"]}}}}]}}]}}"#
        )
    }

    #[test]
    fn decodes_a_matching_provider_result() {
        let query = crate::cid::of(RAW, b"hello");
        let peer_id = PeerId::random().to_base58();
        let body = sample_body(&query, TRANSPORT_HTTP, &peer_id);
        let records = decode_response(query, body.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        match &records[0] {
            RoutingRecord::Provider { protocol, .. } => assert_eq!(*protocol, TRANSPORT_HTTP),
            other => panic!("expected provider record, got {other:?}"),
        }
    }

    #[test]
    fn skips_results_for_a_different_multihash() {
        let query = crate::cid::of(RAW, b"hello");
        let other = crate::cid::of(RAW, b"other");
        let peer_id = PeerId::random().to_base58();
        let body = sample_body(&other, TRANSPORT_HTTP, &peer_id);
        let records = decode_response(query, body.as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn bad_peer_id_becomes_an_error_record_not_an_abort() {
        let query = crate::cid::of(RAW, b"hello");
        let body = sample_body(&query, TRANSPORT_HTTP, "not-a-peer-id");
        let records = decode_response(query, body.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], RoutingRecord::Error { .. }));
    }
}
