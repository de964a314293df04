//! Protocol and node codec identifiers.
//!
//! These mirror a slice of the multicodec table: enough of it to describe the
//! node codecs this crate decodes and the transport protocols an exchange can
//! register under. Values are taken from the public multicodec registry so
//! that indexer responses decode without a private numbering scheme.

/// Multicodec code for raw binary blocks (no internal structure, no links).
pub const RAW: u64 = 0x55;
/// Multicodec code for DAG-CBOR encoded nodes.
pub const DAG_CBOR: u64 = 0x71;
/// Multicodec code for DAG-JSON encoded nodes.
pub const DAG_JSON: u64 = 0x0129;

/// Transport protocol code for plain HTTP block-fetch.
pub const TRANSPORT_HTTP: u64 = 0x0920;
/// Transport protocol code for libp2p bitswap-style block-fetch.
pub const TRANSPORT_BITSWAP: u64 = 0x0900;
/// Transport protocol code for Filecoin graphsync/paid retrieval.
pub const TRANSPORT_GRAPHSYNC_FILECOINV1: u64 = 0x0910;

/// Reserved code used internally to mark a [`crate::routing::RoutingRecord::Error`].
///
/// Not a real multicodec entry; records tagged with it never leave the
/// routing layer (see [`crate::routing::RoutingRecord`]).
pub const ROUTING_ERROR: u64 = u64::MAX;
