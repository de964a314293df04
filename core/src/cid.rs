//! Content identifiers.
//!
//! A [`Cid`] is an immutable, self-describing digest of a block's bytes under
//! some codec. We reuse the `cid` and `multihash` crates for the binary
//! encoding rather than hand-rolling varint arithmetic; this module only adds
//! the helpers the retrieval core needs on top of them (hashing bytes into a
//! CID, and the base58btc string form the indexer's URL path expects).

use multihash_codetable::{Code, MultihashDigest};

/// The CID type used throughout this crate. CIDv1, any codec, any multihash.
pub type Cid = cid::CidGeneric<64>;

/// Multihash algorithm code for sha2-256, the only digest this crate produces
/// when writing blocks. Providers may advertise content hashed with other
/// algorithms; verification always follows whatever code the CID itself
/// carries, not this constant.
pub const SHA2_256: u64 = 0x12;

/// Compute the CID for `bytes` under `codec`, using sha2-256.
pub fn of(codec: u64, bytes: &[u8]) -> Cid {
    let digest = Code::Sha2_256.digest(bytes);
    Cid::new_v1(codec, digest)
}

/// Verify that `bytes` hashes to the multihash carried by `cid`.
///
/// Only sha2-256 is supported for verification; a CID using another hash
/// algorithm is treated as unverifiable and rejected (a provider cannot be
/// trusted to assert its own block's integrity).
pub fn verify(cid: &Cid, bytes: &[u8]) -> bool {
    let mh = cid.hash();
    if mh.code() != SHA2_256 {
        return false;
    }
    let expected = Code::Sha2_256.digest(bytes);
    expected.digest() == mh.digest()
}

/// The base58btc string of a CID's multihash, as used in indexer URL paths.
pub fn multihash_base58(cid: &Cid) -> String {
    bs58::encode(cid.hash().to_bytes()).into_string()
}
