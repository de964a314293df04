//! Decoded block bodies.
//!
//! A [`Node`] is what a block's bytes mean once interpreted under their
//! codec. Two codecs are supported: `raw` (opaque bytes, no links) and
//! `dag-json` (a JSON value in which any object of the shape `{"/": "<cid>"}`
//! denotes a link to another block, the same convention IPLD's dag-json
//! codec uses). That is enough structure to exercise recursive selectors
//! without pulling in a full IPLD schema stack.

use crate::cid::Cid;
use crate::link::Link;
use crate::multicodec::{DAG_JSON, RAW};
use bytes::Bytes;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("unsupported node codec: {0:#x}")]
    UnsupportedCodec(u64),
    #[error("malformed dag-json node: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("link field is not a valid cid: {0}")]
    BadLink(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Raw(Bytes),
    Json(serde_json::Value),
}

impl Node {
    /// Decode `bytes` as a node under `codec`.
    pub fn decode(codec: u64, bytes: Bytes) -> Result<Self, NodeError> {
        match codec {
            RAW => Ok(Node::Raw(bytes)),
            DAG_JSON => {
                let value: serde_json::Value = serde_json::from_slice(&bytes)?;
                Ok(Node::Json(value))
            }
            other => Err(NodeError::UnsupportedCodec(other)),
        }
    }

    /// Encode this node back to bytes, returning the codec it was encoded
    /// under alongside them.
    pub fn encode(&self) -> (u64, Bytes) {
        match self {
            Node::Raw(bytes) => (RAW, bytes.clone()),
            Node::Json(value) => {
                let bytes = serde_json::to_vec(value).expect("json values always serialize");
                (DAG_JSON, Bytes::from(bytes))
            }
        }
    }

    /// Every link directly reachable from this node, in encounter order.
    pub fn links(&self) -> Result<Vec<Link>, NodeError> {
        match self {
            Node::Raw(_) => Ok(Vec::new()),
            Node::Json(value) => {
                let mut out = Vec::new();
                collect_links(value, &mut out)?;
                Ok(out)
            }
        }
    }
}

fn collect_links(value: &serde_json::Value, out: &mut Vec<Link>) -> Result<(), NodeError> {
    match value {
        serde_json::Value::Object(map) => {
            if map.len() == 1 {
                if let Some(serde_json::Value::String(s)) = map.get("/") {
                    let cid = Cid::from_str(s).map_err(|_| NodeError::BadLink(s.clone()))?;
                    out.push(Link::new(cid));
                    return Ok(());
                }
            }
            for v in map.values() {
                collect_links(v, out)?;
            }
            Ok(())
        }
        serde_json::Value::Array(items) => {
            for v in items {
                collect_links(v, out)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
