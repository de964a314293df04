//! Links: the traversal layer's handle on a CID.
//!
//! A [`Link`] is a thin wrapper so the planning and exchange layers talk about
//! "the thing a selector resolves to" without depending on `cid::Cid`'s full
//! API surface. Every concrete implementation carries a [`Cid`] directly.

use crate::cid::Cid;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link(pub Cid);

impl Link {
    pub fn new(cid: Cid) -> Self {
        Link(cid)
    }

    pub fn cid(&self) -> &Cid {
        &self.0
    }
}

impl From<Cid> for Link {
    fn from(cid: Cid) -> Self {
        Link(cid)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
