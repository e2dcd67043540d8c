//! Core type definitions: commit sequence numbers and transaction identities.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Commit sequence number.
///
/// CSNs provide a total order over committed write transactions. Higher
/// values indicate later commits. The low range is reserved for sentinels
/// and the counter never issues a value at or below [`Csn::MAX_RESERVED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Csn(pub u64);

impl Csn {
    /// The TID was not found: the transaction never committed (or is still running).
    pub const UNKNOWN: Csn = Csn(0);

    /// Data that predates transaction tracking. Always visible.
    pub const PREHISTORIC: Csn = Csn(1);

    /// Highest reserved value. The first issued CSN is `MAX_RESERVED + 1`.
    pub const MAX_RESERVED: Csn = Csn(2);

    /// Marker stored on a rolled-back transaction. Never issued.
    pub const ROLLED_BACK: Csn = Csn(u64::MAX);

    /// Creates a CSN from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for values the counter may issue.
    #[must_use]
    pub const fn is_issued(self) -> bool {
        self.0 > Self::MAX_RESERVED.0 && self.0 != Self::ROLLED_BACK.0
    }
}

impl fmt::Display for Csn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UNKNOWN => f.write_str("csn:unknown"),
            Self::PREHISTORIC => f.write_str("csn:prehistoric"),
            Self::ROLLED_BACK => f.write_str("csn:rolled-back"),
            Csn(value) => write!(f, "csn:{value}"),
        }
    }
}

/// A CSN used as a read-visibility boundary.
///
/// A transaction that began at snapshot `S` sees exactly the commits with
/// CSN `<= S` and none above it.
pub type Snapshot = Csn;

/// Per-process monotonic transaction counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LocalTid(pub u64);

impl LocalTid {
    /// Local id of the prehistoric TID.
    pub const PREHISTORIC: LocalTid = LocalTid(1);

    /// Highest reserved value. The first issued local id is `MAX_RESERVED + 1`.
    pub const MAX_RESERVED: LocalTid = LocalTid(2);

    /// Creates a local TID from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Hash of a [`Tid`], used as the lookup key in every registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TidHash(pub u64);

impl TidHash {
    /// Returns the raw hash value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TidHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Transaction identifier.
///
/// A TID is the snapshot the transaction started at, a process-local
/// counter and the id of the process instance that owns it. Two TIDs are
/// equal iff all three fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Tid {
    /// Snapshot the transaction began at.
    pub start_csn: Csn,
    /// Process-local counter value.
    pub local_tid: LocalTid,
    /// Id of the owning process instance.
    pub host_id: Uuid,
}

impl Tid {
    /// The uninitialized TID. Never a valid lookup key.
    pub const EMPTY: Tid = Tid {
        start_csn: Csn::UNKNOWN,
        local_tid: LocalTid(0),
        host_id: Uuid::nil(),
    };

    /// The TID of data that predates transaction tracking.
    pub const PREHISTORIC: Tid = Tid {
        start_csn: Csn::PREHISTORIC,
        local_tid: LocalTid::PREHISTORIC,
        host_id: Uuid::nil(),
    };

    /// Creates a new TID.
    #[must_use]
    pub const fn new(start_csn: Csn, local_tid: LocalTid, host_id: Uuid) -> Self {
        Self {
            start_csn,
            local_tid,
            host_id,
        }
    }

    /// Returns true for [`Tid::EMPTY`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Returns true for [`Tid::PREHISTORIC`].
    #[must_use]
    pub fn is_prehistoric(&self) -> bool {
        *self == Self::PREHISTORIC
    }

    /// Reduces the TID to its lookup hash.
    ///
    /// The first 8 bytes of SHA-256 over the little-endian fields, so the
    /// value is stable across processes and builds.
    #[must_use]
    pub fn tid_hash(&self) -> TidHash {
        let mut hasher = Sha256::new();
        hasher.update(self.start_csn.as_u64().to_le_bytes());
        hasher.update(self.local_tid.as_u64().to_le_bytes());
        hasher.update(self.host_id.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        TidHash(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.start_csn.as_u64(),
            self.local_tid.as_u64(),
            self.host_id
        )
    }
}
