use core::hash::Hash;
use std::fmt;
use std::hash::Hasher;

#[cfg(feature = "std-hash")]
pub mod default {
    pub use std::collections::hash_map::DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::new()
    }
}

#[cfg(not(feature = "std-hash"))]
pub mod default {
    pub use ahash::AHasher as DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::default()
    }
}

/// convenience: hash a single value with whichever default is active
#[inline]
pub fn hash_one<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut h = default::new();
    v.hash(&mut h);
    h.finish()
}

/// Key derived from a source location, used to identify memoization sites.
pub fn location_key(file: &str, line: u32, column: u32) -> u64 {
    hash_one(&(file, line, column))
}

/// Expands to a memoization site key for the current source location.
///
/// An optional discriminator distinguishes repeated calls from one site,
/// e.g. `memo_key!(row)` inside a loop.
#[macro_export]
macro_rules! memo_key {
    () => {
        $crate::hash::location_key(file!(), line!(), column!())
    };
    ($discriminator:expr) => {
        $crate::hash::hash_one(&(
            $crate::hash::location_key(file!(), line!(), column!()),
            &$discriminator,
        ))
    };
}

/// Content hash identifying visually equivalent node output.
///
/// Stable for the lifetime of the process; fingerprints are never persisted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub fn of<T: Hash + ?Sized>(value: &T) -> Self {
        Self(hash_one(value))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:016x})", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
