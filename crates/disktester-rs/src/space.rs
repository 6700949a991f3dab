//! Free-space capability injected into planning.

/// Reports the bytes a run may still write to its target.
pub trait SpaceProbe: Send + Sync {
    /// # Errors
    /// Returns an error if the underlying filesystem cannot be queried.
    fn available_bytes(&self) -> std::io::Result<u64>;
}

/// A probe that always reports the same figure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FixedSpace(pub u64);

impl SpaceProbe for FixedSpace {
    fn available_bytes(&self) -> std::io::Result<u64> {
        Ok(self.0)
    }
}
