
use crate::error::PlanError;

/// RESERVE_BASE is held back from free space regardless of chunk count.
pub const RESERVE_BASE: u64 = 1 << 20;
/// PER_CHUNK_OVERHEAD covers one checksum file block plus data file slack.
pub const PER_CHUNK_OVERHEAD: u64 = 8 * 1024;
/// DEFAULT_MIN_TAIL is the smallest trailing chunk worth writing.
pub const DEFAULT_MIN_TAIL: u64 = 1_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TotalSize {
    /// Use everything the filesystem reports free, minus the margin.
    FillAvailable,
    Bytes(u64),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub index: u64,
    pub size_bytes: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlanParams {
    pub total: TotalSize,
    pub chunk_size: u64,
    pub min_tail: u64,
}

impl PlanParams {
    #[must_use]
    pub const fn new(total: TotalSize, chunk_size: u64) -> Self {
        Self {
            total,
            chunk_size,
            min_tail: DEFAULT_MIN_TAIL,
        }
    }

    #[must_use]
    pub const fn with_min_tail(mut self, min_tail: u64) -> Self {
        self.min_tail = min_tail;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    descriptors: Vec<ChunkDescriptor>,
    total_bytes: u64,
    margin_bytes: u64,
}

impl ChunkPlan {
    #[must_use]
    pub fn descriptors(&self) -> &[ChunkDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    #[must_use]
    pub const fn margin_bytes(&self) -> u64 {
        self.margin_bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Space reserved for checksum files and filesystem bookkeeping when up to
/// `candidate` bytes are written in `chunk_size` pieces.
#[must_use]
pub fn margin_for(candidate: u64, chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        return RESERVE_BASE;
    }
    candidate
        .div_ceil(chunk_size)
        .saturating_mul(PER_CHUNK_OVERHEAD)
        .saturating_add(RESERVE_BASE)
}

/// Splits the effective total into full chunks plus at most one shorter
/// tail. Pure: the same inputs always give the same plan.
///
/// # Errors
/// Returns [`PlanError`] when the parameters are invalid or nothing fits.
pub fn plan(params: &PlanParams, free_bytes: u64) -> Result<ChunkPlan, PlanError> {
    let chunk_size = params.chunk_size;
    if chunk_size == 0 {
        return Err(PlanError::InvalidChunkSize);
    }
    let requested = match params.total {
        TotalSize::FillAvailable => free_bytes,
        TotalSize::Bytes(0) => return Err(PlanError::InvalidTotal),
        TotalSize::Bytes(n) => n,
    };

    let margin = margin_for(requested.min(free_bytes), chunk_size);
    let effective = requested.min(free_bytes.saturating_sub(margin));
    if effective == 0 {
        return Err(PlanError::InsufficientSpace {
            available: free_bytes,
            margin,
        });
    }

    let full = effective / chunk_size;
    let remainder = effective % chunk_size;
    let keep_tail = remainder > 0 && (full == 0 || remainder >= params.min_tail.max(1));

    let mut descriptors: Vec<ChunkDescriptor> = (0..full)
        .map(|index| ChunkDescriptor {
            index,
            size_bytes: chunk_size,
        })
        .collect();
    if keep_tail {
        descriptors.push(ChunkDescriptor {
            index: full,
            size_bytes: remainder,
        });
    }

    let total_bytes = descriptors.iter().map(|d| d.size_bytes).sum();
    Ok(ChunkPlan {
        descriptors,
        total_bytes,
        margin_bytes: margin,
    })
}
