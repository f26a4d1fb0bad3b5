use bitvec::vec::BitVec;
use strum::IntoStaticStr;

/// Which fixed-capacity buffer ran out of space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum CapacityKind {
    /// The screen triangle buffer: whole triangles were dropped.
    TriangleBuffer,
    /// One or more tile buckets: triangles are missing from some tiles.
    TileBucket,
}

/// A capacity violation that happened during a frame. The frame still completed, but parts of
/// the scene are missing from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    pub kind: CapacityKind,
    /// How many triangles (or bucket entries, for [`CapacityKind::TileBucket`]) were dropped.
    pub dropped: u64,
}

/// Counters of the last completed frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameStats {
    /// Index of the frame these statistics belong to.
    pub frame: u64,
    /// Triangles in the loaded mesh.
    pub input_triangles: u32,
    /// Near-clipped triangles written to the intermediate buffer. Always zero with a single-pass
    /// clip.
    pub intermediate_triangles: u32,
    /// Screen triangles stored in the triangle buffer.
    pub triangles: u32,
    /// Screen triangles dropped because the triangle buffer was full.
    pub dropped_triangles: u32,
    /// Input triangles (or pieces of them) removed by clipping.
    pub rejected_triangles: u32,
    pub culled_triangles: u32,
    pub degenerate_triangles: u32,
    /// Triangle indices stored in tile buckets.
    pub bin_entries: u64,
    /// Triangle indices dropped because their tile bucket was full.
    pub dropped_bin_entries: u64,
    /// One bit per tile, set for tiles whose bucket overflowed.
    pub overflowed_tiles: BitVec,
}

impl FrameStats {
    /// The capacity violations of the frame, if any.
    pub fn capacity_exceeded(&self) -> impl Iterator<Item = CapacityExceeded> {
        let triangles = (self.dropped_triangles > 0).then_some(CapacityExceeded {
            kind: CapacityKind::TriangleBuffer,
            dropped: u64::from(self.dropped_triangles),
        });

        let buckets = (self.dropped_bin_entries > 0).then_some(CapacityExceeded {
            kind: CapacityKind::TileBucket,
            dropped: self.dropped_bin_entries,
        });

        triangles.into_iter().chain(buckets)
    }
}
