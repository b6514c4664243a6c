use crate::math::{Point, Real, Vector, VoigtVector};

/// Sentinel stored in [`PackedParticleHeader::cell`] for a particle outside of any cell.
pub const NO_CELL: u64 = u64::MAX;

/*
 * Fixed-layout records used to pack a particle into bytes. A packed particle is one
 * header followed by `nphases` phase records.
 */

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct PackedParticleHeader {
    pub id: u64,
    pub cell: u64,
    pub nphases: u32,
    pub status: u32,
    pub material: u32,
    pub has_material: u32,
    pub volume: Real,
    pub coordinates: Point<Real>,
    pub xi: Vector<Real>,
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct PackedParticlePhase {
    pub mass: Real,
    pub dvolumetric_strain: Real,
    pub stress: VoigtVector<Real>,
    pub strain: VoigtVector<Real>,
    pub strain_rate: VoigtVector<Real>,
    pub dstrain: VoigtVector<Real>,
    pub velocity: Vector<Real>,
    pub momentum: Vector<Real>,
    pub acceleration: Vector<Real>,
}

impl PackedParticleHeader {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// The total size of a packed particle with this header.
    pub fn packed_size(&self) -> usize {
        Self::SIZE + self.nphases as usize * PackedParticlePhase::SIZE
    }
}

impl PackedParticlePhase {
    pub const SIZE: usize = core::mem::size_of::<Self>();
}
