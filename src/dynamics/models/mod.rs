pub use self::bingham::Bingham;
pub use self::linear_elastic::LinearElastic;
pub use self::material::Material;
pub use crate::core::dynamics::models::*;

mod bingham;
mod linear_elastic;
mod material;

/// Creates the material registered under `name`, e.g. `"Bingham2D"`.
///
/// Only the materials of the dimension this crate is built for are registered.
pub fn create_material(name: &str, id: u32) -> anyhow::Result<Box<dyn Material>> {
    let kind = MaterialKind::from_name(name)
        .ok_or_else(|| anyhow::anyhow!("unknown material: {}", name))?;

    Ok(match kind {
        MaterialKind::Bingham => Box::new(Bingham::new(id)),
        MaterialKind::LinearElastic => Box::new(LinearElastic::new(id)),
    })
}
