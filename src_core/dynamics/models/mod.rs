pub use self::elasticity_linear::LinearElasticity;
pub use self::material_kind::MaterialKind;
pub use self::material_properties::{MaterialProperties, MissingProperty};
pub use self::viscoplasticity_bingham::BinghamViscoplasticity;

mod elasticity_linear;
mod material_kind;
mod material_properties;
mod viscoplasticity_bingham;
