/// The constitutive laws that can be selected by name.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Bingham,
    LinearElastic,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 2] = [MaterialKind::Bingham, MaterialKind::LinearElastic];

    #[cfg(feature = "dim2")]
    const SUFFIX: &'static str = "2D";
    #[cfg(feature = "dim3")]
    const SUFFIX: &'static str = "3D";

    /// The registered name, e.g. `"Bingham2D"` in a 2D build.
    pub fn name(self) -> String {
        let base = match self {
            MaterialKind::Bingham => "Bingham",
            MaterialKind::LinearElastic => "LinearElastic",
        };
        format!("{}{}", base, Self::SUFFIX)
    }

    /// Names of another dimension are rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}
