use crate::math::Real;
use alloc::collections::BTreeMap;
use core::fmt;

/// A flat set of named scalar material parameters.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(transparent))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialProperties {
    values: BTreeMap<String, Real>,
}

impl MaterialProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Real) -> Option<Real> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<Real> {
        self.values.get(key).copied()
    }

    /// Like `get`, but a missing key is an error.
    pub fn require(&self, key: &str) -> Result<Real, MissingProperty> {
        self.get(key).ok_or_else(|| MissingProperty(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The properties, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Real)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, Real)> for MaterialProperties {
    fn from_iter<I: IntoIterator<Item = (K, Real)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Real); N]> for MaterialProperties {
    fn from(values: [(K, Real); N]) -> Self {
        values.into_iter().collect()
    }
}

/// A material parameter required by a constitutive law was not provided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingProperty(pub String);

impl fmt::Display for MissingProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing material property `{}`", self.0)
    }
}

impl std::error::Error for MissingProperty {}

#[cfg(test)]
mod test {
    use super::{MaterialProperties, MissingProperty};

    #[test]
    fn lookup_and_order() {
        let mut properties = MaterialProperties::from([("tau0", 771.8), ("density", 1000.0)]);
        assert_eq!(properties.insert("mu", 0.0451), None);
        assert_eq!(properties.insert("mu", 0.05), Some(0.0451));

        assert_eq!(properties.len(), 3);
        assert_eq!(properties.get("density"), Some(1000.0));
        assert_eq!(
            properties.require("poisson_ratio"),
            Err(MissingProperty("poisson_ratio".to_string()))
        );

        let names: Vec<_> = properties.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["density", "mu", "tau0"]);
    }
}
