//! Name-to-factory lookup for subsequence distances.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constraint::BandConstraint;
use crate::error::DistanceError;
use crate::msm::Msm;
use crate::subsequence::{Euclidean, MsmSubsequence, SubsequenceDistance, ZNormEuclidean};

/// Parameters a distance factory may read.
#[derive(Debug, Clone, Copy)]
pub struct DistanceParams {
    /// MSM split/merge cost.
    pub msm_cost: f64,
    /// Warping band for elastic distances.
    pub band: BandConstraint,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            msm_cost: Msm::DEFAULT_COST,
            band: BandConstraint::Unconstrained,
        }
    }
}

/// Builds a distance from parameters.
pub type DistanceFactory =
    fn(&DistanceParams) -> Result<Arc<dyn SubsequenceDistance>, DistanceError>;

/// Registry of subsequence distances keyed by name.
///
/// [`DistanceRegistry::default`] holds the built-ins: `euclidean`,
/// `znorm-euclidean` and `msm`.
#[derive(Debug, Clone)]
pub struct DistanceRegistry {
    factories: BTreeMap<String, DistanceFactory>,
}

impl Default for DistanceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("euclidean", |_| Ok(Arc::new(Euclidean)));
        registry.register("znorm-euclidean", |_| Ok(Arc::new(ZNormEuclidean)));
        registry.register("msm", |params| {
            let msm = Msm::new(params.msm_cost)?.with_constraint(params.band);
            Ok(Arc::new(MsmSubsequence::new(msm)))
        });
        registry
    }
}

impl DistanceRegistry {
    /// A registry with nothing registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register (or replace) the factory for `name`.
    pub fn register(&mut self, name: &str, factory: DistanceFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the distance registered under `name`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::UnknownDistance`] | `name` is not registered |
    /// | [`DistanceError::InvalidCost`] | the MSM factory rejected `params.msm_cost` |
    pub fn create(
        &self,
        name: &str,
        params: &DistanceParams,
    ) -> Result<Arc<dyn SubsequenceDistance>, DistanceError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DistanceError::UnknownDistance {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })?;
        factory(params)
    }
}
