//! Typed resources moved by trades.
//!
//! Materials carry an isotopic composition; products are opaque apart from a quality
//! label. The exchange only ever looks at quantities, so the arithmetic here is limited to
//! splitting, combining and (for materials) blending compositions by quantity.
use crate::exchange::tolerance::is_neg;
use crate::id::define_id_type;
use anyhow::{Result, bail, ensure};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::rc::Rc;

define_id_type!(RecipeID);

/// Identifier of a nuclide in ZAID form, e.g. `922350` for U-235
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct NuclideId(pub u32);

/// Whether composition fractions are by mass or by atom count
#[derive(Clone, Copy, Debug, Eq, PartialEq, DeserializeLabeledStringEnum)]
pub enum Basis {
    /// Fractions are mass fractions
    #[string = "mass"]
    Mass,
    /// Fractions are atom (mole) fractions
    #[string = "atom"]
    Atom,
}

/// An immutable isotopic composition, shared between the materials that carry it.
///
/// Fractions are normalised to sum to one on construction. The empty composition stands in
/// for "unspecified" and is only produced by [`Composition::unspecified`]; requests use it
/// when they do not care what they receive.
#[derive(Debug, PartialEq)]
pub struct Composition {
    basis: Basis,
    fractions: IndexMap<NuclideId, f64>,
}

impl Composition {
    /// Create a composition, normalising `fractions` to sum to one.
    ///
    /// Every fraction must be positive and at least one nuclide must be present.
    pub fn new(basis: Basis, fractions: IndexMap<NuclideId, f64>) -> Result<Rc<Self>> {
        ensure!(
            !fractions.is_empty(),
            "A composition must contain at least one nuclide"
        );
        for (nuclide, fraction) in &fractions {
            ensure!(
                *fraction > 0.0 && fraction.is_finite(),
                "Nuclide {nuclide} has nonpositive fraction {fraction}"
            );
        }

        let total: f64 = fractions.values().sum();
        let fractions = fractions
            .into_iter()
            .map(|(nuclide, fraction)| (nuclide, fraction / total))
            .collect();
        Ok(Rc::new(Self { basis, fractions }))
    }

    /// The composition of a material whose isotopics are unspecified
    pub fn unspecified() -> Rc<Self> {
        Rc::new(Self {
            basis: Basis::Mass,
            fractions: IndexMap::new(),
        })
    }

    /// Whether this is the unspecified composition
    pub fn is_unspecified(&self) -> bool {
        self.fractions.is_empty()
    }

    /// The basis the fractions are expressed in
    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// The normalised fraction of `nuclide`, or zero if absent
    pub fn fraction(&self, nuclide: NuclideId) -> f64 {
        self.fractions.get(&nuclide).copied().unwrap_or(0.0)
    }

    /// Iterate over `(nuclide, fraction)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (NuclideId, f64)> + '_ {
        self.fractions.iter().map(|(&nuclide, &frac)| (nuclide, frac))
    }
}

/// Recipes, keyed by ID and kept in declaration order
pub type RecipeMap = IndexMap<RecipeID, Rc<Composition>>;

/// A quantity of material with an isotopic composition
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    qty: f64,
    composition: Rc<Composition>,
}

impl Material {
    /// Create `qty` units of material with the given composition
    pub fn new(qty: f64, composition: Rc<Composition>) -> Self {
        Self { qty, composition }
    }

    /// Create `qty` units of material with unspecified isotopics
    pub fn blank(qty: f64) -> Self {
        Self::new(qty, Composition::unspecified())
    }

    /// The material's composition
    pub fn composition(&self) -> &Rc<Composition> {
        &self.composition
    }
}

/// A quantity of a resource with no internal structure beyond a quality label
#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    qty: f64,
    quality: Rc<str>,
}

impl Product {
    /// Create `qty` units of product with the given quality label
    pub fn new(qty: f64, quality: &str) -> Self {
        Self {
            qty,
            quality: quality.into(),
        }
    }

    /// The product's quality label
    pub fn quality(&self) -> &str {
        &self.quality
    }
}

/// A typed resource moved by trades
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    /// A material with an isotopic composition
    Material(Material),
    /// An opaque product
    Product(Product),
}

impl Resource {
    /// The quantity this resource represents
    pub fn quantity(&self) -> f64 {
        match self {
            Self::Material(material) => material.qty,
            Self::Product(product) => product.qty,
        }
    }

    /// Split off `qty` units, leaving the remainder behind.
    ///
    /// Fails when more is extracted than is held (beyond tolerance); the remainder is
    /// clamped to zero when the extraction empties the resource within tolerance.
    pub fn extract(&mut self, qty: f64) -> Result<Self> {
        ensure!(qty >= 0.0, "Cannot extract a negative quantity");

        let held = self.quantity();
        let remainder = held - qty;
        ensure!(
            !is_neg(remainder),
            "Cannot extract {qty} from a resource holding {held}"
        );

        let remainder = remainder.max(0.0);
        let mut extracted = self.clone();
        match (&mut extracted, &mut *self) {
            (Self::Material(out), Self::Material(kept)) => {
                out.qty = qty;
                kept.qty = remainder;
            }
            (Self::Product(out), Self::Product(kept)) => {
                out.qty = qty;
                kept.qty = remainder;
            }
            _ => unreachable!("extract preserves the resource kind"),
        }

        Ok(extracted)
    }

    /// Combine `other` into this resource.
    ///
    /// Materials blend their compositions weighted by quantity; an unspecified composition
    /// adopts the other side's. Products must share a quality label, and a material cannot
    /// absorb a product or vice versa.
    pub fn absorb(&mut self, other: Self) -> Result<()> {
        match (&mut *self, other) {
            (Self::Material(held), Self::Material(incoming)) => {
                held.composition = blend(held, &incoming)?;
                held.qty += incoming.qty;
            }
            (Self::Product(held), Self::Product(incoming)) => {
                ensure!(
                    held.quality == incoming.quality,
                    "Cannot combine products of quality {} and {}",
                    held.quality,
                    incoming.quality
                );
                held.qty += incoming.qty;
            }
            _ => bail!("Cannot combine a material with a product"),
        }

        Ok(())
    }
}

/// The quantity-weighted blend of two materials' compositions
fn blend(a: &Material, b: &Material) -> Result<Rc<Composition>> {
    if b.composition.is_unspecified() || Rc::ptr_eq(&a.composition, &b.composition) {
        return Ok(Rc::clone(&a.composition));
    }
    if a.composition.is_unspecified() {
        return Ok(Rc::clone(&b.composition));
    }

    ensure!(
        a.composition.basis() == b.composition.basis(),
        "Cannot blend compositions with different bases"
    );

    let mut fractions = IndexMap::new();
    for (material, weight) in [(a, a.qty), (b, b.qty)] {
        for (nuclide, fraction) in material.composition.iter() {
            *fractions.entry(nuclide).or_insert(0.0) += fraction * weight;
        }
    }
    Composition::new(a.composition.basis(), fractions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn natural_uranium() -> Rc<Composition> {
        Composition::new(
            Basis::Mass,
            IndexMap::from([(NuclideId(922350), 0.711), (NuclideId(922380), 99.289)]),
        )
        .unwrap()
    }

    #[test]
    fn test_composition_normalised() {
        let comp = natural_uranium();
        assert_approx_eq!(f64, comp.fraction(NuclideId(922350)), 0.00711);
        assert_approx_eq!(f64, comp.fraction(NuclideId(922380)), 0.99289);
        assert_eq!(comp.fraction(NuclideId(10010)), 0.0);
    }

    #[test]
    fn test_composition_rejects_nonpositive_fractions() {
        assert!(Composition::new(Basis::Mass, IndexMap::new()).is_err());
        assert!(
            Composition::new(Basis::Mass, IndexMap::from([(NuclideId(922350), 0.0)])).is_err()
        );
        assert!(
            Composition::new(Basis::Mass, IndexMap::from([(NuclideId(922350), -1.0)])).is_err()
        );
    }

    #[test]
    fn test_extract() {
        let mut resource = Resource::Material(Material::new(10.0, natural_uranium()));
        let taken = resource.extract(4.0).unwrap();
        assert_approx_eq!(f64, taken.quantity(), 4.0);
        assert_approx_eq!(f64, resource.quantity(), 6.0);

        // Overdrawing fails, and the failed call must not change the remainder
        assert!(resource.extract(7.0).is_err());
        assert_approx_eq!(f64, resource.quantity(), 6.0);
    }

    #[test]
    fn test_extract_emptying_clamps_to_zero() {
        let mut resource = Resource::Product(Product::new(1.0, "swu"));
        let taken = resource.extract(1.0 + 1e-8).unwrap();
        assert_approx_eq!(f64, taken.quantity(), 1.0 + 1e-8);
        assert_eq!(resource.quantity(), 0.0);
    }

    #[test]
    fn test_absorb_blends_compositions() {
        let enriched = Composition::new(
            Basis::Mass,
            IndexMap::from([(NuclideId(922350), 0.05), (NuclideId(922380), 0.95)]),
        )
        .unwrap();

        let mut held = Resource::Material(Material::new(1.0, natural_uranium()));
        held.absorb(Resource::Material(Material::new(1.0, enriched)))
            .unwrap();

        assert_approx_eq!(f64, held.quantity(), 2.0);
        let Resource::Material(material) = &held else {
            panic!("expected a material");
        };
        assert_approx_eq!(
            f64,
            material.composition().fraction(NuclideId(922350)),
            (0.00711 + 0.05) / 2.0
        );
    }

    #[test]
    fn test_absorb_adopts_composition_for_blank_material() {
        let mut held = Resource::Material(Material::blank(0.0));
        held.absorb(Resource::Material(Material::new(2.0, natural_uranium())))
            .unwrap();

        let Resource::Material(material) = &held else {
            panic!("expected a material");
        };
        assert!(!material.composition().is_unspecified());
        assert_approx_eq!(f64, held.quantity(), 2.0);
    }

    #[test]
    fn test_absorb_mismatches() {
        let mut material = Resource::Material(Material::blank(1.0));
        assert!(
            material
                .absorb(Resource::Product(Product::new(1.0, "swu")))
                .is_err()
        );

        let mut product = Resource::Product(Product::new(1.0, "swu"));
        assert!(
            product
                .absorb(Resource::Product(Product::new(1.0, "electricity")))
                .is_err()
        );
    }
}
