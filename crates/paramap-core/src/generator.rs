//! Code → value substitution over a land-use grid.
//!
//! The per-code values are resolved once into a lookup table, then applied to
//! every cell in a single pass. Cells whose code has no species, or whose
//! species has no value, keep [`SENTINEL`]. That is not an error; the
//! [`MappingReport`] records it so callers can detect silent gaps.
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::grid::{LandUseGrid, ParameterGrid, SENTINEL};
use crate::mapping::{CodeToSpecies, SpeciesValues};

/// Widest code span served by a dense `Vec` lookup table.
const DENSE_SPAN_MAX: i64 = 1 << 16;

/// What was left at the sentinel while generating one parameter grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingReport {
    /// Codes present in the grid with no entry in the code → species mapping.
    pub unmapped_codes: BTreeSet<i64>,
    /// Species referenced by codes present in the grid but without a value.
    pub unresolved_species: BTreeSet<String>,
    /// Cells holding the sentinel because of either gap.
    pub unset_cells: usize,
}

impl MappingReport {
    /// True when every cell received a value.
    pub fn is_complete(&self) -> bool {
        self.unset_cells == 0
    }
}

/// Map every cell's code to its species' value.
///
/// The output has the shape of `landuse`. Unresolved cells hold [`SENTINEL`].
pub fn generate_parameter_grid(
    landuse: &LandUseGrid,
    code_to_species: &CodeToSpecies,
    species_values: &SpeciesValues,
) -> ParameterGrid {
    generate_parameter_grid_with_report(landuse, code_to_species, species_values).0
}

/// Same as [`generate_parameter_grid`], also reporting what stayed unset.
pub fn generate_parameter_grid_with_report(
    landuse: &LandUseGrid,
    code_to_species: &CodeToSpecies,
    species_values: &SpeciesValues,
) -> (ParameterGrid, MappingReport) {
    let resolved: Vec<(i64, f32)> = code_to_species
        .iter()
        .filter_map(|(&code, species)| species_values.get(species).map(|&v| (code, v as f32)))
        .collect();
    let lut = Lookup::new(&resolved);

    let mut out = ParameterGrid::filled(landuse.width, landuse.height, SENTINEL);
    let mut missed: BTreeSet<i64> = BTreeSet::new();
    let mut report = MappingReport::default();

    for (cell, &code) in out.data.iter_mut().zip(&landuse.data) {
        match lut.get(code) {
            Some(v) => *cell = v,
            None => {
                report.unset_cells += 1;
                missed.insert(code);
            }
        }
    }

    for code in missed {
        match code_to_species.get(&code) {
            Some(species) => {
                report.unresolved_species.insert(species.clone());
            }
            None => {
                report.unmapped_codes.insert(code);
            }
        }
    }

    (out, report)
}

// ── Lookup table ─────────────────────────────────────────────────────────────

enum Lookup {
    /// Indexed by `code - offset`.
    Dense { offset: i64, values: Vec<Option<f32>> },
    Sparse(HashMap<i64, f32>),
}

impl Lookup {
    fn new(resolved: &[(i64, f32)]) -> Self {
        let min = resolved.iter().map(|&(c, _)| c).min();
        let max = resolved.iter().map(|&(c, _)| c).max();
        match (min, max) {
            (Some(min), Some(max)) if max.checked_sub(min).is_some_and(|s| s < DENSE_SPAN_MAX) => {
                let mut values = vec![None; (max - min + 1) as usize];
                for &(code, v) in resolved {
                    values[(code - min) as usize] = Some(v);
                }
                Lookup::Dense { offset: min, values }
            }
            (None, None) => Lookup::Dense { offset: 0, values: Vec::new() },
            _ => Lookup::Sparse(resolved.iter().copied().collect()),
        }
    }

    #[inline]
    fn get(&self, code: i64) -> Option<f32> {
        match self {
            Lookup::Dense { offset, values } => {
                let idx = code.checked_sub(*offset)?;
                usize::try_from(idx).ok().and_then(|i| values.get(i).copied().flatten())
            }
            Lookup::Sparse(map) => map.get(&code).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn species(pairs: &[(i64, &str)]) -> CodeToSpecies {
        pairs.iter().map(|&(c, s)| (c, s.to_string())).collect()
    }

    fn values(pairs: &[(&str, f64)]) -> SpeciesValues {
        pairs.iter().map(|&(s, v)| (s.to_string(), v)).collect()
    }

    #[test]
    fn unresolved_species_stays_at_sentinel() {
        let lu = Grid::from_rows(vec![vec![1, 2], vec![2, 1]]).unwrap();
        let c2s = species(&[(1, "Oak_Forest"), (2, "Pine_Forest")]);
        let sv = values(&[("Oak_Forest", 5.5)]);

        let (out, report) = generate_parameter_grid_with_report(&lu, &c2s, &sv);
        assert_eq!(out.to_rows(), vec![vec![5.5, 0.0], vec![0.0, 5.5]]);
        assert_eq!(report.unset_cells, 2);
        assert!(report.unmapped_codes.is_empty());
        assert_eq!(report.unresolved_species.iter().collect::<Vec<_>>(), vec!["Pine_Forest"]);
    }

    #[test]
    fn unmapped_code_stays_at_sentinel() {
        let lu = Grid::from_rows(vec![vec![1, 2, 3]]).unwrap();
        let c2s = species(&[(1, "Oak_Forest"), (2, "Pine_Forest"), (3, "Grassland")]);
        let sv = values(&[("Oak_Forest", 5.5), ("Pine_Forest", 4.8)]);

        let out = generate_parameter_grid(&lu, &c2s, &sv);
        assert_eq!(out.to_rows(), vec![vec![5.5, 4.8, 0.0]]);

        let lu = Grid::from_rows(vec![vec![7, 1], vec![7, 7]]).unwrap();
        let (out, report) = generate_parameter_grid_with_report(&lu, &c2s, &sv);
        assert_eq!(out.to_rows(), vec![vec![0.0, 5.5], vec![0.0, 0.0]]);
        assert_eq!(report.unmapped_codes.iter().copied().collect::<Vec<_>>(), vec![7]);
        assert_eq!(report.unset_cells, 3);
    }

    #[test]
    fn species_match_is_case_and_whitespace_sensitive() {
        let lu = Grid::from_rows(vec![vec![1, 2, 3]]).unwrap();
        let c2s = species(&[(1, "oak_forest"), (2, "Oak_Forest "), (3, "Oak_Forest")]);
        let sv = values(&[("Oak_Forest", 5.5)]);
        let out = generate_parameter_grid(&lu, &c2s, &sv);
        assert_eq!(out.data, vec![0.0, 0.0, 5.5]);
    }

    #[test]
    fn output_shape_matches_input() {
        for (w, h) in [(1, 1), (5, 3), (3, 5), (0, 0)] {
            let lu = LandUseGrid::filled(w, h, 1);
            let out = generate_parameter_grid(&lu, &species(&[(1, "A")]), &values(&[("A", 2.0)]));
            assert_eq!(out.shape(), lu.shape());
            assert!(out.data.iter().all(|&v| v == 2.0));
        }
    }

    #[test]
    fn sparse_codes_match_dense_result() {
        let codes = vec![-5, 0, 1_000_000, 42, -5, 1_000_000];
        let lu = Grid::from_vec(3, 2, codes).unwrap();
        let c2s = species(&[(-5, "A"), (1_000_000, "B"), (42, "C")]);
        let sv = values(&[("A", 1.0), ("B", 2.0)]);

        let out = generate_parameter_grid(&lu, &c2s, &sv);
        assert_eq!(out.data, vec![1.0, 0.0, 2.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn matches_mask_per_code_reference() {
        let lu = Grid::from_vec(4, 3, vec![3, 1, 2, 9, 1, 1, 4, 3, 2, 2, 9, 0]).unwrap();
        let c2s = species(&[(1, "A"), (2, "B"), (3, "A"), (4, "D")]);
        let sv = values(&[("A", 0.25), ("B", 7.0), ("X", 1.0)]);

        // Straightforward per-code masking.
        let mut expected = vec![SENTINEL; lu.len()];
        for (code, sp) in &c2s {
            if let Some(&v) = sv.get(sp) {
                for (e, c) in expected.iter_mut().zip(&lu.data) {
                    if c == code {
                        *e = v as f32;
                    }
                }
            }
        }

        assert_eq!(generate_parameter_grid(&lu, &c2s, &sv).data, expected);
    }

    #[test]
    fn empty_mappings_give_all_sentinel() {
        let lu = LandUseGrid::filled(3, 2, 5);
        let (out, report) =
            generate_parameter_grid_with_report(&lu, &CodeToSpecies::new(), &SpeciesValues::new());
        assert!(out.data.iter().all(|&v| v == SENTINEL));
        assert_eq!(report.unset_cells, 6);
        assert!(!report.is_complete());
    }
}
