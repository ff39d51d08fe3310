//! Lookup tables built from the classification and parameter tables.
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::table::{ColumnRole, Table, TYPE_COLUMNS};

/// Land-use code → species/class name, names kept verbatim.
pub type CodeToSpecies = BTreeMap<i64, String>;

/// Species name → value of one parameter.
pub type SpeciesValues = BTreeMap<String, f64>;

// ── Column layouts ───────────────────────────────────────────────────────────

/// Resolved columns of a classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationLayout {
    pub code: usize,
    pub class: usize,
}

impl ClassificationLayout {
    pub fn resolve(table: &Table, code_columns: &[&str], class_columns: &[&str]) -> Result<Self> {
        Ok(Self {
            code: table.resolve(ColumnRole::Code, code_columns)?,
            class: table.resolve(ColumnRole::Class, class_columns)?,
        })
    }

    /// `(label, header)` pairs for display.
    pub fn describe(&self, table: &Table) -> Vec<(String, String)> {
        vec![
            ("Code column".into(), table.header(self.code).into()),
            ("Class column".into(), table.header(self.class).into()),
        ]
    }
}

/// Resolved columns of a parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLayout {
    pub id: usize,
    pub key: usize,
    pub value: usize,
    /// Uniform (0) / spatial (1) flag. Detected but not acted on.
    pub kind: Option<usize>,
}

impl ParameterLayout {
    pub fn resolve(
        table: &Table,
        id_columns: &[&str],
        key_columns: &[&str],
        value_columns: &[&str],
    ) -> Result<Self> {
        Ok(Self {
            id: table.resolve(ColumnRole::SpeciesId, id_columns)?,
            key: table.resolve(ColumnRole::ParameterKey, key_columns)?,
            value: table.resolve(ColumnRole::Value, value_columns)?,
            kind: table.resolve(ColumnRole::Type, TYPE_COLUMNS).ok(),
        })
    }

    pub fn describe(&self, table: &Table) -> Vec<(String, String)> {
        let mut cols = vec![
            ("Species ID column".into(), table.header(self.id).into()),
            ("Parameter key column".into(), table.header(self.key).into()),
            ("Value column".into(), table.header(self.value).into()),
        ];
        if let Some(kind) = self.kind {
            cols.push(("Type column (ignored)".into(), table.header(kind).into()));
        }
        cols
    }
}

// ── Builders ─────────────────────────────────────────────────────────────────

/// Build the code → species mapping from a classification table.
///
/// Fails with `MissingColumn` if either role cannot be resolved. When a code
/// repeats, the last row wins.
pub fn build_code_to_species(
    table: &Table,
    code_columns: &[&str],
    class_columns: &[&str],
) -> Result<CodeToSpecies> {
    let layout = ClassificationLayout::resolve(table, code_columns, class_columns)?;
    code_to_species_with(table, &layout)
}

/// Build the code → species mapping using already-resolved columns.
pub fn code_to_species_with(table: &Table, layout: &ClassificationLayout) -> Result<CodeToSpecies> {
    let mut map = CodeToSpecies::new();
    for row in 0..table.len() {
        let code = parse_code(table.field(row, layout.code))
            .ok_or_else(|| table.invalid_value(row, layout.code))?;
        map.insert(code, table.field(row, layout.class).to_string());
    }
    debug!(table = table.name(), codes = map.len(), "code to species mapping built");
    Ok(map)
}

/// Build the species → value mapping of one parameter from a parameter table.
///
/// Only rows whose key equals `parameter` exactly are used. No matching rows
/// is not an error: the result is empty.
pub fn build_species_values(
    table: &Table,
    id_columns: &[&str],
    key_columns: &[&str],
    value_columns: &[&str],
    parameter: &str,
) -> Result<SpeciesValues> {
    let layout = ParameterLayout::resolve(table, id_columns, key_columns, value_columns)?;
    species_values_with(table, &layout, parameter)
}

/// Build the species → value mapping of `parameter` using already-resolved columns.
pub fn species_values_with(
    table: &Table,
    layout: &ParameterLayout,
    parameter: &str,
) -> Result<SpeciesValues> {
    let mut map = SpeciesValues::new();
    // TODO: rows flagged uniform (type 0) still produce a spatial map; decide
    // whether they should be written as a single constant instead.
    for row in (0..table.len()).filter(|&r| table.field(r, layout.key) == parameter) {
        let value = parse_number(table.field(row, layout.value))
            .ok_or_else(|| table.invalid_value(row, layout.value))?;
        map.insert(table.field(row, layout.id).to_string(), value);
    }
    debug!(table = table.name(), parameter, species = map.len(), "species values built");
    Ok(map)
}

/// Distinct parameter keys of a table in first-appearance order.
pub fn parameter_names(table: &Table, layout: &ParameterLayout) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in 0..table.len() {
        let key = table.field(row, layout.key);
        if !key.is_empty() && !names.iter().any(|n| n == key) {
            names.push(key.to_string());
        }
    }
    names
}

// ── Field parsing ────────────────────────────────────────────────────────────

/// Integer code; integral decimals such as `3.0` are accepted.
fn parse_code(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use crate::table::{CLASS_COLUMNS, CODE_COLUMNS, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS};

    fn table(csv: &str) -> Table {
        Table::from_reader("test.csv", csv.as_bytes(), b',').unwrap()
    }

    #[test]
    fn code_to_species_reads_codes_and_names() {
        let t = table("CODE,CLASS\n1,Oak_Forest\n2,Pine_Forest\n3,Grassland\n");
        let map = build_code_to_species(&t, CODE_COLUMNS, CLASS_COLUMNS).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map[&1], "Oak_Forest");
        assert_eq!(map[&3], "Grassland");
    }

    #[test]
    fn repeated_code_keeps_last_row() {
        let t = table("value,speciesid\n1,Oak_Forest\n1,Birch\n");
        let map = build_code_to_species(&t, CODE_COLUMNS, CLASS_COLUMNS).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1], "Birch");
    }

    #[test]
    fn integral_decimal_codes_are_accepted() {
        let t = table("CODE,CLASS\n4.0,Wetland\n");
        let map = build_code_to_species(&t, CODE_COLUMNS, CLASS_COLUMNS).unwrap();
        assert_eq!(map[&4], "Wetland");
    }

    #[test]
    fn non_integer_code_is_invalid() {
        let t = table("CODE,CLASS\n1,Oak\n2.5,Pine\n");
        let err = build_code_to_species(&t, CODE_COLUMNS, CLASS_COLUMNS).unwrap_err();
        match err {
            MapError::InvalidValue { row, column, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "CODE");
                assert_eq!(value, "2.5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn classification_without_class_column_fails() {
        let t = table("CODE,LABEL\n1,Oak\n");
        let err = build_code_to_species(&t, CODE_COLUMNS, CLASS_COLUMNS).unwrap_err();
        assert!(matches!(err, MapError::MissingColumn { role: ColumnRole::Class, .. }));
    }

    #[test]
    fn species_values_filter_on_exact_key() {
        let t = table(
            "SpeciesID,Constant,Value\n\
             Oak_Forest,LAI_max,5.5\n\
             Pine_Forest,LAI_max,4.8\n\
             Oak_Forest,RD_max,1.2\n\
             Oak_Forest,lai_max,9.9\n",
        );
        let lai = build_species_values(&t, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS, "LAI_max").unwrap();
        assert_eq!(lai.len(), 2);
        assert_eq!(lai["Oak_Forest"], 5.5);
        assert_eq!(lai["Pine_Forest"], 4.8);

        let rd = build_species_values(&t, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS, "RD_max").unwrap();
        assert_eq!(rd.len(), 1);
    }

    #[test]
    fn unknown_parameter_gives_empty_map() {
        let t = table("SPECIES,KEY,VAL\nOak_Forest,LAI_max,5.5\n");
        let map = build_species_values(&t, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS, "Kc").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn bad_value_only_fails_for_requested_parameter() {
        let t = table("SPECIES,KEY,VAL\nOak,LAI_max,5.5\nOak,Note,n/a\n");
        assert!(build_species_values(&t, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS, "LAI_max").is_ok());
        let err = build_species_values(&t, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS, "Note").unwrap_err();
        assert!(matches!(err, MapError::InvalidValue { row: 2, .. }));
    }

    #[test]
    fn parameter_table_without_value_column_fails() {
        let t = table("SPECIES,KEY,AMT\nOak,LAI_max,5.5\n");
        let err = build_species_values(&t, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS, "LAI_max").unwrap_err();
        assert!(matches!(err, MapError::MissingColumn { role: ColumnRole::Value, .. }));
    }

    #[test]
    fn type_column_is_detected_when_present() {
        let t = table("SPECIESID,PARAM,VALUE,Type\nOak,LAI_max,5.5,0\n");
        let layout = ParameterLayout::resolve(&t, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS).unwrap();
        assert_eq!(layout.kind, Some(3));
        // A uniform row still yields a value.
        assert_eq!(species_values_with(&t, &layout, "LAI_max").unwrap()["Oak"], 5.5);
    }

    #[test]
    fn parameter_names_in_first_appearance_order() {
        let t = table("SPECIES,KEY,VAL\nA,RD_max,1\nA,LAI_max,2\nB,RD_max,3\nC,,4\n");
        let layout = ParameterLayout::resolve(&t, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS).unwrap();
        assert_eq!(parameter_names(&t, &layout), vec!["RD_max", "LAI_max"]);
    }
}
