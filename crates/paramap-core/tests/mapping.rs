use paramap_core::table::{CLASS_COLUMNS, CODE_COLUMNS, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS};
use paramap_core::{
    build_code_to_species, build_species_values, generate_parameter_grid, ColumnRole, Grid, MapError,
    Table, SENTINEL,
};

fn table(name: &str, csv: &str) -> Table {
    Table::from_reader(name, csv.as_bytes(), b',').unwrap()
}

#[test]
fn tables_to_grid_scenario() {
    let lu = table("lu.csv", "CODE,CLASS\n1,Oak_Forest\n2,Pine_Forest\n3,Grassland\n");
    let veg = table(
        "veg.csv",
        "SPECIESID,CONSTANT,VALUE\nOak_Forest,LAI_max,5.5\nPine_Forest,LAI_max,4.8\nGrassland,RD_max,0.2\n",
    );

    let c2s = build_code_to_species(&lu, CODE_COLUMNS, CLASS_COLUMNS).unwrap();
    let values = build_species_values(&veg, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS, "LAI_max").unwrap();
    let grid = Grid::from_rows(vec![vec![1, 2, 3]]).unwrap();

    let out = generate_parameter_grid(&grid, &c2s, &values);
    assert_eq!(out.to_rows(), vec![vec![5.5, 4.8, SENTINEL]]);
}

#[test]
fn species_column_case_variants_resolve_identically() {
    let grid = Grid::from_rows(vec![vec![1, 2], vec![2, 1]]).unwrap();
    let lu = table("lu.csv", "Value,SpeciesID\n1,Oak_Forest\n2,Pine_Forest\n");
    let c2s = build_code_to_species(&lu, CODE_COLUMNS, CLASS_COLUMNS).unwrap();

    let outputs: Vec<_> = ["speciesid", "SPECIESID", "SpeciesID"]
        .iter()
        .map(|h| {
            let veg = table("veg.csv", &format!("{h},key,val\nOak_Forest,LAI_max,5.5\n"));
            let values =
                build_species_values(&veg, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS, "LAI_max").unwrap();
            generate_parameter_grid(&grid, &c2s, &values)
        })
        .collect();

    assert_eq!(outputs[0].to_rows(), vec![vec![5.5, 0.0], vec![0.0, 5.5]]);
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[1], outputs[2]);
}

#[test]
fn no_candidate_means_no_guess() {
    let lu = table("lu.csv", "LANDUSE,DESCRIPTION\n1,Oak_Forest\n");
    let err = build_code_to_species(&lu, CODE_COLUMNS, CLASS_COLUMNS).unwrap_err();
    match err {
        MapError::MissingColumn { table, role, .. } => {
            assert_eq!(table, "lu.csv");
            assert_eq!(role, ColumnRole::Code);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn shape_is_preserved_for_any_grid() {
    let lu = table("lu.csv", "CODE,CLASS\n1,A\n2,B\n");
    let c2s = build_code_to_species(&lu, CODE_COLUMNS, CLASS_COLUMNS).unwrap();
    let values = [("A".to_string(), 1.0)].into_iter().collect();

    for (w, h) in [(1, 7), (7, 1), (13, 11)] {
        let codes: Vec<i64> = (0..w * h).map(|i| (i % 4) as i64).collect();
        let grid = Grid::from_vec(w, h, codes).unwrap();
        let out = generate_parameter_grid(&grid, &c2s, &values);
        assert_eq!(out.shape(), grid.shape());
        for (v, c) in out.data.iter().zip(&grid.data) {
            assert_eq!(*v, if *c == 1 { 1.0 } else { SENTINEL });
        }
    }
}
