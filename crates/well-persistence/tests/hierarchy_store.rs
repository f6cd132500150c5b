
use test_support::{day, seed_tree, temp_store};
use well_domain::{Level, Node, NodeKey, OilReportFields, PathKey, ReportFields, ReportKind, WaterReportFields, WellOwner};
use well_persistence::{PersistenceError, SequenceResolver};

fn keys(segments: &[&str]) -> Vec<PathKey> {
    segments.iter().map(|s| PathKey::parse(s)).collect()
}

#[test]
fn upsert_is_idempotent_and_updates_attributes() {
    let (_dir, store) = temp_store();
    let tree = seed_tree(&store);

    assert_eq!(store.upsert_area("X").unwrap(), tree.area);
    assert_eq!(store.upsert_team(tree.area, 1, "Equipo uno").unwrap(), tree.team);
    assert_eq!(store.upsert_room(tree.team, "R1", false).unwrap(), tree.room);
    assert_eq!(store.upsert_report_type(tree.room, ReportKind::Oil).unwrap(), tree.oil);
    assert_eq!(store.upsert_platform(tree.oil, "P1").unwrap(), tree.platform);
    assert_eq!(store.upsert_well(WellOwner::Platform(tree.platform), "O1").unwrap(), tree.oil_wells[0]);

    let teams = store.list_children(Level::Area, &NodeKey::Id(tree.area)).unwrap();
    assert_eq!(teams.len(), 1);
    let Node::Team(team) = &teams[0] else { panic!("expected team") };
    assert_eq!(team.name, "Equipo uno");

    let Some(Node::Room(room)) = store.find(Level::Room, &NodeKey::Id(tree.room)).unwrap() else {
        panic!("expected room")
    };
    assert!(!room.is_injection);
}

#[test]
fn list_children_follows_report_kind() {
    let (_dir, store) = temp_store();
    let tree = seed_tree(&store);

    let water = store.list_children(Level::ReportType, &NodeKey::Id(tree.water)).unwrap();
    assert_eq!(water.iter().map(Node::level).collect::<Vec<_>>(), vec![Level::Well]);

    let oil = store.list_children(Level::ReportType, &NodeKey::Id(tree.oil)).unwrap();
    assert_eq!(oil.len(), 1);
    assert!(matches!(&oil[0], Node::Platform(p) if p.label == "P1"));

    let wells = store.list_children(Level::Platform, &NodeKey::from("P1")).unwrap();
    assert_eq!(wells.iter().map(Node::id).collect::<Vec<_>>(), tree.oil_wells);
}

#[test]
fn list_children_of_missing_parent_is_empty() {
    let (_dir, store) = temp_store();
    seed_tree(&store);
    assert!(store.list_children(Level::Area, &NodeKey::from("nowhere")).unwrap().is_empty());
    assert!(store.list_children(Level::Well, &NodeKey::Id(9_999)).unwrap().is_empty());
}

#[test]
fn list_areas_is_ordered_by_name() {
    let (_dir, store) = temp_store();
    store.upsert_area("Norte").unwrap();
    store.upsert_area("Este").unwrap();
    let names: Vec<_> = store.list_areas().unwrap().into_iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["Este", "Norte"]);
}

#[test]
fn wells_must_match_their_owner_kind() {
    let (_dir, store) = temp_store();
    let tree = seed_tree(&store);

    let err = store.upsert_well(WellOwner::ReportType(tree.oil), "bad").unwrap_err();
    assert!(matches!(err, PersistenceError::Validation(_)));

    let err = store.upsert_platform(tree.water, "P9").unwrap_err();
    assert!(matches!(err, PersistenceError::Validation(_)));
}

#[test]
fn delete_removes_whole_subtree() {
    let (_dir, store) = temp_store();
    let tree = seed_tree(&store);
    store.upsert_report(tree.water_well,
                        day(1),
                        &ReportFields::Water(WaterReportFields::default().with_injection_mode("steady")))
         .unwrap();
    store.upsert_report(tree.oil_wells[0], day(1), &ReportFields::Oil(OilReportFields::default().set("oil_pressure", "3")))
         .unwrap();

    let removed = store.delete(Level::Area, tree.area).unwrap();
    // área, equipo, sala, 2 tipos, plataforma, 3 pozos, 2 reportes
    assert_eq!(removed, 11);
    assert!(store.list_areas().unwrap().is_empty());
    assert!(store.find(Level::Well, &NodeKey::Id(tree.water_well)).unwrap().is_none());
    assert!(store.water_report(tree.water_well, day(1)).unwrap().is_none());
    assert!(store.oil_report(tree.oil_wells[0], day(1)).unwrap().is_none());
}

#[test]
fn delete_of_missing_node_is_not_found() {
    let (_dir, store) = temp_store();
    assert!(matches!(store.delete(Level::Well, 42), Err(PersistenceError::NotFound)));
}

#[test]
fn deleting_a_well_keeps_its_siblings() {
    let (_dir, store) = temp_store();
    let tree = seed_tree(&store);
    store.delete(Level::Well, tree.oil_wells[0]).unwrap();
    let left = store.list_children(Level::Platform, &NodeKey::Id(tree.platform)).unwrap();
    assert_eq!(left.iter().map(Node::id).collect::<Vec<_>>(), vec![tree.oil_wells[1]]);
}

#[test]
fn resolver_walks_path_down_to_report() {
    let (_dir, store) = temp_store();
    let tree = seed_tree(&store);
    let report_id = store.upsert_report(tree.water_well,
                                        day(1),
                                        &ReportFields::Water(WaterReportFields::default().with_injection_mode("steady")))
                         .unwrap();

    let resolver = SequenceResolver::new(&store);
    let path = |date: &str| keys(&["X", "T1", "R1", "Water", "W1", date]);

    let Some(Node::WaterReport(report)) = resolver.resolve(&path("2024-01-01")).unwrap() else {
        panic!("expected water report")
    };
    assert_eq!(report.id, report_id);
    assert_eq!(report.injection_mode.as_deref(), Some("steady"));

    assert!(resolver.resolve(&path("2024-01-02")).unwrap().is_none());
}

#[test]
fn resolver_stops_at_intermediate_nodes_and_misses() {
    let (_dir, store) = temp_store();
    let tree = seed_tree(&store);
    let resolver = SequenceResolver::new(&store);

    assert!(matches!(resolver.resolve(&keys(&["X"])).unwrap(), Some(Node::Area(a)) if a.id == tree.area));
    // el equipo también se direcciona por número de secuencia
    let oil_well = resolver.resolve(&[PathKey::from("X"),
                                      PathKey::Name("1".into()),
                                      PathKey::from("R1"),
                                      PathKey::from("油报"),
                                      PathKey::from("P1"),
                                      PathKey::from("O2")])
                           .unwrap();
    assert!(matches!(oil_well, Some(Node::Well(w)) if w.id == tree.oil_wells[1]));

    assert!(resolver.resolve(&keys(&["X", "T9"])).unwrap().is_none());
    assert!(resolver.resolve(&[]).unwrap().is_none());
    // una fecha sólo vale después de un pozo
    assert!(resolver.resolve(&[PathKey::from("X"), PathKey::Date(day(1))]).unwrap().is_none());
}

#[test]
fn resolver_reaches_numeric_codes_and_team_sequence() {
    let (_dir, store) = temp_store();
    let area = store.upsert_area("X").unwrap();
    let team = store.upsert_team(area, 3, "T1").unwrap();
    let room = store.upsert_room(team, "101", true).unwrap();
    let water = store.upsert_report_type(room, ReportKind::Water).unwrap();
    let oil = store.upsert_report_type(room, ReportKind::Oil).unwrap();
    let platform = store.upsert_platform(oil, "7").unwrap();
    let water_well = store.upsert_well(WellOwner::ReportType(water), "2201").unwrap();
    let oil_well = store.upsert_well(WellOwner::Platform(platform), "3301").unwrap();

    let resolver = SequenceResolver::new(&store);
    let found = resolver.resolve(&keys(&["X", "T1", "101", "Water", "2201"])).unwrap();
    assert!(matches!(found, Some(Node::Well(w)) if w.id == water_well));

    let by_seq = resolver.resolve(&keys(&["X", "3"])).unwrap();
    assert!(matches!(by_seq, Some(Node::Team(t)) if t.id == team));

    let found = resolver.resolve(&keys(&["X", "3", "101", "Oil", "7", "3301"])).unwrap();
    assert!(matches!(found, Some(Node::Well(w)) if w.id == oil_well));

    let records = store.load_live_records(&keys(&["X", "3"]), day(1)).unwrap();
    assert_eq!(records.iter().map(|r| r.well_id).collect::<Vec<_>>(), vec![oil_well]);
    assert_eq!(records[0].well_code, "3301");
}

#[test]
fn numeric_area_names_resolve_from_the_root() {
    let (_dir, store) = temp_store();
    let area = store.upsert_area("500").unwrap();
    let resolver = SequenceResolver::new(&store);
    assert!(matches!(resolver.resolve(&keys(&["500"])).unwrap(), Some(Node::Area(a)) if a.id == area));
}

#[test]
fn failed_delete_rolls_back_the_whole_cascade() {
    use diesel::RunQueryDsl;
    use well_persistence::ConnectionProvider;

    let (_dir, store) = temp_store();
    let tree = seed_tree(&store);
    store.upsert_report(tree.oil_wells[0], day(1), &ReportFields::Oil(OilReportFields::default().set("oil_pressure", "3")))
         .unwrap();

    // El área es lo último que se borra: los hijos ya se habían ido dentro de la transacción.
    let mut conn = store.provider.connection().unwrap();
    diesel::sql_query("CREATE TRIGGER block_area_delete BEFORE DELETE ON areas BEGIN SELECT RAISE(ABORT, 'blocked'); END;")
        .execute(&mut conn)
        .unwrap();
    drop(conn);

    assert!(store.delete(Level::Area, tree.area).is_err());

    assert_eq!(store.list_areas().unwrap().len(), 1);
    let team = store.list_children(Level::Area, &NodeKey::Id(tree.area)).unwrap();
    assert_eq!(team.iter().map(Node::id).collect::<Vec<_>>(), vec![tree.team]);
    let wells = store.list_children(Level::Platform, &NodeKey::Id(tree.platform)).unwrap();
    assert_eq!(wells.len(), 2);
    assert!(store.find(Level::Well, &NodeKey::Id(tree.water_well)).unwrap().is_some());
    let report = store.oil_report(tree.oil_wells[0], day(1)).unwrap().unwrap();
    assert_eq!(report.values.get("oil_pressure").map(String::as_str), Some("3"));
}

#[test]
fn unique_violation_maps_to_integrity_conflict() {
    use diesel::prelude::*;
    use well_persistence::schema::areas;
    use well_persistence::ConnectionProvider;

    let (_dir, store) = temp_store();
    store.upsert_area("X").unwrap();

    let mut conn = store.provider.connection().unwrap();
    let err = diesel::insert_into(areas::table).values(areas::name.eq("X")).execute(&mut conn).unwrap_err();
    assert!(matches!(PersistenceError::from(err), PersistenceError::IntegrityConflict(_)));
}
