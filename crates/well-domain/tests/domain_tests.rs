use chrono::NaiveDate;
use well_domain::fields::{canonical_for_label, MeterMode, LIQUID_PER_BUCKET_FLOW};
use well_domain::{Node, OilRecord, OilReport, OilReportFields, PathKey, ReportKind, ReportType, Team, WaterReport};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[test]
fn test_team_matches_name_or_sequence_number() {
    let team = Node::Team(Team { id: 7, area_id: 1, seq_no: 3, name: "一队".into() });
    assert!(team.matches(&PathKey::Name("一队".into())));
    assert!(team.matches(&PathKey::Name("3".into())));
    assert!(team.matches(&PathKey::Id(7)));
    assert!(!team.matches(&PathKey::Date(day(1))));
}

#[test]
fn test_report_type_matches_label() {
    let bao = Node::ReportType(ReportType { id: 2, room_id: 1, kind: ReportKind::Oil });
    assert!(bao.matches(&PathKey::Name("油报".into())));
    assert!(bao.matches(&PathKey::Name("oil".into())));
    assert!(!bao.matches(&PathKey::Name("水报".into())));
}

#[test]
fn test_reports_match_by_date() {
    let water = Node::WaterReport(WaterReport { id: 1,
                                                well_id: 9,
                                                report_date: day(2),
                                                injection_mode: None,
                                                prod_hours: Some(24),
                                                trunk_pressure: None,
                                                oil_pressure: None,
                                                casing_pressure: None,
                                                wellhead_pressure: None,
                                                plan_inject: Some(30.0),
                                                actual_inject: None,
                                                remark: None,
                                                meter_stage1: None,
                                                meter_stage2: None,
                                                meter_stage3: None });
    assert!(water.matches(&PathKey::Date(day(2))));
    assert!(!water.matches(&PathKey::Date(day(3))));
    assert_eq!(water.natural_key(), "2024-03-02");
}

#[test]
fn test_live_record_from_stored_report() {
    let stored = OilReport { id: 4,
                             well_id: 9,
                             report_date: day(5),
                             platform: "P1".into(),
                             well_code: "X-1".into(),
                             shared_bucket: false,
                             values: [("total_bucket".to_string(), "12".to_string())].into_iter().collect() };
    let live = OilRecord::from_report(&stored);
    assert_eq!(live.get("total_bucket"), "12");
    assert!(!live.shared_bucket);
    assert_eq!(live.to_fields().shared_bucket, Some(false));
}

#[test]
fn test_partial_fields_validation() {
    let ok = OilReportFields::default().set("oil_pressure", "1.2");
    assert!(ok.validate().is_ok());
    let bad = OilReportFields::default().set("colour", "red");
    assert!(bad.validate().is_err());
}

#[test]
fn test_variant_labels_resolve_to_suffixed_targets() {
    assert_eq!(canonical_for_label("液量/斗数（60/流量计）"), Some(LIQUID_PER_BUCKET_FLOW));
    assert_eq!(MeterMode::from_time_sign("流量计").map(|m| m.target()), Some(LIQUID_PER_BUCKET_FLOW));
}
