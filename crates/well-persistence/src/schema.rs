//! Esquema Diesel (escrito a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    areas (id) {
        id -> BigInt,
        name -> Text,
    }
}

diesel::table! {
    teams (id) {
        id -> BigInt,
        area_id -> BigInt,
        seq_no -> Integer,
        name -> Text,
    }
}

diesel::table! {
    rooms (id) {
        id -> BigInt,
        team_id -> BigInt,
        code -> Text,
        is_injection -> Bool,
    }
}

diesel::table! {
    report_types (id) {
        id -> BigInt,
        room_id -> BigInt,
        kind -> Text,
    }
}

diesel::table! {
    platforms (id) {
        id -> BigInt,
        report_type_id -> BigInt,
        label -> Text,
    }
}

diesel::table! {
    wells (id) {
        id -> BigInt,
        room_id -> BigInt,
        report_type_id -> BigInt,
        platform_id -> Nullable<BigInt>,
        code -> Text,
    }
}

diesel::table! {
    water_reports (id) {
        id -> BigInt,
        well_id -> BigInt,
        report_date -> Date,
        injection_mode -> Nullable<Text>,
        prod_hours -> Nullable<Integer>,
        trunk_pressure -> Nullable<Double>,
        oil_pressure -> Nullable<Double>,
        casing_pressure -> Nullable<Double>,
        wellhead_pressure -> Nullable<Double>,
        plan_inject -> Nullable<Double>,
        actual_inject -> Nullable<Double>,
        remark -> Nullable<Text>,
        meter_stage1 -> Nullable<Double>,
        meter_stage2 -> Nullable<Double>,
        meter_stage3 -> Nullable<Double>,
    }
}

diesel::table! {
    oil_reports (id) {
        id -> BigInt,
        well_id -> BigInt,
        report_date -> Date,
        platform -> Text,
        well_code -> Text,
        total_bucket_sign -> Text,
        fields -> Text,
    }
}

diesel::table! {
    formula_definitions (id) {
        id -> BigInt,
        formula -> Text,
    }
}

diesel::joinable!(teams -> areas (area_id));
diesel::joinable!(rooms -> teams (team_id));
diesel::joinable!(report_types -> rooms (room_id));
diesel::joinable!(platforms -> report_types (report_type_id));
diesel::joinable!(water_reports -> wells (well_id));
diesel::joinable!(oil_reports -> wells (well_id));

diesel::allow_tables_to_appear_in_same_query!(
    areas,
    teams,
    rooms,
    report_types,
    platforms,
    wells,
    water_reports,
    oil_reports,
    formula_definitions,
);
