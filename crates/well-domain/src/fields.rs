//! Catálogo de campos del reporte de petróleo y tabla de etiquetas.
//!
//! La tabla `LABELS` es versionada con el código: mapea la etiqueta que
//! escriben los operadores en las fórmulas al identificador canónico del
//! campo. Cambiarla altera el significado de las fórmulas almacenadas.
use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Campos de entrada capturados en campo.
pub const OIL_INPUT_FIELDS: &[&str] = &["oil_pressure",
                                         "casing_pressure",
                                         "back_pressure",
                                         "time_sign",
                                         "total_bucket",
                                         "press_data",
                                         "prod_hours",
                                         "a2_stroke",
                                         "a2_frequency",
                                         "work_stroke",
                                         "effective_stroke",
                                         "fill_coeff_test",
                                         "lab_water_cut",
                                         "reported_water",
                                         "fill_coeff_liquid",
                                         "last_tubing_time",
                                         "pump_diameter",
                                         "block",
                                         "transformer",
                                         "remark",
                                         "well_times"];

/// Campos calculados por el motor a partir de las fórmulas.
pub const OIL_DERIVED_FIELDS: &[&str] = &["liquid_per_bucket",
                                           "sum_value",
                                           "liquid1",
                                           "production_coeff",
                                           "a2_24h_liquid",
                                           "liquid2",
                                           "oil_volume",
                                           "fluctuation_range",
                                           "shutdown_time",
                                           "theory_diff",
                                           "theory_displacement",
                                           "k_value",
                                           "daily_liquid",
                                           "daily_oil",
                                           "production_time",
                                           "total_oil"];

/// Campo del volumen compartido entre pozos hermanos.
pub const BUCKET_FIELD: &str = "total_bucket";
/// Campo que selecciona la variante de líquido por cubeta.
pub const TIME_SIGN_FIELD: &str = "time_sign";
/// Destino común de las dos variantes.
pub const LIQUID_PER_BUCKET: &str = "liquid_per_bucket";
/// Variante por carta dinamométrica (功图).
pub const LIQUID_PER_BUCKET_GAUGE: &str = "liquid_per_bucket_gauge";
/// Variante por caudalímetro (60 / 流量计).
pub const LIQUID_PER_BUCKET_FLOW: &str = "liquid_per_bucket_flow";

/// Etiqueta humana → identificador canónico.
pub const LABELS: &[(&str, &str)] = &[("油压", "oil_pressure"),
                                      ("套压", "casing_pressure"),
                                      ("回压", "back_pressure"),
                                      ("合量斗数", "total_bucket"),
                                      ("时间标记", "time_sign"),
                                      ("憋压数据", "press_data"),
                                      ("生产时间", "prod_hours"),
                                      ("A2冲程", "a2_stroke"),
                                      ("A2冲次", "a2_frequency"),
                                      ("功图冲次", "work_stroke"),
                                      ("有效排液冲程", "effective_stroke"),
                                      ("充满系数", "fill_coeff_test"),
                                      ("化验含水", "lab_water_cut"),
                                      ("上报含水", "reported_water"),
                                      ("充满系数液量", "fill_coeff_liquid"),
                                      ("上次动管柱时间", "last_tubing_time"),
                                      ("泵径", "pump_diameter"),
                                      ("区块", "block"),
                                      ("变压器", "transformer"),
                                      ("备注", "remark"),
                                      ("井次", "well_times"),
                                      ("液量/斗数", "liquid_per_bucket"),
                                      ("液量/斗数（功图）", "liquid_per_bucket_gauge"),
                                      ("液量/斗数（60/流量计）", "liquid_per_bucket_flow"),
                                      ("和", "sum_value"),
                                      ("液量", "liquid1"),
                                      ("生产系数", "production_coeff"),
                                      ("分产系数", "production_coeff"),
                                      ("A2 24h液量", "a2_24h_liquid"),
                                      ("A2(24h)液量", "a2_24h_liquid"),
                                      ("液量（资料员）", "liquid2"),
                                      ("油量", "oil_volume"),
                                      ("波动范围", "fluctuation_range"),
                                      ("停产时间", "shutdown_time"),
                                      ("理论排量-液量差值", "theory_diff"),
                                      ("理论排量", "theory_displacement"),
                                      ("K值", "k_value"),
                                      ("日产液", "daily_liquid"),
                                      ("日产油", "daily_oil"),
                                      ("时间", "production_time"),
                                      ("产油", "total_oil")];

static LABEL_INDEX: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| LABELS.iter().copied().collect());

/// Etiquetas ordenadas de mayor a menor longitud (en caracteres), para que
/// la sustitución pruebe primero la coincidencia más larga.
pub static LABELS_LONGEST_FIRST: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    let mut v: Vec<(&'static str, &'static str)> = LABELS.to_vec();
    v.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()).then_with(|| a.0.cmp(b.0)));
    v
});

/// Busca el identificador canónico de una etiqueta.
pub fn canonical_for_label(label: &str) -> Option<&'static str> {
    LABEL_INDEX.get(label).copied()
}

pub fn is_input_field(name: &str) -> bool {
    OIL_INPUT_FIELDS.contains(&name)
}

pub fn is_derived_field(name: &str) -> bool {
    OIL_DERIVED_FIELDS.contains(&name)
}

/// Campo almacenable en un reporte de petróleo (entrada o calculado).
pub fn is_oil_field(name: &str) -> bool {
    is_input_field(name) || is_derived_field(name)
}

/// Modo de medición indicado por `time_sign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterMode {
    GaugeCard,
    FlowMeter,
}

impl MeterMode {
    /// `None` si la marca no selecciona ninguna variante.
    pub fn from_time_sign(value: &str) -> Option<Self> {
        match value.trim() {
            "功图" | "gauge" => Some(MeterMode::GaugeCard),
            "60" | "流量计" | "flow" => Some(MeterMode::FlowMeter),
            _ => None,
        }
    }

    /// Destino sufijado que contiene la fórmula de esta variante.
    pub fn target(&self) -> &'static str {
        match self {
            MeterMode::GaugeCard => LIQUID_PER_BUCKET_GAUGE,
            MeterMode::FlowMeter => LIQUID_PER_BUCKET_FLOW,
        }
    }
}

/// Destinos que pertenecen a la familia de líquido por cubeta.
pub fn is_bucket_variant_target(target: &str) -> bool {
    target == LIQUID_PER_BUCKET || target == LIQUID_PER_BUCKET_GAUGE || target == LIQUID_PER_BUCKET_FLOW
}
