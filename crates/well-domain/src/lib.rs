// well-domain library entry point
pub mod error;
pub mod fields;
pub mod formula;
pub mod hierarchy;
pub mod reports;
pub use error::DomainError;
pub use formula::{split_definition, FormulaDefinition};
pub use hierarchy::{Area, Level, Node, NodeKey, PathKey, Platform, ReportKind, ReportType, Room, Team, Well, WellOwner};
pub use reports::{OilRecord, OilReport, OilReportFields, ReportFields, WaterReport, WaterReportFields};
