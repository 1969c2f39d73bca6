pub mod language;
pub mod report;

pub use language::Language;
pub use report::{BulletPair, CheckStatus, Fix, Report, RoleMatch};
