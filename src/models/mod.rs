pub mod analysis;
pub mod biomarker;
pub mod enums;
pub mod profile;
pub mod user;

pub use analysis::*;
pub use biomarker::*;
pub use profile::*;
pub use user::*;
