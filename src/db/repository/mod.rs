mod biomarker;
mod profile;
mod user;

pub use biomarker::*;
pub use profile::*;
pub use user::*;
