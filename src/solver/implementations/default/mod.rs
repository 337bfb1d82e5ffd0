#![allow(non_snake_case)]

mod equilibration;
mod info;
mod info_print;
mod kktsystem;
mod problemdata;
mod residuals;
mod settings;
mod solution;
mod solver;
mod variables;

#[cfg(feature = "serde")]
mod json;

//export flattened
pub use equilibration::*;
pub use info::*;
pub use kktsystem::*;
pub use problemdata::*;
pub use residuals::*;
pub use settings::*;
pub use solution::*;
pub use solver::*;
pub use variables::*;

#[cfg(feature = "serde")]
pub use json::*;
