// package together all of the following and re-export
// in a partially flattened structure :
// : core component traits
// : kkt solver backends
// : active set, ratio tests and solver strategies
// : user settings
// : main solver implementation

pub mod kktsolvers;
pub mod traits;

//partially flatten top level pieces

mod activeset;
mod settings;
mod solver;
mod steplength;
mod strategy;
pub use activeset::*;
pub use settings::*;
pub use solver::*;
pub use steplength::*;
pub use strategy::*;
