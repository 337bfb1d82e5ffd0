//flatten direct KKT module structure
mod datamap;
mod directldlkktsolver;
mod kkt_assembly;
use datamap::*;
pub use directldlkktsolver::*;
use kkt_assembly::*;
