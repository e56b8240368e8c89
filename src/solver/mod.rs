// Solver adapters: concrete implementations of SolverBackend

pub mod skeleton;

#[cfg(feature = "cbc")]
pub mod coin_cbc_solver;
#[cfg(feature = "highs")]
pub mod highs_solver;

pub use skeleton::{SkeletonBackend, SkeletonModel};

#[cfg(feature = "cbc")]
pub use coin_cbc_solver::{CbcBackend, CbcModel};
#[cfg(feature = "highs")]
pub use highs_solver::{HighsBackend, HighsModel};
