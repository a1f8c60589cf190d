//! Domain-decomposed Jacobi relaxation for the 2D steady-state heat equation.
//!
//! Layer 1: decomposition, subdomain, stencil
//! Layer 2: comm, halo, reduce, gather
//! Layer 3: solver, output

pub mod comm;
pub mod decomposition;
pub mod gather;
pub mod halo;
pub mod output;
pub mod reduce;
pub mod solver;
pub mod stencil;
pub mod subdomain;
