// ankle_core/src/lib.rs

//! Forward simulation of a three-state ankle-foot model driven by functional
//! electrical stimulation.
//!
//! The state `x = (x1, x2, x3)` holds the dynamic muscle activation, the
//! ankle angle and the foot's angular velocity. An excitation series and four
//! external kinematic channels are bound to the model at construction; the
//! integrators only ever supply `(t, x)`.

pub mod error;
pub mod models;
pub mod params;
pub mod prelude;
pub mod sampler;
pub mod simulation;
pub mod types;
pub mod utils;
