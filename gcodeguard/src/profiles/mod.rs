//! Material Profiles and Safe Ranges
//!
//! Static configuration consulted by the validator and the recommendation
//! generator. Stock profiles are embedded JSON; a directory of JSON files
//! can overlay or extend them.
//!
//! | Material | Nozzle min | Nozzle max | Bed |
//! |----------|-----------:|-----------:|----:|
//! | PLA      | 190        | 215        | 50  |
//! | PETG     | 230        | 250        | 70  |
//! | ABS      | 240        | 260        | 100 |
//! | TPU      | 220        | 240        | 50  |
//! | ASA      | 250        | 270        | 100 |

pub mod builtin;
pub mod registry;
pub mod schema;

// Re-exports for convenience
pub use registry::ProfileRegistry;
pub use schema::*;
