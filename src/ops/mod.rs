//! # Numeric Kernels
//!
//! Dense CPU kernels shared by the layers: matrix products in the three
//! transpose arrangements backpropagation needs, the ReLU mask and reductions.
//!
//! ## Submodules
//!
//! - [`cpu`]: Multi-threaded CPU operations built on `rayon`
//!
//! ## Notes
//!
//! - Kernels assert their shape preconditions and panic on violation; the
//!   layers in [`crate::layers`] validate user-facing shapes and return
//!   [`crate::error::NetError`] before reaching them
//! - Every output element is written by exactly one task, so results do not
//!   depend on thread scheduling

pub mod cpu;
