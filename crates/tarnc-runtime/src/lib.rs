//! Tarn Runtime Library
//!
//! Native support code linked into every compiled Tarn program:
//! - GC block allocation and collection control (via TGC)
//! - Integer I/O and abnormal termination primitives
//!
//! Every exported symbol carries the `tarn_` prefix. Bare `read`, `write`,
//! and `abort` are libc exports; a staticlib redefining them would
//! interpose on every other object in the final link.

mod gc;
mod io;

pub use gc::*;
pub use io::*;
