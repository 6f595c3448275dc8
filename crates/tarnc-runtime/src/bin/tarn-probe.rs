//! Drives the exported C surface from a real process so the I/O and
//! termination contracts can be asserted on captured stdout, stderr, and
//! exit status. One probe mode per invocation, selected by argv[1].

use anyhow::{bail, Result};
use tarnc_runtime::{
    runtime, tarn_abort, tarn_allocate, tarn_disable_gc, tarn_get_stack_top, tarn_read,
    tarn_write,
};

fn main() -> Result<()> {
    let mode = std::env::args().nth(1).unwrap_or_default();
    match mode.as_str() {
        "write" => {
            tarn_write(42);
            tarn_write(-7);
        }
        "echo" => {
            // First value is the count of values that follow.
            let count = tarn_read();
            for _ in 0..count {
                tarn_write(tarn_read());
            }
        }
        "read-eof" => {
            tarn_write(tarn_read());
        }
        "abort" => {
            // The 1 must reach stdout: abort flushes before dying.
            tarn_write(1);
            tarn_abort();
        }
        "alloc" => {
            // This main is a Rust frame with no layout word above it;
            // the automatic trigger stays off for the whole run.
            tarn_disable_gc();
            let base = tarn_allocate(32) as usize;
            let header = unsafe { std::ptr::read((base - 8) as *const i64) };
            tarn_write(header);
            let payload = unsafe { std::slice::from_raw_parts(base as *const u8, 32) };
            tarn_write(i64::from(payload.iter().all(|&byte| byte == 0)));
            tarn_write(i64::from(runtime().is_registered(base)));
        }
        "stack-top" => {
            tarn_write(i64::from(!tarn_get_stack_top().is_null()));
        }
        other => bail!("unknown probe mode: {other:?}"),
    }
    Ok(())
}
