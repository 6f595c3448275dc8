//! GC entry points - C FFI wrapper around TGC
//!
//! Collector state lives in one process-wide [`tgc::Runtime`], created
//! lazily on the first entry point touched (generated code never calls an
//! init symbol). Callers are compiled Tarn functions, so every frame above
//! an entry point carries a layout word; the automatic trigger and
//! `tarn_enforce_gc` both walk that chain starting at the caller.
//!
//! Generated code has no error path: any failure crossing this boundary
//! is reported on stderr and terminates the process.

use std::sync::OnceLock;

use tgc::Runtime;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Process-wide runtime, configured from `TGC_*` environment on first use.
///
/// Public for host tooling and tests; generated code only ever goes
/// through the `tarn_*` exports below.
pub fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(tgc::init)
}

fn fatal(err: tgc::TgcError) -> ! {
    use std::io::Write;
    let _ = std::io::stdout().flush();
    eprintln!("tarn runtime: {err}");
    std::process::abort();
}

/// Allocates a zero-filled block of `size` bytes preceded by its size
/// header. May first run a collection rooted at the caller's frame.
#[no_mangle]
pub extern "C" fn tarn_allocate(size: i64) -> *mut std::ffi::c_void {
    let frame = tgc::caller_frame();
    if size < 0 {
        fatal(tgc::TgcError::InvalidArgument(format!(
            "negative allocation size {size}"
        )));
    }
    match unsafe { runtime().allocate(size as usize, frame) } {
        Ok(base) => base as *mut std::ffi::c_void,
        Err(err) => fatal(err),
    }
}

#[no_mangle]
pub extern "C" fn tarn_enable_gc() {
    runtime().enable_gc();
}

/// Suspends the automatic trigger. Allocation keeps registering blocks;
/// `tarn_enforce_gc` still collects.
#[no_mangle]
pub extern "C" fn tarn_disable_gc() {
    runtime().disable_gc();
}

/// Runs a full collection rooted at the caller's frame, enabled or not.
/// Returns the number of blocks still registered after the sweep.
#[no_mangle]
pub extern "C" fn tarn_enforce_gc() -> i64 {
    let frame = tgc::caller_frame();
    unsafe { runtime().enforce_gc(frame) as i64 }
}

/// Returns an address near the current stack position. Debug aid only;
/// the value must not be dereferenced.
#[no_mangle]
pub extern "C" fn tarn_get_stack_top() -> *mut std::ffi::c_void {
    let mut marker: usize = 0;
    let slot = std::ptr::addr_of_mut!(marker);
    // Volatile keeps the marker in a real stack slot.
    unsafe { std::ptr::write_volatile(slot, 1) };
    slot as *mut std::ffi::c_void
}
