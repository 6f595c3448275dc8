//! Integer I/O and abnormal termination for compiled Tarn programs.
//!
//! `tarn_read` follows `scanf("%lld")`: skip leading whitespace, accept an
//! optional sign and at least one decimal digit, accumulate with wrapping
//! arithmetic, and push the first non-digit byte back for the next call.
//! Absence of any digit, including immediate end of input, is fatal.

use std::io::{self, Read, Write};
use std::sync::Mutex;

/// One byte of lookahead shared by successive `tarn_read` calls, the
/// single-byte `ungetc` the scan needs.
static PUSHBACK: Mutex<Option<u8>> = Mutex::new(None);

// isspace(3) in the C locale; is_ascii_whitespace omits vertical tab.
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn next_byte(input: &mut impl Read, pushback: &mut Option<u8>) -> Option<u8> {
    if let Some(byte) = pushback.take() {
        return Some(byte);
    }
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return None,
            Ok(_) => return Some(buf[0]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return None,
        }
    }
}

/// One `%lld` conversion over `input`. `None` when no digit could be read;
/// the byte that ended the conversion is left in `pushback`.
fn scan_i64(input: &mut impl Read, pushback: &mut Option<u8>) -> Option<i64> {
    let mut byte = next_byte(input, pushback)?;
    while is_space(byte) {
        byte = next_byte(input, pushback)?;
    }

    let negative = match byte {
        b'-' => {
            byte = next_byte(input, pushback)?;
            true
        }
        b'+' => {
            byte = next_byte(input, pushback)?;
            false
        }
        _ => false,
    };

    if !byte.is_ascii_digit() {
        *pushback = Some(byte);
        return None;
    }

    // Accumulate toward the sign so i64::MIN parses without overflow.
    let mut value: i64 = 0;
    let mut current = Some(byte);
    while let Some(digit) = current {
        if !digit.is_ascii_digit() {
            *pushback = Some(digit);
            break;
        }
        let unit = i64::from(digit - b'0');
        value = value
            .wrapping_mul(10)
            .wrapping_add(if negative { -unit } else { unit });
        current = next_byte(input, pushback);
    }
    Some(value)
}

/// Reads one signed 64-bit integer from standard input. A failed
/// conversion reports on stderr and terminates via [`tarn_abort`].
#[no_mangle]
pub extern "C" fn tarn_read() -> i64 {
    let mut pushback = PUSHBACK.lock().unwrap_or_else(|e| e.into_inner());
    let mut stdin = io::stdin().lock();
    match scan_i64(&mut stdin, &mut pushback) {
        Some(value) => value,
        None => {
            eprintln!("unexpected end of input");
            tarn_abort()
        }
    }
}

/// Writes the decimal representation of `value` and a newline to
/// standard output.
#[no_mangle]
pub extern "C" fn tarn_write(value: i64) {
    println!("{value}");
}

/// Flushes standard output, reports on stderr, and terminates the
/// process abnormally.
#[no_mangle]
pub extern "C" fn tarn_abort() -> ! {
    let _ = io::stdout().flush();
    eprintln!("abort");
    std::process::abort();
}
