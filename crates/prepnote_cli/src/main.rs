//! CLI smoke entry point.
//!
//! Prints core linkage info and runs one codec round trip so the
//! crypto stack can be checked without the Flutter runtime.

use prepnote_core::{KdfParams, SecureContentCodec};

fn main() {
    println!("prepnote_core ping={}", prepnote_core::ping());
    println!("prepnote_core version={}", prepnote_core::core_version());

    let codec = SecureContentCodec::new(KdfParams::default());
    let status = match codec
        .encrypt("probe", "probe-password")
        .and_then(|sealed| codec.decrypt(&sealed, "probe-password"))
    {
        Ok(text) if text == "probe" => "ok",
        Ok(_) => "mismatch",
        Err(_) => "error",
    };
    println!("prepnote_core codec={status}");
}
