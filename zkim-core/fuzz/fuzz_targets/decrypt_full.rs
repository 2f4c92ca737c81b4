#![no_main]

use libfuzzer_sys::fuzz_target;

const USER_KEY_MATERIAL: &[u8] = b"fuzz-target-fixed-user-key-material";

fuzz_target!(|data: &[u8]| {
    let container = match zkim_core::wire::decode(data) {
        Ok(c) => c,
        Err(_) => return,
    };

    let _ = zkim_core::engine::decrypt_container(&container, USER_KEY_MATERIAL, None);
});
