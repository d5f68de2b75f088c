//! Fuzz target: `KeyMap::parse`
//!
//! Feeds arbitrary (lossily decoded) documents into the parser and checks
//! that it never panics and that serializing the result reparses to the
//! same map.
//!
//! cargo fuzz run fuzz_keymap_parse

#![no_main]

use irblaster::keymap::KeyMap;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let map = KeyMap::parse(&text);

    for key in map.keys() {
        assert!(key.starts_with('/') || key.starts_with('@'), "section without sigil");
    }
    assert_eq!(KeyMap::parse(&map.serialize()), map);
});
