#![no_main]

use cilheaps::prelude::*;
use libfuzzer_sys::fuzz_target;

// Splits the input into chunks and feeds each chunk to one of the heaps, selected by its
// first byte. Every handle must resolve and every emitted heap must stay aligned.
fuzz_target!(|data: &[u8]| {
    let mut builder = MetadataHeapsBuilder::new();
    let mut strings = Vec::new();

    for chunk in data.split(|&b| b == 0xFF) {
        let Some((&selector, payload)) = chunk.split_first() else {
            continue;
        };

        let result = match selector % 4 {
            0 => {
                let units: Vec<u16> = payload
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                builder
                    .get_or_add_string_utf16(widestring::U16Str::from_slice(&units))
                    .map(|handle| strings.push(handle))
            }
            1 => builder
                .get_or_add_user_string(&String::from_utf8_lossy(payload))
                .map(drop),
            2 => builder.get_or_add_blob(payload).map(drop),
            _ => {
                let mut bytes = [0u8; GUID_SIZE];
                let len = payload.len().min(GUID_SIZE);
                bytes[..len].copy_from_slice(&payload[..len]);
                builder.get_or_add_guid(uguid::Guid::from_bytes(bytes)).map(drop)
            }
        };

        if result.is_err() {
            return;
        }
    }

    let Ok(sealed) = builder.finalize() else {
        return;
    };
    let sizes = sealed.heap_sizes();
    for handle in strings {
        let offset = sealed.string_offset(handle).unwrap();
        assert!((offset as usize) < sizes.string);
    }

    let heaps = sealed.write_heaps().unwrap();
    assert_eq!(heaps.data().len(), sizes.total_aligned());
    for stream in heaps.streams() {
        assert_eq!(stream.size % 4, 0);
    }
});
