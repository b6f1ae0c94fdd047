#![no_main]

use libfuzzer_sys::fuzz_target;
use lobby_session_sync::codec::decode_payload;
use lobby_session_sync::envelope::decode_frame;
use lobby_session_sync::SessionEvent;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Frames come straight off the wire: every stage must fail cleanly.
    let Ok(envelope) = decode_frame(text) else {
        return;
    };
    if let (Some(topic), Some(payload)) = (envelope.topic, envelope.payload) {
        if let Ok(value) = decode_payload(&payload) {
            let _ = SessionEvent::from_topic(&topic, value);
        }
    }
});
