#![no_main]

use libfuzzer_sys::fuzz_target;
use lobby_session_sync::{SessionEvent, Topic};

fuzz_target!(|data: &[u8]| {
    // Skip the base64 stage and feed arbitrary JSON to every topic decoder.
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    for topic in Topic::ALL {
        if let Ok(event) = SessionEvent::from_topic(topic.as_str(), value.clone()) {
            let _ = event.to_string();
        }
    }
});
