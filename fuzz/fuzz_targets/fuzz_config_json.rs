#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = tally::ReconcileConfig::from_json(s);
        let _ = serde_json::from_str::<tally::gateway::GatewayCredentials>(s)
            .map(|creds| creds.validate());
    }
});
