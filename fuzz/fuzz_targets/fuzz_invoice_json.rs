#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must not panic: errors are fine, panics are bugs.
    let Ok(invoice) = serde_json::from_slice::<tally::Invoice>(data) else {
        return;
    };
    let Some(now) = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single() else {
        return;
    };

    let _ = tally::compute_totals(&invoice.line_items);
    let _ = tally::verify_totals(&invoice);
    let _ = tally::derive_status(&invoice, &invoice.payments, now);
    let _ = tally::payment_summary(&invoice);
    let _ = tally::ReminderSettings::default().schedule(invoice.due_date);
});
