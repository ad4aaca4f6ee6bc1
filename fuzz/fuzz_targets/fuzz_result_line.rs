#![no_main]

use hr_conformance::{TrialVerdict, parse_result_line, verify_result};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    let record = parse_result_line(line);
    let leading = record.entries().map_while(Result::ok).collect::<Vec<_>>();
    for entry in leading {
        let verdict = verify_result(&record, entry.type_id, true).expect("present type");
        assert_eq!(verdict, TrialVerdict::Pass);
    }
});
