#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pgmock::{EqualMatcher, QueryMatcher, RegexMatcher, strip_query};

#[derive(Debug, Arbitrary)]
struct FuzzMatchInput {
    /// Expectation text; a regex for the regex matcher
    expected: String,
    /// SQL the code under test would send
    actual: String,
}

fuzz_target!(|input: FuzzMatchInput| {
    let stripped = strip_query(&input.actual);
    assert_eq!(strip_query(&stripped), stripped);

    // Invalid patterns must surface as a mismatch, never a panic
    let _ = RegexMatcher.matches(&input.expected, &input.actual);

    if EqualMatcher.matches(&input.expected, &input.actual).is_ok() {
        assert_eq!(strip_query(&input.expected), stripped);
    }
    assert!(EqualMatcher.matches(&input.actual, &input.actual).is_ok());
});
