#![no_main]
use libfuzzer_sys::fuzz_target;
use pathprune::xml::Parser;

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = Parser::new(data).parse() {
        let written = pathprune::xml::to_bytes(&doc);
        // re-parsing our own output must succeed
        assert!(Parser::new(&written).parse().is_ok());
    }
});
