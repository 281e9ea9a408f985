#![no_main]
use libfuzzer_sys::fuzz_target;
use pathprune::{enumerate_paths, measure, prune, Document, Format, PathSet};

fuzz_target!(|data: &[u8]| {
    for format in [Format::Xml, Format::Json] {
        let Ok(doc) = Document::parse(data, format) else {
            continue;
        };
        let excluded: PathSet = enumerate_paths(&doc).into_iter().step_by(2).collect();
        let pruned = prune(&doc, &excluded);
        if let (Ok(before), Ok(after)) = (measure(&doc), measure(&pruned)) {
            assert!(after <= before);
        }
    }
});
