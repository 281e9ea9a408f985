use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use pathprune::{enumerate_paths, from_json_str, from_xml_str, measure_pruned, prune, PathSet};

fn xml_records(count: usize) -> String {
    let mut out = String::from("<records>\n");
    for i in 0..count {
        out.push_str(&format!(
            "  <record id=\"{i}\">\n    <name>item {i}</name>\n    <meta><trace>{i}</trace><host>a</host></meta>\n  </record>\n"
        ));
    }
    out.push_str("</records>");
    out
}

fn json_records(count: usize) -> String {
    let rows: Vec<String> = (0..count)
        .map(|i| format!(r#"{{"id": {i}, "name": "item {i}", "meta": {{"trace": {i}, "host": "a"}}}}"#))
        .collect();
    format!(r#"{{"records": [{}]}}"#, rows.join(","))
}

fn bench_xml(c: &mut Criterion) {
    let Ok(doc) = from_xml_str(&xml_records(500)) else {
        return;
    };
    let excluded: PathSet = ["records/record/meta".to_string()].into_iter().collect();

    c.bench_function("pathprune_xml_enumerate", |b| {
        b.iter(|| enumerate_paths(black_box(&doc)))
    });
    c.bench_function("pathprune_xml_prune", |b| {
        b.iter(|| prune(black_box(&doc), black_box(&excluded)))
    });
    c.bench_function("pathprune_xml_measure", |b| {
        b.iter(|| measure_pruned(black_box(&doc), black_box(&excluded)))
    });
}

fn bench_json(c: &mut Criterion) {
    let Ok(doc) = from_json_str(&json_records(500)) else {
        return;
    };
    let excluded: PathSet = ["records/meta".to_string()].into_iter().collect();

    c.bench_function("pathprune_json_prune", |b| {
        b.iter(|| prune(black_box(&doc), black_box(&excluded)))
    });
    c.bench_function("pathprune_json_measure", |b| {
        b.iter(|| measure_pruned(black_box(&doc), black_box(&excluded)))
    });
}

criterion_group!(benches, bench_xml, bench_json);
criterion_main!(benches);
