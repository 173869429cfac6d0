use criterion::{black_box, criterion_group, criterion_main, Criterion};

use thunder_muscle::filter::FilterSpec;
use thunder_muscle::model::address::extract_domain;
use thunder_muscle::model::record::{EmailRecord, RawMessage};
use thunder_muscle::search::ContentQuery;

fn synthetic_dataset(n: usize) -> Vec<EmailRecord> {
    let domains = ["shop.edu", "cs.stanford.edu", "mail.example.com", "news.org"];
    (0..n)
        .map(|i| {
            EmailRecord::from_raw(RawMessage {
                message_id: Some(format!("{i}@bench")),
                date: Some(format!("20{:02}-0{}-15 12:00:00", 10 + i % 14, 1 + i % 9)),
                from: Some(format!("Sender {i} <user{i}@{}>", domains[i % domains.len()])),
                subject: Some(format!("Message number {i}")),
                body: Some(if i % 3 == 0 {
                    "Click to unsubscribe".to_string()
                } else {
                    String::new()
                }),
                ..Default::default()
            })
        })
        .collect()
}

fn bench_extract_domain(c: &mut Criterion) {
    c.bench_function("extract_domain", |b| {
        b.iter(|| {
            extract_domain(black_box("\"Doe, Jane\" <Jane.Doe@Mail.Example.COM>"));
            extract_domain(black_box("bare.user@example.org"));
            extract_domain(black_box("not an address"));
        })
    });
}

fn bench_filter_apply(c: &mut Criterion) {
    let records = synthetic_dataset(10_000);
    let spec = FilterSpec::new()
        .domain(Some("*.edu".to_string()))
        .year(Some("2015".to_string()))
        .has_body(true);

    c.bench_function("filter_wildcard_10k", |b| {
        b.iter(|| spec.apply(black_box(&records)))
    });
}

fn bench_content_query(c: &mut Criterion) {
    let records = synthetic_dataset(10_000);
    let query = ContentQuery::new("unsubscribe", false).unwrap();

    c.bench_function("query_unsubscribe_10k", |b| {
        b.iter(|| query.report(black_box(&records)))
    });
}

criterion_group!(
    benches,
    bench_extract_domain,
    bench_filter_apply,
    bench_content_query
);
criterion_main!(benches);
