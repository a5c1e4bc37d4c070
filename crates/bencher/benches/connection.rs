use std::convert::Infallible;
use std::hint::black_box;
use std::sync::atomic::AtomicBool;

use bencher::request_cases;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http::StatusCode;
use micro_httpd::connection::HttpConnection;
use micro_httpd::handler::{Router, make_handler};
use micro_httpd::io::{BufferOutput, SliceInput};
use micro_httpd::protocol::{Request, Response};

const PIPELINED: usize = 16;

fn benchmark_connection(criterion: &mut Criterion) {
    let router = Router::builder()
        .default_handler(make_handler(|request: &Request| {
            Ok::<_, Infallible>(Response::make_raw(StatusCode::OK, request.body().clone()))
        }))
        .build();
    let running = AtomicBool::new(true);

    let mut group = criterion.benchmark_group("connection");
    for case in request_cases() {
        let raw = case.pipelined(PIPELINED);
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &raw, |b, raw| {
            b.iter_batched(
                || (SliceInput::new(raw.clone()), BufferOutput::new()),
                |(input, mut output)| {
                    HttpConnection::new(input, &mut output).process(&router, &running).expect("valid requests");
                    black_box(output)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(connection, benchmark_connection);
criterion_main!(connection);
