use std::hint::black_box;

use bencher::request_cases;
use bytes::BytesMut;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_httpd::codec::RequestDecoder;
use micro_httpd::protocol::{Message, PayloadItem};
use tokio_util::codec::Decoder;

fn benchmark_request_decoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_decoder");

    for case in request_cases() {
        group.throughput(Throughput::Bytes(case.file().content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            let mut request_decoder = RequestDecoder::new();
            b.iter_batched_ref(
                || BytesMut::from(case.file().content()),
                |bytes_mut| {
                    let header = request_decoder.decode(bytes_mut).expect("input should be valid http request header");
                    let mut body_size = 0;
                    loop {
                        match request_decoder.decode(bytes_mut).expect("input should be valid http request body") {
                            Some(Message::Payload(PayloadItem::Chunk(bytes))) => body_size += bytes.len(),
                            Some(Message::Payload(PayloadItem::Eof)) => break,
                            other => panic!("unexpected frame {other:?}"),
                        }
                    }
                    black_box((header, body_size));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(decoder, benchmark_request_decoder);
criterion_main!(decoder);
