use std::hint::black_box;

use bytes::Bytes;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_http_pipeline::assembler::MessageParser;

const SMALL_REQUEST: &str = "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";

const LARGE_REQUEST: &str = "GET /api/v1/items?page=2&sort=desc HTTP/1.1\r\n\
Host: localhost:8080\r\n\
User-Agent: Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36\r\n\
Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8\r\n\
Accept-Language: en-US,en;q=0.9\r\n\
Accept-Encoding: gzip, deflate, br\r\n\
Cache-Control: max-age=0\r\n\
Connection: keep-alive\r\n\
Cookie: session=3f2a9c1d; theme=dark; lang=en\r\n\
\r\n";

const POST_REQUEST: &str = "POST /submit HTTP/1.1\r\nHost: localhost\r\nContent-Length: 26\r\n\r\nabcdefghijklmnopqrstuvwxyz";

const CHUNKED_REQUEST: &str =
    "POST /stream HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n8\r\nabcdefgh\r\n8\r\nijklmnop\r\na\r\nqrstuvwxyz\r\n0\r\n\r\n";

fn pipelined(request: &str, count: usize) -> Bytes {
    Bytes::from(request.repeat(count))
}

fn test_cases() -> Vec<(&'static str, Bytes)> {
    vec![
        ("small_x16", pipelined(SMALL_REQUEST, 16)),
        ("large_x16", pipelined(LARGE_REQUEST, 16)),
        ("post_x16", pipelined(POST_REQUEST, 16)),
        ("chunked_x16", pipelined(CHUNKED_REQUEST, 16)),
    ]
}

fn benchmark_pipelined_chunk(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("pipelined_chunk");

    for (name, input) in test_cases() {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, input| {
            b.iter_batched_ref(
                MessageParser::new,
                |parser| {
                    let messages = parser.execute(input.clone()).expect("input should be valid pipelined requests");
                    black_box(messages);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_split_chunks(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("split_chunks");

    for (name, input) in test_cases() {
        for chunk_size in [7, 64, 512] {
            group.throughput(Throughput::Bytes(input.len() as u64));
            group.bench_with_input(BenchmarkId::new(name, chunk_size), &input, |b, input| {
                b.iter_batched_ref(
                    MessageParser::new,
                    |parser| {
                        let mut count = 0;
                        let mut offset = 0;
                        while offset < input.len() {
                            let end = (offset + chunk_size).min(input.len());
                            count += parser.execute(input.slice(offset..end)).expect("input should be valid pipelined requests").len();
                            offset = end;
                        }
                        black_box(count);
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(pipeline, benchmark_pipelined_chunk, benchmark_split_chunks);
criterion_main!(pipeline);
