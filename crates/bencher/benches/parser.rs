use std::hint::black_box;
use std::ops::ControlFlow;

use bencher::{TestCase, TestFile};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use micro_http_parser::codec::ResponseParser;
use micro_http_parser::protocol::{Feed, Observer};

static SMALL: TestFile = TestFile::new("small.txt", include_bytes!("../resources/response/small.txt"));
static CHUNKED: TestFile = TestFile::new("chunked.txt", include_bytes!("../resources/response/chunked.txt"));
static LARGE: TestFile = TestFile::new("large.txt", include_bytes!("../resources/response/large.txt"));

/// Counts what it sees, so the work can not be optimized away.
#[derive(Debug, Default)]
struct Counter {
    headers: usize,
    body_bytes: usize,
    messages: usize,
}

impl Observer for Counter {
    fn on_header_value(&mut self, _value: &[u8]) -> ControlFlow<()> {
        self.headers += 1;
        ControlFlow::Continue(())
    }

    fn on_body(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        self.body_bytes += chunk.len();
        ControlFlow::Continue(())
    }

    fn on_message_complete(&mut self) -> ControlFlow<()> {
        self.messages += 1;
        ControlFlow::Continue(())
    }
}

fn create_test_cases() -> Vec<TestCase> {
    let mut cases = Vec::new();
    for (name, file) in [("small", SMALL), ("chunked", CHUNKED), ("large", LARGE)] {
        cases.push(TestCase::small(name, file));
        cases.push(TestCase::normal(name, file));
        cases.push(TestCase::large(name, file));
    }
    cases
}

fn feed_all(parser: &mut ResponseParser, input: &[u8], read_size: Option<usize>, counter: &mut Counter) {
    let read_size = read_size.unwrap_or(input.len()).max(1);
    for read in input.chunks(read_size) {
        let feed = parser.feed(read, counter).expect("fixture should be a valid http response");
        debug_assert!(matches!(feed, Feed::Consumed(n) if n == read.len()));
    }
}

fn benchmark_response_parser(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("response_parser");

    for case in create_test_cases() {
        let read_size = case.group().read_size();
        let id = format!("{}/{}", case.name(), read_size.map_or("whole".to_string(), |size| size.to_string()));

        group.throughput(Throughput::Bytes(case.file().content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(id), &case, |b, case| {
            b.iter_batched_ref(
                || (ResponseParser::new(), Counter::default()),
                |(parser, counter)| {
                    feed_all(parser, case.file().content(), read_size, counter);
                    black_box(counter.messages);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_pipelined(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("pipelined_responses");

    for file in [SMALL, CHUNKED] {
        let input = file.pipelined(64);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(file.file_name()), &input, |b, input| {
            b.iter_batched_ref(
                || (ResponseParser::new(), Counter::default()),
                |(parser, counter)| {
                    feed_all(parser, input, Some(4096), counter);
                    assert_eq!(counter.messages, 64);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(parser, benchmark_response_parser, benchmark_pipelined);
criterion_main!(parser);
