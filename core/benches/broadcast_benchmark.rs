use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rootcast::array::{DistributedMatrix, DistributedVector};
use rootcast::distributed::backend::SingleProcess;
use rootcast::distributed::config::GroupConfig;
use rootcast::distributed::cpu_backend::RingBackend;
use rootcast::distributed::payload::Payload;
use std::thread;
use std::time::{Duration, Instant};

fn benchmark_point_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_write");

    // Sequential fallback: no group, plain local write.
    let mut local = DistributedMatrix::<f64, _>::zeros([64, 64], SingleProcess);
    group.bench_function("single_process_64x64", |b| {
        b.iter(|| {
            local.set(black_box([17, 3]), black_box(1.0)).unwrap();
        })
    });

    // One thread per rank; only root's side is timed.
    for world_size in [2usize, 4] {
        group.bench_function(format!("ring_{world_size}_ranks"), |b| {
            b.iter_custom(|iters| {
                let mut ranks = RingBackend::group(&GroupConfig::new(world_size)).unwrap();
                let root = ranks.remove(0);

                let peers: Vec<_> = ranks
                    .into_iter()
                    .map(|backend| {
                        thread::spawn(move || {
                            let mut m = DistributedMatrix::<f64, _>::zeros([64, 64], backend);
                            for _ in 0..iters {
                                m.set([17, 3], -1.0).unwrap();
                            }
                        })
                    })
                    .collect();

                let mut m = DistributedMatrix::<f64, _>::zeros([64, 64], root);
                let start = Instant::now();
                for i in 0..iters {
                    m.set([17, 3], i as f64).unwrap();
                }
                let elapsed: Duration = start.elapsed();

                for peer in peers {
                    peer.join().unwrap();
                }
                elapsed
            })
        });
    }

    group.finish();
}

fn benchmark_reads(c: &mut Criterion) {
    let m = DistributedMatrix::<f32, _>::ones([128, 128], SingleProcess);
    c.bench_function("read_sum_128x128", |b| {
        b.iter(|| black_box(m.iter().sum::<f32>()))
    });
}

fn benchmark_nested_payload(c: &mut Criterion) {
    let row = DistributedVector::<f32, _>::ones([256], SingleProcess);
    let grid = DistributedVector::build(row, [32], SingleProcess);
    c.bench_function("encode_nested_32x256", |b| {
        b.iter(|| black_box(grid.encode().unwrap()))
    });
}

criterion_group!(
    benches,
    benchmark_point_write,
    benchmark_reads,
    benchmark_nested_payload
);
criterion_main!(benches);
