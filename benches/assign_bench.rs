use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use modid::config::DigestEncoding;
use modid::context::ResolutionContext;
use modid::hash::Algorithm;
use modid::identity::IdentityDeriver;
use modid::manifest::MemoryManifestReader;
use modid::{AssignmentRun, SourceModule};
use std::path::Path;

// Batch assignment over a synthetic project of mixed sources and dependencies.

const PACKAGES: usize = 50;

fn deriver() -> IdentityDeriver {
    let mut reader = MemoryManifestReader::new();
    for i in 0..PACKAGES {
        reader.insert(
            format!("/app/node_modules/pkg{}", i),
            &format!("pkg{}", i),
            &format!("{}.{}.0", i % 7, i),
        );
    }
    let ctx = ResolutionContext::new(Path::new("/app"))
        .expect("absolute root")
        .with_enforced(["pkg1"]);
    IdentityDeriver::new(ctx, Box::new(reader))
}

fn requests(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            if i % 3 == 0 {
                format!("/app/src/module{}/index.js", i)
            } else {
                format!("/app/node_modules/pkg{}/lib/file{}.js", i % PACKAGES, i)
            }
        })
        .collect()
}

fn algorithms() -> [(&'static str, Algorithm); 4] {
    [
        ("named", Algorithm::Named),
        ("sha256", Algorithm::from_name("sha256").expect("built-in")),
        ("fast", Algorithm::Fast),
        ("debug", Algorithm::Debug),
    ]
}

fn bench_batch_assign(c: &mut Criterion) {
    let d = deriver();
    let mut group = c.benchmark_group("assign/batch");
    for (name, alg) in algorithms() {
        for n in [100usize, 1000] {
            let reqs = requests(n);
            group.bench_with_input(BenchmarkId::new(name, n), &reqs, |b, reqs| {
                b.iter_batched(
                    || reqs.iter().map(|r| SourceModule::new(r.as_str())).collect::<Vec<_>>(),
                    |mut modules| {
                        let mut run = AssignmentRun::new(&alg, &d, DigestEncoding::Base64, 4);
                        let report = run.assign(modules.iter_mut());
                        black_box((report.assigned, run.finish()))
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_derive(c: &mut Criterion) {
    let d = deriver();
    let mut group = c.benchmark_group("identity/derive");
    for (name, path) in [
        ("source", "/app/src/components/button/index.js"),
        ("dependency", "/app/node_modules/pkg3/lib/deep/file.js"),
        ("out_of_tree", "/home/dev/linked/node_modules/pkg3/index.js"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), path, |b, path| {
            b.iter(|| black_box(d.derive(black_box(path))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_batch_assign, bench_derive);
criterion_main!(benches);
