//! FILENAME: core/pivot-engine/benches/pivot_calculations.rs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pivot_engine::{tabulate, vector_table, TableSpec, VectorTableSpec};
use resultbox::{record, ResultBox};

fn scalar_box(groups: i64) -> ResultBox {
    let mut rb = ResultBox::new();
    for a in 0..groups {
        for b in 0..10 {
            for c in 0..10 {
                rb.add_value(&record! { "a" => a, "b" => b, "c" => c }, "d", a * 100 + b * 10 + c)
                    .expect("valid row");
            }
        }
    }
    rb
}

fn curve_box(records: i64) -> ResultBox {
    let mut rb = ResultBox::new();
    for a in 0..records {
        let n = 50 + (a % 7) as usize;
        let xs: Vec<f64> = (0..n).map(|i| i as f64 * 100.0 / (n - 1) as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x * (a + 1) as f64).collect();
        rb.add_dict(&record! { "a" => a }, record! { "t" => xs, "y" => ys })
            .expect("valid row");
    }
    rb
}

fn bench_tabulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("tabulate");
    for groups in [10, 100] {
        let rb = scalar_box(groups);
        let spec = TableSpec::new(["d"], ["c"]).with_index(["a", "b"]);
        group.bench_with_input(BenchmarkId::from_parameter(groups * 100), &rb, |bench, rb| {
            bench.iter(|| tabulate(black_box(rb), &spec).expect("table"))
        });
    }
    group.finish();
}

fn bench_vector_table(c: &mut Criterion) {
    let rb = curve_box(100);
    let spec = VectorTableSpec::new("y", "t").with_step(1.0);
    c.bench_function("vector_table_interpolated", |bench| {
        bench.iter(|| vector_table(black_box(&rb), &spec).expect("table"))
    });
}

criterion_group!(benches, bench_tabulate, bench_vector_table);
criterion_main!(benches);
