use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use rand::prelude::*;

use sort_stabilizer::{SortOps, Sorter, StableSort};

/// Binary-heap sort over the ops seam; unstable, so the adapter decorates.
struct Heapsort;

impl Heapsort {
    fn sift_down(ops: &mut impl SortOps, len: usize, mut root: usize) {
        loop {
            let mut largest = root;
            let left = 2 * root + 1;
            let right = 2 * root + 2;

            if left < len && ops.is_less(largest, left) {
                largest = left;
            }
            if right < len && ops.is_less(largest, right) {
                largest = right;
            }

            if largest == root {
                return;
            }

            ops.swap_elements(root, largest);
            root = largest;
        }
    }
}

impl Sorter for Heapsort {
    type Output = ();

    fn sort_ops<O: SortOps>(&self, ops: &mut O) {
        let len = ops.len();
        for root in (0..len / 2).rev() {
            Self::sift_down(ops, len, root);
        }
        for end in (1..len).rev() {
            ops.swap_elements(0, end);
            Self::sift_down(ops, end, 0);
        }
    }
}

struct SliceOps<'a, T> {
    v: &'a mut [T],
}

impl<T: Ord> SortOps for SliceOps<'_, T> {
    fn len(&self) -> usize {
        self.v.len()
    }

    fn is_less(&mut self, a: usize, b: usize) -> bool {
        self.v[a] < self.v[b]
    }

    fn swap_elements(&mut self, a: usize, b: usize) {
        self.v.swap(a, b);
    }
}

fn random_vec(size: usize) -> Vec<i32> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(714856064);

    (0..size).map(|_| rng.gen::<i32>()).collect()
}

fn random_dense(size: usize) -> Vec<i32> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(714856064);
    let dist = rand::distributions::Uniform::from(0..=(size as i32 / 10).max(1));

    (0..size).map(|_| dist.sample(&mut rng)).collect()
}

fn bench_sort(
    c: &mut Criterion,
    test_size: usize,
    pattern_name: &str,
    pattern_provider: &fn(usize) -> Vec<i32>,
    bench_name: &str,
    sort_func: impl Fn(&mut [i32]),
) {
    let batch_size = if test_size > 30 {
        BatchSize::LargeInput
    } else {
        BatchSize::SmallInput
    };

    c.bench_function(&format!("{bench_name}-{pattern_name}-{test_size}"), |b| {
        b.iter_batched(
            || pattern_provider(test_size),
            |mut test_data| sort_func(black_box(test_data.as_mut_slice())),
            batch_size,
        )
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    let patterns: Vec<(&str, fn(usize) -> Vec<i32>)> =
        vec![("random", random_vec), ("random_dense", random_dense)];

    for test_size in [20, 500, 10_000] {
        for (pattern_name, pattern_provider) in &patterns {
            // Raw wrapped sorter, no stability guarantee.
            bench_sort(c, test_size, pattern_name, pattern_provider, "heapsort", |v| {
                Heapsort.sort_ops(&mut SliceOps { v });
            });

            // The same sorter made stable by decoration.
            bench_sort(
                c,
                test_size,
                pattern_name,
                pattern_provider,
                "stabilized_heapsort",
                |v| {
                    StableSort::new(Heapsort).sort(v);
                },
            );

            // Stdlib baselines.
            bench_sort(c, test_size, pattern_name, pattern_provider, "std_stable", |v| {
                v.sort();
            });
            bench_sort(
                c,
                test_size,
                pattern_name,
                pattern_provider,
                "std_unstable",
                |v| {
                    v.sort_unstable();
                },
            );
        }
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
