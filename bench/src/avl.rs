use crate::utils;
use immutable_avltree::AvlTree;
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

fn bench_put(len: usize) -> (AvlTree<i64, i64>, Vec<i64>, Duration) {
    let mut m = AvlTree::new();
    let data = utils::randvec::<i64>(len);
    let begin = Instant::now();
    for k in &data {
        m = m.put(*k, *k)
    }
    (m, data, begin.elapsed())
}

fn bench_get(m: &AvlTree<i64, i64>, d: &[i64]) -> Duration {
    let begin = Instant::now();
    for k in d {
        assert!(m.get(k).is_some());
    }
    begin.elapsed()
}

fn bench_remove(m: AvlTree<i64, i64>, d: &[i64]) -> Duration {
    let mut m = m;
    let begin = Instant::now();
    for k in d {
        m = m.remove(k)
    }
    begin.elapsed()
}

fn bench_filter(m: &AvlTree<i64, i64>) -> Duration {
    let begin = Instant::now();
    let evens = m.filter_keys(|k| k % 2 == 0);
    assert!(evens.len() <= m.len());
    begin.elapsed()
}

pub(crate) fn run(size: usize) {
    let (m, d, put) = bench_put(size);
    let get = bench_get(&m, &d);
    let filter = bench_filter(&m);
    let rm = bench_remove(m, &d);
    println!(
        "put: {}ns, get: {}ns, filter: {}ns, remove: {}ns",
        utils::to_ns_per(put, size),
        utils::to_ns_per(get, size),
        utils::to_ns_per(filter, size),
        utils::to_ns_per(rm, size)
    );
}

// readers on every core share one version of the tree while the main
// thread keeps producing new versions
pub(crate) fn run_parallel(size: usize) {
    let (m, d, _) = bench_put(size);
    let (m, d) = (Arc::new(m), Arc::new(d));
    let n = num_cpus::get().max(1);
    let chunk = (d.len() + n - 1) / n;
    let begin = Instant::now();
    let readers: Vec<_> = (0..n)
        .map(|i| {
            let (m, d) = (Arc::clone(&m), Arc::clone(&d));
            thread::spawn(move || {
                let lo = (i * chunk).min(d.len());
                let hi = ((i + 1) * chunk).min(d.len());
                bench_get(&m, &d[lo..hi])
            })
        })
        .collect();
    let rm = bench_remove((*m).clone(), &d);
    for r in readers {
        if r.join().is_err() {
            eprintln!("reader thread panicked");
        }
    }
    let total = begin.elapsed();
    println!(
        "parallel get+remove over {} threads: {}ns, remove: {}ns",
        n,
        utils::to_ns_per(total, size),
        utils::to_ns_per(rm, size)
    );
}
