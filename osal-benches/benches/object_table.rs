use criterion::BenchmarkGroup;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use osal::core::ObjectId;
use osal::core::ObjectKind;
use osal::core::ObjectTable;
use std::hint::black_box;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

const CAPACITY: usize = 1024;
const THREADS: &[usize] = &[2, 4, 6, 8];

fn filled() -> ObjectTable<u64> {
  let table: ObjectTable<u64> = ObjectTable::new(ObjectKind::Queue, CAPACITY, 20);

  for index in 0..CAPACITY as u64 {
    table.create(&format!("obj-{index}"), |_| Ok(index)).unwrap();
  }

  table
}

fn bench_create_delete(criterion: &mut Criterion) {
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group("object_table");
  let table: ObjectTable<u64> = ObjectTable::new(ObjectKind::Queue, CAPACITY, 20);

  group.bench_function("create-delete", |bench| {
    bench.iter(|| {
      let id: ObjectId = table.create("bench", |_| Ok(0)).unwrap();
      table.delete(black_box(id), |_| Ok(())).unwrap();
    })
  });

  group.finish();
}

fn bench_lookup(criterion: &mut Criterion) {
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group("object_table");
  let table: Arc<ObjectTable<u64>> = Arc::new(filled());
  let ids: Arc<Vec<ObjectId>> = Arc::new(table.ids());

  group.bench_function("get", |bench| {
    let mut index: usize = 0;

    bench.iter(|| {
      index = (index + 1) % ids.len();
      black_box(table.get(ids[index]).unwrap());
    })
  });

  group.bench_function("lookup-by-name", |bench| {
    bench.iter(|| {
      black_box(table.lookup_by_name(black_box("obj-512")).unwrap());
    })
  });

  for threads in THREADS {
    let id: BenchmarkId = BenchmarkId::new("get-contended", threads);

    group.bench_with_input(id, threads, |bench, &threads| {
      bench.iter_custom(|iters| {
        let barrier: Arc<Barrier> = Arc::new(Barrier::new(threads + 1));
        let mut handles: Vec<JoinHandle<Duration>> = Vec::with_capacity(threads);

        for offset in 0..threads {
          let barrier: Arc<Barrier> = barrier.clone();
          let table: Arc<ObjectTable<u64>> = table.clone();
          let ids: Arc<Vec<ObjectId>> = ids.clone();

          let handle: JoinHandle<Duration> = thread::spawn(move || {
            barrier.wait();

            let start: Instant = Instant::now();

            for iter in 0..iters as usize {
              black_box(table.get(ids[(iter + offset) % ids.len()]).unwrap());
            }

            start.elapsed()
          });

          handles.push(handle);
        }

        barrier.wait();

        handles
          .into_iter()
          .map(|handle| handle.join().unwrap())
          .sum()
      })
    });
  }

  group.finish();
}

criterion_group!(benches, bench_create_delete, bench_lookup);
criterion_main!(benches);
