//! Benchmarks for the field injection container

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use field_injector::{BoxError, Component, Container, Inject, InjectionPoints, bind};
use std::hint::black_box;
use std::sync::Arc;

trait Repository: Send + Sync {
    fn id(&self) -> u32;
}

struct SqlRepository;

impl Repository for SqlRepository {
    fn id(&self) -> u32 {
        7
    }
}

impl Component for SqlRepository {
    fn construct() -> Result<Self, BoxError> {
        Ok(SqlRepository)
    }
}

#[derive(Default)]
struct Service {
    repository: Inject<dyn Repository>,
}

impl Component for Service {
    fn construct() -> Result<Self, BoxError> {
        Ok(Service::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("repository", |s| &s.repository);
    }
}

#[derive(Default)]
struct Controller {
    service: Inject<Service>,
    repository: Inject<dyn Repository>,
}

impl Component for Controller {
    fn construct() -> Result<Self, BoxError> {
        Ok(Controller::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points
            .field("service", |c| &c.service)
            .field("repository", |c| &c.repository);
    }
}

#[derive(Default)]
struct Ping {
    pong: Inject<Pong>,
}

#[derive(Default)]
struct Pong {
    ping: Inject<Ping>,
}

impl Component for Ping {
    fn construct() -> Result<Self, BoxError> {
        Ok(Ping::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("pong", |p| &p.pong);
    }
}

impl Component for Pong {
    fn construct() -> Result<Self, BoxError> {
        Ok(Pong::default())
    }

    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("ping", |p| &p.ping);
    }
}

fn layered() -> Container {
    let container = Container::new();
    container
        .register_batch()
        .manage::<SqlRepository>()
        .manage::<Service>()
        .manage::<Controller>()
        .register::<dyn Repository, SqlRepository>(|r| r)
        .done();
    container
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    group.bench_function("manage", |b| {
        b.iter(|| {
            let container = Container::new();
            container.manage::<Controller>();
            black_box(container)
        })
    });

    group.bench_function("bind", |b| {
        b.iter(|| {
            let container = Container::new();
            bind!(container, dyn Repository => SqlRepository);
            black_box(container)
        })
    });

    group.bench_function("individual_3_plus_binding", |b| {
        b.iter(|| {
            let container = Container::new();
            container.manage::<SqlRepository>();
            container.manage::<Service>();
            container.manage::<Controller>();
            bind!(container, dyn Repository => SqlRepository);
            black_box(container)
        })
    });

    group.bench_function("batch_3_plus_binding", |b| b.iter(|| black_box(layered())));

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = layered();
    let _ = container.resolve::<Controller>().unwrap();

    group.bench_function("cached_concrete", |b| {
        b.iter(|| black_box(container.resolve::<Controller>().unwrap()))
    });

    group.bench_function("cached_abstract", |b| {
        b.iter(|| black_box(container.resolve::<dyn Repository>().unwrap()))
    });

    group.bench_function("try_resolve_unbound", |b| {
        trait Missing: Send + Sync {}
        b.iter(|| black_box(container.try_resolve::<dyn Missing>()))
    });

    group.bench_function("cold_graph", |b| {
        b.iter(|| {
            let container = layered();
            black_box(container.resolve::<Controller>().unwrap())
        })
    });

    group.bench_function("cold_cycle", |b| {
        b.iter(|| {
            let container = Container::new();
            container.manage::<Ping>();
            container.manage::<Pong>();
            black_box(container.resolve::<Ping>().unwrap())
        })
    });

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements(threads as u64 * 100));
        group.bench_with_input(
            BenchmarkId::new("cached_resolve", threads),
            &threads,
            |b, &threads| {
                let container = layered();
                let _ = container.resolve::<Controller>().unwrap();

                b.iter(|| {
                    std::thread::scope(|scope| {
                        for _ in 0..threads {
                            scope.spawn(|| {
                                for _ in 0..100 {
                                    let controller = container.resolve::<Controller>().unwrap();
                                    black_box(controller.repository.id());
                                }
                            });
                        }
                    })
                })
            },
        );
    }

    group.bench_function("shared_handle_clone", |b| {
        let container = layered();
        let controller: Arc<Controller> = container.resolve().unwrap();
        b.iter(|| black_box(Arc::clone(&controller)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registration,
    bench_resolution,
    bench_concurrent
);
criterion_main!(benches);
