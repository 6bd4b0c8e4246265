use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tinyorm::{Executor, OrmResult, ParamList, QueryBuilder, RowSet, Session, Value};

struct NullExecutor;

impl Executor for NullExecutor {
    fn execute(&self, _sql: &str, _params: &ParamList) -> OrmResult<RowSet> {
        Ok(Vec::new())
    }
}

/// Chain `n` equality conditions onto a builder:
/// SELECT * FROM t WHERE col0 = ? AND col1 = ? ...
fn chain_conditions(session: &Session, n: usize) -> QueryBuilder<'_> {
    let mut qb = session.for_table("t");
    for i in 0..n {
        qb = qb.where_eq(&format!("col{i}"), i as i64);
    }
    qb
}

fn bench_compile(c: &mut Criterion) {
    let session = Session::new(NullExecutor);
    let mut group = c.benchmark_group("sql_builder/compile");

    for n in [1, 5, 10, 50, 100] {
        let qb = chain_conditions(&session, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &qb, |b, qb| {
            b.iter(|| black_box(qb.compile()));
        });
    }

    group.finish();
}

fn bench_build_and_compile(c: &mut Criterion) {
    let session = Session::new(NullExecutor);
    let mut group = c.benchmark_group("sql_builder/build_and_compile");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let qb = chain_conditions(&session, n);
                black_box(qb.compile());
            });
        });
    }

    group.finish();
}

fn bench_where_in(c: &mut Criterion) {
    let session = Session::new(NullExecutor);
    let mut group = c.benchmark_group("sql_builder/where_in");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let qb = session.for_table("t").where_in("id", values.iter().copied());
                black_box(qb.compile());
            });
        });
    }

    group.finish();
}

fn bench_param_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/param_dump");

    for n in [5, 20, 100] {
        let mut params = ParamList::new();
        for i in 0..n {
            params.push(Value::from(format!("value{i}")));
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &params, |b, params| {
            b.iter(|| black_box(params.dump()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_build_and_compile,
    bench_where_in,
    bench_param_dump
);
criterion_main!(benches);
