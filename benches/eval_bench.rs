use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lispy::{Environment, evaluate_str, parse_str, read, tokenize};

const DEFINITIONS: &[&str] = &[
    "(def {fact} (\\ {n} {if (== n 0) {1} {* n (fact (- n 1))}}))",
    "(def {fib} (\\ {n} {if (< n 2) {n} {+ (fib (- n 1)) (fib (- n 2))}}))",
    "(def {add-n} (\\ {n} {\\ {x} {+ x n}}))",
    "(def {pack} (\\ {f & xs} {f xs}))",
];

const PROGRAM: &str = r#"
(def {fib} (\ {n} {if (< n 2) {n} {+ (fib (- n 1)) (fib (- n 2))}}))
(join {1 2 3} (tail {4 5 6}) (list (head {7 8}) 9))
((add-n 5) 10)
(eval (join {+} (list 1 2 3 4 5 6 7 8 9 10)))
(pack head 1 2 3)
"#;

fn bench_front_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("Front End");
    group.bench_with_input(BenchmarkId::new("tokenize", "program"), &PROGRAM, |b, input| {
        b.iter(|| tokenize(black_box(input)))
    });
    group.bench_with_input(BenchmarkId::new("parse", "program"), &PROGRAM, |b, input| {
        b.iter(|| parse_str(black_box(input)))
    });
    group.bench_with_input(BenchmarkId::new("read", "program"), &PROGRAM, |b, input| {
        b.iter(|| parse_str(black_box(input)).map(|tree| read(&tree)))
    });
    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let env = Environment::new_global_populated();
    for line in DEFINITIONS {
        let _ = evaluate_str(line, &env);
    }

    let mut group = c.benchmark_group("Evaluation");
    for input in ["(fact 20)", "(fib 15)", "((add-n 5) 10)", "(pack head 1 2 3)"] {
        group.bench_with_input(BenchmarkId::new("evaluate", input), &input, |b, input| {
            b.iter(|| evaluate_str(black_box(input), &env))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_front_end, bench_evaluation);
criterion_main!(benches);
