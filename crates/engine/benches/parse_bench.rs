//! 파서 벤치마크
//!
//! 도구 버전 파싱과 Gradle/Maven 의존성 트리 파싱 성능을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use depwatch_engine::extract::{TreeStyle, parse_dependency_tree};
use depwatch_engine::version::{parse_go_version, parse_gradle_version, parse_maven_version};

const GRADLE_VERSION_OUTPUT: &str = "
------------------------------------------------------------
Gradle 7.6
------------------------------------------------------------

Build time:   2022-11-25 13:35:10 UTC
Revision:     daece9dbc5b79370cc8e4fd6fe4b2cd400e150a8

Kotlin:       1.7.10
Groovy:       3.0.13
JVM:          17.0.5 (Eclipse Adoptium 17.0.5+8)
OS:           Linux 6.1.0 amd64
";

const MAVEN_VERSION_OUTPUT: &str = "Apache Maven 3.9.6 (bc0240f3c744dd6b6ec2920b3cd08dcc295161ae)
Maven home: /usr/share/maven
Java version: 17.0.9, vendor: Eclipse Adoptium
";

/// 깊이 `depth`, 노드당 자식 `fanout`개인 Gradle 트리 출력 생성
fn generate_gradle_tree(depth: usize, fanout: usize) -> String {
    fn push_level(out: &mut String, prefix: &str, depth: usize, fanout: usize, id: &mut usize) {
        if depth == 0 {
            return;
        }
        for i in 0..fanout {
            let last = i + 1 == fanout;
            let marker = if last { "\\--- " } else { "+--- " };
            *id += 1;
            out.push_str(&format!("{prefix}{marker}com.example:lib-{id}:1.{}.0\n", *id % 50));
            let child_prefix = format!("{prefix}{}", if last { "     " } else { "|    " });
            push_level(out, &child_prefix, depth - 1, fanout, id);
        }
    }

    let mut out = String::from("runtimeClasspath - Runtime classpath of source set 'main'.\n");
    let mut id = 0;
    push_level(&mut out, "", depth, fanout, &mut id);
    out
}

/// 평면 Maven 트리 출력 생성
fn generate_maven_tree(count: usize) -> String {
    let mut out = String::from("com.example:app:jar:1.0.0\n");
    for i in 0..count {
        let marker = if i + 1 == count { "\\- " } else { "+- " };
        out.push_str(&format!("{marker}org.example:artifact-{i}:jar:2.{}.1:compile\n", i % 20));
        out.push_str(&format!("|  \\- org.example:transitive-{i}:jar:1.0:runtime\n"));
    }
    out
}

fn bench_version_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_parsing");

    group.bench_function("gradle", |b| {
        b.iter(|| parse_gradle_version(black_box(GRADLE_VERSION_OUTPUT)).unwrap())
    });
    group.bench_function("maven", |b| {
        b.iter(|| parse_maven_version(black_box(MAVEN_VERSION_OUTPUT)).unwrap())
    });
    group.bench_function("go", |b| {
        b.iter(|| parse_go_version(black_box("go version go1.21.5 linux/amd64")).unwrap())
    });
    group.bench_function("gradle_garbage", |b| {
        b.iter(|| parse_gradle_version(black_box("Welcome to Gradle!")).is_err())
    });

    group.finish();
}

fn bench_tree_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_parsing");

    for (depth, fanout) in [(3, 4), (4, 6)] {
        let tree = generate_gradle_tree(depth, fanout);
        let nodes = tree.lines().count() - 1;
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(
            BenchmarkId::new("gradle", format!("{nodes}_nodes")),
            &tree,
            |b, tree| b.iter(|| parse_dependency_tree(black_box(tree), TreeStyle::Gradle)),
        );
    }

    for count in [50, 500] {
        let tree = generate_maven_tree(count);
        group.throughput(Throughput::Elements((count * 2) as u64));
        group.bench_with_input(
            BenchmarkId::new("maven", format!("{}_nodes", count * 2)),
            &tree,
            |b, tree| b.iter(|| parse_dependency_tree(black_box(tree), TreeStyle::Maven)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_version_parsing, bench_tree_parsing);
criterion_main!(benches);
