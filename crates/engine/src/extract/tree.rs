//! 빌드 도구 의존성 트리 출력 파서
//!
//! Gradle `dependencies` 태스크와 Maven `dependency:tree` 출력은 모두
//! 들여쓰기 접두어로 깊이를 표현합니다.
//!
//! ```text
//! Gradle (폭 5)                                   Maven (폭 3)
//! +--- org.slf4j:slf4j-api:2.0.9                  com.example:app:jar:1.0
//! |    \--- org.slf4j:slf4j-nop:2.0.9             +- org.slf4j:slf4j-api:jar:2.0.9:compile
//! \--- com.google.guava:guava:31.1 -> 32.0 (*)    |  \- org.slf4j:slf4j-nop:jar:2.0.9:runtime
//!                                                 \- junit:junit:jar:4.13.2:test
//! ```

use crate::types::Dependency;

/// 트리 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStyle {
    Gradle,
    Maven,
}

impl TreeStyle {
    fn indent_width(&self) -> usize {
        match self {
            Self::Gradle => 5,
            Self::Maven => 3,
        }
    }

    fn markers(&self) -> [&'static str; 2] {
        match self {
            Self::Gradle => ["+--- ", "\\--- "],
            Self::Maven => ["+- ", "\\- "],
        }
    }
}

/// 트리 한 줄에서 (깊이, 좌표)를 추출합니다. 트리 줄이 아니면 None.
///
/// 깊이는 1부터 시작합니다 (최상위 의존성 = 1).
fn split_tree_line(line: &str, style: TreeStyle) -> Option<(usize, &str)> {
    let line = line.trim_end();
    for marker in style.markers() {
        if let Some(pos) = line.find(marker) {
            let prefix = &line[..pos];
            if !prefix.chars().all(|c| c == ' ' || c == '|') {
                continue;
            }
            let depth = prefix.chars().count() / style.indent_width() + 1;
            return Some((depth, &line[pos + marker.len()..]));
        }
    }
    None
}

/// Gradle 좌표 `group:artifact:version`을 해석합니다.
///
/// - `1.0 -> 2.0` 충돌 해결은 해결된 버전을 사용합니다.
/// - `group:artifact -> 2.0` (버전 없이 선언) 도 처리합니다.
/// - `(*)` 반복, `(c)` 제약 표시는 제거합니다.
/// - `(n)` 해석되지 않은 의존성과 프로젝트 의존성은 None.
fn parse_gradle_coordinate(text: &str) -> Option<Dependency> {
    let mut text = text.trim();
    for suffix in [" (*)", " (c)"] {
        text = text.strip_suffix(suffix).unwrap_or(text);
    }
    if text.ends_with(" (n)") || text.starts_with("project ") {
        return None;
    }

    let (declared, resolved) = match text.split_once(" -> ") {
        Some((declared, resolved)) => (declared.trim(), Some(resolved.trim())),
        None => (text, None),
    };

    let mut parts = declared.splitn(3, ':');
    let group = parts.next()?.trim();
    let artifact = parts.next()?.trim();
    let declared_version = parts.next().map(str::trim);
    let version = resolved.or(declared_version)?;
    let version = version.trim_start_matches("{strict ").trim_end_matches('}');
    if group.is_empty() || artifact.is_empty() || version.is_empty() {
        return None;
    }
    Some(Dependency::new(format!("{group}:{artifact}"), version))
}

/// Maven 좌표 `group:artifact:type[:classifier]:version[:scope]`을 해석합니다.
fn parse_maven_coordinate(text: &str) -> Option<Dependency> {
    // "(optional)", "(version managed from ...)" 등 부가 설명 제거
    let text = match text.find(" (") {
        Some(pos) => &text[..pos],
        None => text,
    }
    .trim();

    let parts: Vec<&str> = text.split(':').collect();
    let (group, artifact, version, scope) = match parts.as_slice() {
        [g, a, _type, v] => (*g, *a, *v, None),
        [g, a, _type, v, s] => (*g, *a, *v, Some(*s)),
        [g, a, _type, _classifier, v, s] => (*g, *a, *v, Some(*s)),
        _ => return None,
    };
    let mut dep = Dependency::new(format!("{group}:{artifact}"), version);
    dep.scope = scope.map(str::to_owned);
    Some(dep)
}

/// 트리 출력을 의존성 트리로 변환합니다.
///
/// Maven의 접두어 없는 모듈 줄과 헤더/빈 줄은 무시합니다.
/// 해석할 수 없는 노드는 하위 트리와 함께 건너뜁니다.
pub fn parse_dependency_tree(output: &str, style: TreeStyle) -> Vec<Dependency> {
    let mut roots: Vec<Dependency> = Vec::new();
    // (깊이, 노드) 스택. 부모가 닫힐 때 상위로 붙입니다.
    let mut stack: Vec<(usize, Dependency)> = Vec::new();
    // 건너뛴 노드의 깊이 (그 아래 노드도 건너뜀)
    let mut skip_below: Option<usize> = None;

    for line in output.lines() {
        let Some((depth, coordinate)) = split_tree_line(line, style) else {
            continue;
        };

        if let Some(skip) = skip_below {
            if depth > skip {
                continue;
            }
            skip_below = None;
        }

        let parsed = match style {
            TreeStyle::Gradle => parse_gradle_coordinate(coordinate),
            TreeStyle::Maven => parse_maven_coordinate(coordinate),
        };
        let Some(dep) = parsed else {
            skip_below = Some(depth);
            continue;
        };

        close_until(&mut stack, &mut roots, depth);
        stack.push((depth, dep));
    }
    close_until(&mut stack, &mut roots, 1);
    roots
}

/// 깊이가 `depth` 이상인 노드를 닫아 부모(또는 루트)에 붙입니다.
fn close_until(stack: &mut Vec<(usize, Dependency)>, roots: &mut Vec<Dependency>, depth: usize) {
    while let Some((top_depth, _)) = stack.last() {
        if *top_depth < depth {
            break;
        }
        let Some((_, node)) = stack.pop() else {
            break;
        };
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}
