//! Go 모듈 의존성 추출
//!
//! `go list -m all` 출력의 첫 줄은 메인 모듈이며, 이후 줄은 `path version [=> replacement]`입니다.

use crate::types::Dependency;

/// `go list -m all` 출력을 의존성 목록으로 변환합니다.
///
/// `=>` 대체 지시자가 있으면 대체 모듈의 버전을 사용합니다.
/// 로컬 경로 대체처럼 버전이 없는 모듈은 건너뜁니다.
pub fn parse_go_list(output: &str) -> Vec<Dependency> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .skip(1)
        .filter_map(parse_module_line)
        .collect()
}

fn parse_module_line(line: &str) -> Option<Dependency> {
    let (module, replacement) = match line.split_once("=>") {
        Some((module, replacement)) => (module.trim(), Some(replacement.trim())),
        None => (line, None),
    };

    let mut fields = module.split_whitespace();
    let path = fields.next()?;
    let declared = fields.next();

    let version = match replacement {
        Some(replacement) => replacement.split_whitespace().nth(1),
        None => declared,
    }?;
    Some(Dependency::new(path, version))
}
