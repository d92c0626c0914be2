//! pip 의존성 추출
//!
//! `requirements.txt`와 `pip freeze` 출력은 같은 `name==version` 형식입니다.
//! 고정되지 않은 요구사항(`>=`, `~=` 등)은 해석된 버전이 없으므로 건너뜁니다.

use crate::types::Dependency;

/// `name==version` 줄 목록을 의존성으로 변환합니다.
///
/// - `#` 주석과 줄 끝 주석 제거
/// - `-r`, `--index-url` 등 옵션 줄 무시
/// - `; python_version < "3.8"` 환경 마커 제거
/// - `name[extra]==1.0`의 extras 제거
pub fn parse_requirements(content: &str) -> Vec<Dependency> {
    content.lines().filter_map(parse_requirement_line).collect()
}

fn parse_requirement_line(line: &str) -> Option<Dependency> {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let line = match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    }
    .trim();
    if line.is_empty() || line.starts_with('-') {
        return None;
    }

    let (name, version) = line.split_once("==")?;
    let name = match name.find('[') {
        Some(pos) => &name[..pos],
        None => name,
    }
    .trim();
    // "===" 임의 동등 비교도 허용
    let version = version.trim_start_matches('=').trim();
    if name.is_empty() || version.is_empty() || version.contains(',') {
        return None;
    }
    Some(Dependency::new(name, version))
}
