//! npm 의존성 추출
//!
//! - `package-lock.json` (v1 중첩 `dependencies`, v2/v3 평면 `packages`)
//! - `npm ls --all --json` 출력 (lockfile이 없을 때)
//!
//! # package-lock.json v3 형식 예시
//!
//! ```json
//! {
//!   "name": "my-app",
//!   "lockfileVersion": 3,
//!   "packages": {
//!     "": { "name": "my-app", "version": "1.0.0" },
//!     "node_modules/lodash": { "version": "4.17.21", "resolved": "...", "integrity": "sha512-..." }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::types::Dependency;

/// package-lock.json 구조 (파싱용)
///
/// 결정적 출력 순서를 위해 `BTreeMap`을 사용합니다.
#[derive(Deserialize)]
struct NpmLockFile {
    #[serde(default)]
    packages: BTreeMap<String, NpmPackageEntry>,
    #[serde(default)]
    dependencies: BTreeMap<String, NpmNestedEntry>,
}

/// v2/v3 `packages` 항목
#[derive(Deserialize)]
struct NpmPackageEntry {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dev: bool,
    #[serde(default)]
    link: bool,
}

/// v1 `dependencies` 항목 및 `npm ls --json` 노드
#[derive(Deserialize)]
struct NpmNestedEntry {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dev: bool,
    #[serde(default)]
    dependencies: BTreeMap<String, NpmNestedEntry>,
}

/// `npm ls --json` 최상위 구조
#[derive(Deserialize)]
struct NpmLsOutput {
    #[serde(default)]
    dependencies: BTreeMap<String, NpmNestedEntry>,
}

/// package-lock.json 내용을 의존성 목록으로 변환합니다.
///
/// v2/v3는 `packages`를, v1은 `dependencies`를 사용합니다.
pub fn parse_package_lock(content: &str) -> Result<Vec<Dependency>, serde_json::Error> {
    let lock: NpmLockFile = serde_json::from_str(content)?;

    if lock.packages.is_empty() {
        return Ok(convert_nested(&lock.dependencies));
    }

    let mut seen = BTreeSet::new();
    let mut deps = Vec::new();
    for (key, entry) in &lock.packages {
        // 루트 패키지는 키가 빈 문자열
        if key.is_empty() || entry.link {
            continue;
        }
        let Some(version) = &entry.version else {
            continue;
        };
        let name = extract_package_name(key);
        if !seen.insert((name.clone(), version.clone())) {
            continue;
        }
        let mut dep = Dependency::new(name, version.clone());
        if entry.dev {
            dep.scope = Some("dev".to_owned());
        }
        deps.push(dep);
    }
    Ok(deps)
}

/// `npm ls --all --json` 출력을 의존성 트리로 변환합니다.
pub fn parse_npm_ls(output: &str) -> Result<Vec<Dependency>, serde_json::Error> {
    let ls: NpmLsOutput = serde_json::from_str(output)?;
    Ok(convert_nested(&ls.dependencies))
}

fn convert_nested(entries: &BTreeMap<String, NpmNestedEntry>) -> Vec<Dependency> {
    entries
        .iter()
        .filter_map(|(name, entry)| {
            // 설치되지 않은 의존성은 버전이 없음
            let version = entry.version.as_ref()?;
            let mut dep = Dependency::new(name.clone(), version.clone());
            if entry.dev {
                dep.scope = Some("dev".to_owned());
            }
            dep.children = convert_nested(&entry.dependencies);
            Some(dep)
        })
        .collect()
}

/// "node_modules/@scope/name" 또는 "node_modules/a/node_modules/b" 에서 패키지명 추출
fn extract_package_name(key: &str) -> String {
    match key.rfind("node_modules/") {
        Some(pos) => key[pos + "node_modules/".len()..].to_owned(),
        None => key.to_owned(),
    }
}
