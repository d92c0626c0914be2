//! 도메인 타입 -- 생태계, 의존성 트리

use std::fmt;

use serde::{Deserialize, Serialize};

/// 빌드/패키지 생태계
///
/// 작업 결과의 키로 사용되므로 `Ord`를 구현합니다 (결정적 병합 순서).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Gradle (build.gradle, build.gradle.kts)
    Gradle,
    /// Maven (pom.xml)
    Maven,
    /// npm (package.json, package-lock.json)
    Npm,
    /// Go modules (go.mod)
    Go,
    /// pip (requirements.txt, pyproject.toml 등)
    Pip,
}

impl Ecosystem {
    /// 지원하는 모든 생태계
    pub const ALL: [Ecosystem; 5] = [
        Ecosystem::Gradle,
        Ecosystem::Maven,
        Ecosystem::Npm,
        Ecosystem::Go,
        Ecosystem::Pip,
    ];

    /// Package URL 타입 (예: Gradle/Maven -> "maven")
    pub fn purl_type(&self) -> &'static str {
        match self {
            Self::Gradle | Self::Maven => "maven",
            Self::Npm => "npm",
            Self::Go => "golang",
            Self::Pip => "pypi",
        }
    }

    /// 문자열에서 생태계를 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gradle" => Some(Self::Gradle),
            "maven" | "mvn" => Some(Self::Maven),
            "npm" | "node" | "js" => Some(Self::Npm),
            "go" | "golang" => Some(Self::Go),
            "pip" | "python" | "pypi" => Some(Self::Pip),
            _ => None,
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gradle => "gradle",
            Self::Maven => "maven",
            Self::Npm => "npm",
            Self::Go => "go",
            Self::Pip => "pip",
        };
        f.write_str(name)
    }
}

/// 의존성 트리 노드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// 패키지 이름 (Maven 계열은 `group:artifact`)
    pub name: String,
    /// 해석된 버전
    pub version: String,
    /// Maven 스코프 (compile, runtime 등)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// 전이 의존성
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Dependency>,
}

impl Dependency {
    /// 자식이 없는 의존성을 생성합니다.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            scope: None,
            children: Vec::new(),
        }
    }

    /// Package URL을 생성합니다.
    pub fn purl(&self, ecosystem: Ecosystem) -> String {
        let name = match ecosystem.purl_type() {
            "maven" => self.name.replacen(':', "/", 1),
            _ => self.name.clone(),
        };
        format!("pkg:{}/{}@{}", ecosystem.purl_type(), name, self.version)
    }

    /// 자신을 포함한 트리 전체 노드 수
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Dependency::count).sum::<usize>()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// 의존성 목록 전체의 노드 수
pub fn count_dependencies(deps: &[Dependency]) -> usize {
    deps.iter().map(Dependency::count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecosystem_display_and_parse_agree() {
        for eco in Ecosystem::ALL {
            assert_eq!(Ecosystem::from_str_loose(&eco.to_string()), Some(eco));
        }
        assert_eq!(Ecosystem::from_str_loose("MVN"), Some(Ecosystem::Maven));
        assert_eq!(Ecosystem::from_str_loose("cargo"), None);
    }

    #[test]
    fn ecosystem_order_is_stable() {
        let mut ecos = vec![Ecosystem::Pip, Ecosystem::Gradle, Ecosystem::Go];
        ecos.sort();
        assert_eq!(ecos, vec![Ecosystem::Gradle, Ecosystem::Go, Ecosystem::Pip]);
    }

    #[test]
    fn maven_purl_uses_namespace() {
        let dep = Dependency::new("org.slf4j:slf4j-api", "2.0.9");
        assert_eq!(
            dep.purl(Ecosystem::Gradle),
            "pkg:maven/org.slf4j/slf4j-api@2.0.9"
        );
        let dep = Dependency::new("lodash", "4.17.21");
        assert_eq!(dep.purl(Ecosystem::Npm), "pkg:npm/lodash@4.17.21");
    }

    #[test]
    fn count_includes_transitive_children() {
        let mut root = Dependency::new("a", "1");
        let mut mid = Dependency::new("b", "1");
        mid.children.push(Dependency::new("c", "1"));
        root.children.push(mid);
        assert_eq!(root.count(), 3);
        assert_eq!(count_dependencies(&[root, Dependency::new("d", "1")]), 4);
    }
}
