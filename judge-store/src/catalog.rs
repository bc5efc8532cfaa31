//! Loads problems and users from a data directory:
//!
//! ```text
//! {root}/users.yaml          list of users
//! {root}/problems/*.yaml     one manifest per problem
//! ```
//!
//! Test case paths in manifests are relative to the test case bucket.
use crate::{
    model::{Problem, User},
    MemoryStore, StoreError,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug)]
struct ProblemManifest {
    id: u64,
    title: String,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    test_cases: Vec<TestCaseManifest>,
}

#[derive(Deserialize, Debug)]
struct TestCaseManifest {
    input: String,
    output: String,
    #[serde(default)]
    sample: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub users: usize,
    pub problems: usize,
    pub test_cases: usize,
}

async fn read_file(path: &Path) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) => Ok(Some(s)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse<T: serde::de::DeserializeOwned>(path: &Path, text: &str) -> Result<T, StoreError> {
    serde_yaml::from_str(text).map_err(|source| StoreError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

async fn manifest_paths(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(err)),
    };
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Populates `store` from the data directory at `root`.
#[tracing::instrument(skip(store))]
pub async fn load_catalog(root: &Path, store: &MemoryStore) -> Result<CatalogSummary, StoreError> {
    let mut summary = CatalogSummary::default();

    let users_path = root.join("users.yaml");
    match read_file(&users_path).await? {
        Some(text) => {
            let users: Vec<User> = parse(&users_path, &text)?;
            summary.users = users.len();
            for user in users {
                store.add_user(user).await;
            }
        }
        None => tracing::warn!(path = %users_path.display(), "users file not found"),
    }

    for path in manifest_paths(&root.join("problems")).await? {
        let text = match read_file(&path).await? {
            Some(t) => t,
            None => continue,
        };
        let manifest: ProblemManifest = parse(&path, &text)?;
        let problem_id = manifest.id;
        store
            .add_problem(Problem {
                id: problem_id,
                title: manifest.title,
                score: manifest.score,
            })
            .await;
        for tc in &manifest.test_cases {
            store
                .add_test_case(problem_id, &tc.input, &tc.output, tc.sample)
                .await;
        }
        summary.problems += 1;
        summary.test_cases += manifest.test_cases.len();
        tracing::debug!(problem_id, test_cases = manifest.test_cases.len(), "loaded problem");
    }
    tracing::info!(
        users = summary.users,
        problems = summary.problems,
        test_cases = summary.test_cases,
        "catalog loaded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProblemRepository, UserRepository};

    #[tokio::test]
    async fn loads_users_and_problems() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        tokio::fs::create_dir(root.join("problems")).await.unwrap();
        tokio::fs::write(
            root.join("users.yaml"),
            "- id: 1\n  name: alice\n- id: 2\n  name: bob\n",
        )
        .await
        .unwrap();
        tokio::fs::write(
            root.join("problems/hello.yaml"),
            "id: 100\ntitle: Hello\ntest_cases:\n  - input: hello/1.in\n    output: hello/1.out\n    sample: true\n  - input: hello/2.in\n    output: hello/2.out\n",
        )
        .await
        .unwrap();
        tokio::fs::write(root.join("problems/notes.txt"), "ignored").await.unwrap();

        let store = MemoryStore::new();
        let summary = load_catalog(root, &store).await.unwrap();
        assert_eq!(
            summary,
            CatalogSummary {
                users: 2,
                problems: 1,
                test_cases: 2
            }
        );

        assert_eq!(store.find_user(2).await.unwrap().unwrap().name, "bob");
        let problem = store.find_problem(100).await.unwrap().unwrap();
        assert_eq!(problem.score, None);
        let cases = store.test_cases(100).await.unwrap();
        assert_eq!(cases.len(), 2);
        assert!(cases[0].is_sample);
        assert!(!cases[1].is_sample);
        assert_eq!(cases[1].input_path, "hello/2.in");
    }

    #[tokio::test]
    async fn empty_dir_is_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let summary = load_catalog(dir.path(), &store).await.unwrap();
        assert_eq!(summary, CatalogSummary::default());
    }

    #[tokio::test]
    async fn broken_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("problems")).await.unwrap();
        tokio::fs::write(dir.path().join("problems/bad.yaml"), "title: [unclosed")
            .await
            .unwrap();
        let err = load_catalog(dir.path(), &MemoryStore::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Manifest { .. }));
    }
}
