//! Integration tests for the `Configs` facade.
//!
//! Each test builds its own application root in a temporary directory with a
//! `tests/configs` subdirectory, so tests are isolated from each other and
//! from the process environment.

use layered_configs::config::{Resolver, from_fn};
use layered_configs::{Configs, ConfigsError, ErrorKind};
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

const COMMON_YAML: &str = r#"
name: somename
description: somedescription
prop1:
  prop2:
    prop3: value3
    prop4: ${{ someobject.prop4 }}
"#;

const DEVELOPMENT_YAML: &str = r#"
description: someotherdescription
version: ${{ version }}
banner: 'release ${{ version }} by ${{ author.name }}'
prop5:
  - ${{ somelist.0 }}
  - ${{ somelist.1 }}
object:
  name: ${{ author.name }}
"#;

/// Create an application root holding the standard fixture files.
fn setup_root() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let dir = temp.path().join("tests/configs");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("common.yaml"), COMMON_YAML).unwrap();
    fs::write(dir.join("config.development.yaml"), DEVELOPMENT_YAML).unwrap();
    fs::write(dir.join("config.invalid.json"), "{}").unwrap();
    temp
}

fn data() -> Value {
    json!({
        "version": "v1.2.3",
        "someobject": {"prop4": "value4"},
        "somelist": ["value5", "value6"],
        "author": {"name": "Jane Doe"}
    })
}

fn create_with(temp: &TempDir, resolver: Resolver) -> Result<Configs, ConfigsError> {
    Configs::create(|opt| {
        opt.root = Some(temp.path().to_path_buf());
        opt.environment = Some("development".to_string());
        opt.resolvers = vec![resolver];
    })
}

// ---------------------------------------------------------------------------
// Construction failures
// ---------------------------------------------------------------------------

mod unhappy_paths {
    use super::*;

    #[test]
    fn no_files_provided() {
        let temp = setup_root();
        let err = create_with(&temp, Resolver::new("development", "/tests/configs")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FilesError);
        assert_eq!(err.message(), "No config files provided for development env");
    }

    #[test]
    fn no_resolver_found() {
        let temp = setup_root();
        let err = Configs::create(|opt| {
            opt.root = Some(temp.path().to_path_buf());
            opt.environment = Some("development".to_string());
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResolverError);
        assert_eq!(err.message(), "Resolver not found");
    }

    #[test]
    fn resolver_for_other_environment_only() {
        let temp = setup_root();
        let err = create_with(
            &temp,
            Resolver::new("production", "/tests/configs").file("common.yaml"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResolverError);
    }

    #[test]
    fn directory_does_not_exist() {
        let temp = setup_root();
        let err = create_with(
            &temp,
            Resolver::new("development", "/tests/configsss").file("config.development.yaml"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigsError::Directory("Directory /tests/configsss does not exist".to_string())
        );
    }

    #[test]
    fn config_file_does_not_exist() {
        let temp = setup_root();
        let err = create_with(
            &temp,
            Resolver::new("development", "/tests/configs").file("config.development.json"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigsError::File("Config file config.development.json does not exist".to_string())
        );
    }

    #[test]
    fn unsupported_extension() {
        let temp = setup_root();
        let err = create_with(
            &temp,
            Resolver::new("development", "/tests/configs").file("config.invalid.json"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtensionError);
        assert_eq!(
            err.to_string(),
            "Unsupported file extension .json. Only .yaml and .yml are supported."
        );
    }

    #[test]
    fn removing_a_declared_file_fails_construction() {
        let temp = setup_root();
        let resolver = Resolver::new("development", "/tests/configs")
            .files(["common.yaml", "config.development.yaml"]);
        assert!(create_with(&temp, resolver.clone()).is_ok());

        fs::remove_file(temp.path().join("tests/configs/common.yaml")).unwrap();
        let err = create_with(&temp, resolver).unwrap_err();
        assert_eq!(err, ConfigsError::file_missing("common.yaml"));
    }
}

// ---------------------------------------------------------------------------
// Reads without a data source
// ---------------------------------------------------------------------------

mod without_data {
    use super::*;

    #[tokio::test]
    async fn unresolved_placeholders_become_empty() {
        let temp = setup_root();
        let configs = Configs::create(|opt| {
            opt.root = Some(temp.path().to_path_buf());
            opt.environment = Some("development".to_string());
            opt.cache_expiry_time = Duration::ZERO;
            opt.path_delimiter = String::new();
            opt.resolvers = vec![
                Resolver::new("development", "/tests/configs").file("config.development.yaml"),
            ];
        })
        .unwrap();

        let value = configs.get("").await.unwrap();
        assert_eq!(
            value,
            Some(json!({
                "description": "someotherdescription",
                "version": null,
                "banner": "release  by ",
                "prop5": [null, null],
                "object": {"name": null}
            }))
        );
        assert_eq!(configs.get("object.name").await.unwrap(), Some(Value::Null));
    }
}

// ---------------------------------------------------------------------------
// Reads with a data source
// ---------------------------------------------------------------------------

mod happy_paths {
    use super::*;

    fn configs(temp: &TempDir) -> Configs {
        Configs::create(|opt| {
            opt.root = Some(temp.path().to_path_buf());
            opt.environment = Some("development".to_string());
            opt.path_delimiter = "/".to_string();
            opt.resolvers = vec![
                Resolver::new("development", "/tests/configs")
                    .files(["common.yaml", "config.development.yaml"])
                    .with_data_source(from_fn(|| async { Ok::<_, anyhow::Error>(data()) })),
            ];
        })
        .unwrap()
    }

    #[tokio::test]
    async fn whole_value_when_key_empty() {
        let temp = setup_root();
        let value = configs(&temp).get("").await.unwrap();
        assert_eq!(
            value,
            Some(json!({
                "name": "somename",
                "description": "someotherdescription",
                "version": "v1.2.3",
                "banner": "release v1.2.3 by Jane Doe",
                "prop1": {"prop2": {"prop3": "value3", "prop4": "value4"}},
                "prop5": ["value5", "value6"],
                "object": {"name": "Jane Doe"}
            }))
        );
    }

    #[tokio::test]
    async fn common_properties_survive() {
        let temp = setup_root();
        assert_eq!(configs(&temp).get("name").await.unwrap(), Some(json!("somename")));
    }

    #[tokio::test]
    async fn later_file_overrides() {
        let temp = setup_root();
        assert_eq!(
            configs(&temp).get("description").await.unwrap(),
            Some(json!("someotherdescription"))
        );
    }

    #[tokio::test]
    async fn interpolated_properties() {
        let temp = setup_root();
        let configs = configs(&temp);
        assert_eq!(configs.get("version").await.unwrap(), Some(json!("v1.2.3")));
        assert_eq!(configs.get("prop1/prop2/prop4").await.unwrap(), Some(json!("value4")));
        assert_eq!(
            configs.get("prop5").await.unwrap(),
            Some(json!(["value5", "value6"]))
        );
        assert_eq!(configs.get("prop5/0").await.unwrap(), Some(json!("value5")));
        assert_eq!(
            configs.get("object").await.unwrap(),
            Some(json!({"name": "Jane Doe"}))
        );
    }

    #[tokio::test]
    async fn nested_properties() {
        let temp = setup_root();
        assert_eq!(
            configs(&temp).get("prop1/prop2/prop3").await.unwrap(),
            Some(json!("value3"))
        );
    }

    #[tokio::test]
    async fn unresolved_paths_are_none() {
        let temp = setup_root();
        let configs = configs(&temp);
        assert_eq!(configs.get("prop5/7").await.unwrap(), None);
        assert_eq!(configs.get("prop5/x").await.unwrap(), None);
        assert_eq!(configs.get("prop1/missing/deeper").await.unwrap(), None);
    }

    #[tokio::test]
    async fn accessors_reflect_validated_set() {
        let temp = setup_root();
        let configs = configs(&temp);
        assert_eq!(configs.environment(), "development");
        assert_eq!(configs.directory(), temp.path().join("tests/configs"));
        assert_eq!(configs.files().len(), 2);
    }
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

mod caching {
    use super::*;

    fn counting(calls: Arc<AtomicUsize>, delay: Duration) -> Resolver {
        Resolver::new("development", "tests/configs")
            .files(["common.yaml", "config.development.yaml"])
            .with_data_source(from_fn(move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    Ok::<_, anyhow::Error>(data())
                }
            }))
    }

    fn configs(temp: &TempDir, resolver: Resolver, ttl: Duration) -> Configs {
        Configs::create(|opt| {
            opt.root = Some(temp.path().to_path_buf());
            opt.environment = Some("development".to_string());
            opt.cache_expiry_time = ttl;
            opt.resolvers = vec![resolver];
        })
        .unwrap()
    }

    #[tokio::test]
    async fn refresh_once_within_ttl_then_again_after() {
        let temp = setup_root();
        let calls = Arc::new(AtomicUsize::new(0));
        let configs = configs(
            &temp,
            counting(Arc::clone(&calls), Duration::ZERO),
            Duration::from_millis(200),
        );

        configs.get("name").await.unwrap();
        configs.get("version").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        configs.get("name").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn snapshots_are_not_mutated_by_refresh() {
        let temp = setup_root();
        let calls = Arc::new(AtomicUsize::new(0));
        let configs = configs(
            &temp,
            counting(Arc::clone(&calls), Duration::ZERO),
            Duration::ZERO,
        );

        let before = configs.snapshot().await.unwrap();
        fs::write(
            temp.path().join("tests/configs/config.development.yaml"),
            "description: changed\n",
        )
        .unwrap();
        let after = configs.snapshot().await.unwrap();

        assert_eq!(before["description"], json!("someotherdescription"));
        assert_eq!(after["description"], json!("changed"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stale_reads_share_one_refresh() {
        let temp = setup_root();
        let calls = Arc::new(AtomicUsize::new(0));
        let configs = configs(
            &temp,
            counting(Arc::clone(&calls), Duration::from_millis(50)),
            Duration::from_secs(60),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let configs = configs.clone();
                tokio::spawn(async move { configs.get("version").await })
            })
            .collect();

        for handle in handles {
            let value = handle.await.unwrap().unwrap();
            assert_eq!(value, Some(json!("v1.2.3")));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
