//! End-to-end materialization workflows against a local zoo cache
//!
//! Samples are pre-seeded in the cache so no test touches the network; the
//! catalog-driven test points at unroutable URLs to prove that.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use zoolink::{
    CachedZoo, Dataset, DatasetZoo, FailurePolicy, LoadRequest, MaterializeConfig,
    NoOpProgressReporter, ProgressIndicator, Sample, SplitRange, ZooCache, ZooCatalog,
    ZooLinkError,
};

/// Seed `<zoo>/<dataset>/<split>/data/` with `count` sample files
fn seed_split(zoo_dir: &Path, dataset: &str, split: &str, count: usize) -> Vec<PathBuf> {
    let data_dir = zoo_dir.join(dataset).join(split).join("data");
    fs::create_dir_all(&data_dir).expect("Failed to create data directory");
    (0..count)
        .map(|i| {
            let path = data_dir.join(format!("{split}_{i:04}.jpg"));
            fs::write(&path, format!("{split} sample {i}")).expect("Failed to write sample");
            path
        })
        .collect()
}

fn range(s: &str) -> SplitRange {
    s.parse().expect("valid range")
}

fn config(zoo_dir: &Path, out_dir: &Path, train: &str, val: &str) -> MaterializeConfig {
    MaterializeConfig::builder()
        .zoo_dir(zoo_dir)
        .out_dir(out_dir)
        .dataset("open-images-v7")
        .train_range(range(train))
        .val_range(range(val))
        .build()
        .expect("valid config")
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_default_windows_from_cached_zoo() {
    let temp = TempDir::new().unwrap();
    let zoo_dir = temp.path().join("zoo_cache");
    let out_dir = temp.path().join("dataset");
    seed_split(&zoo_dir, "open-images-v7", "train", 25);
    seed_split(&zoo_dir, "open-images-v7", "validation", 8);

    let zoo = CachedZoo::new(&zoo_dir, ZooCatalog::empty()).unwrap();
    let summary = zoolink::materialize(
        &zoo,
        &config(&zoo_dir, &out_dir, "10:20", "1:5"),
        &NoOpProgressReporter,
    )
    .await
    .unwrap();

    let train = sorted_names(&out_dir.join("train"));
    assert_eq!(train.len(), 10);
    assert_eq!(train.first().map(String::as_str), Some("train_0010.jpg"));
    assert_eq!(train.last().map(String::as_str), Some("train_0019.jpg"));

    let valid = sorted_names(&out_dir.join("valid"));
    assert_eq!(
        valid,
        vec![
            "validation_0001.jpg",
            "validation_0002.jpg",
            "validation_0003.jpg",
            "validation_0004.jpg"
        ]
    );
    assert!(!out_dir.join("validation").exists());

    assert_eq!(summary.created_count(), 14);
    assert_eq!(summary.failed_count(), 0);
    assert_eq!(summary.out_dir, fs::canonicalize(&out_dir).unwrap());

    // Every dataset handle was deleted
    let cache = ZooCache::new(&zoo_dir).unwrap();
    assert!(cache.list_records().unwrap().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_links_share_inode_with_cache() {
    use std::os::unix::fs::MetadataExt;

    let temp = TempDir::new().unwrap();
    let zoo_dir = temp.path().join("zoo_cache");
    let out_dir = temp.path().join("dataset");
    let sources = seed_split(&zoo_dir, "open-images-v7", "train", 3);
    seed_split(&zoo_dir, "open-images-v7", "validation", 1);

    let zoo = CachedZoo::new(&zoo_dir, ZooCatalog::empty()).unwrap();
    zoolink::materialize(&zoo, &config(&zoo_dir, &out_dir, "0:3", "0:1"), &NoOpProgressReporter)
        .await
        .unwrap();

    for source in &sources {
        let linked = out_dir.join("train").join(source.file_name().unwrap());
        let source_meta = fs::metadata(source).unwrap();
        let linked_meta = fs::symlink_metadata(&linked).unwrap();
        assert!(linked_meta.file_type().is_file());
        assert_eq!(source_meta.ino(), linked_meta.ino());
        assert_eq!(source_meta.nlink(), 2);
    }
}

#[tokio::test]
async fn test_existing_destination_left_untouched() {
    let temp = TempDir::new().unwrap();
    let zoo_dir = temp.path().join("zoo_cache");
    let out_dir = temp.path().join("dataset");
    seed_split(&zoo_dir, "open-images-v7", "train", 4);
    seed_split(&zoo_dir, "open-images-v7", "validation", 1);

    let occupied = out_dir.join("train").join("train_0001.jpg");
    fs::create_dir_all(occupied.parent().unwrap()).unwrap();
    fs::write(&occupied, "user data").unwrap();

    let zoo = CachedZoo::new(&zoo_dir, ZooCatalog::empty()).unwrap();
    let summary =
        zoolink::materialize(&zoo, &config(&zoo_dir, &out_dir, "0:4", "0:1"), &NoOpProgressReporter)
            .await
            .unwrap();

    assert_eq!(fs::read_to_string(&occupied).unwrap(), "user data");
    assert_eq!(summary.splits[0].links.skipped, 1);
    assert_eq!(summary.splits[0].links.created(), 3);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let zoo_dir = temp.path().join("zoo_cache");
    let out_dir = temp.path().join("dataset");
    seed_split(&zoo_dir, "open-images-v7", "train", 6);
    seed_split(&zoo_dir, "open-images-v7", "validation", 6);
    let config = config(&zoo_dir, &out_dir, "2:6", "0:3");

    let zoo = CachedZoo::new(&zoo_dir, ZooCatalog::empty()).unwrap();
    zoolink::materialize(&zoo, &config, &NoOpProgressReporter)
        .await
        .unwrap();
    let before = (sorted_names(&out_dir.join("train")), sorted_names(&out_dir.join("valid")));

    let second = zoolink::materialize(&zoo, &config, &NoOpProgressReporter)
        .await
        .unwrap();
    let after = (sorted_names(&out_dir.join("train")), sorted_names(&out_dir.join("valid")));

    assert_eq!(before, after);
    assert_eq!(second.created_count(), 0);
}

#[tokio::test]
async fn test_catalog_manifest_order_and_cached_samples() {
    let temp = TempDir::new().unwrap();
    let zoo_dir = temp.path().join("zoo_cache");
    let out_dir = temp.path().join("dataset");

    // Manifest order differs from file-name order
    let names = ["zeta.jpg", "alpha.jpg", "mu.jpg", "beta.jpg"];
    let data_dir = zoo_dir.join("open-images-v7").join("train").join("data");
    fs::create_dir_all(&data_dir).unwrap();
    for name in names {
        fs::write(data_dir.join(name), name).unwrap();
    }
    let manifest: String = names
        .iter()
        .map(|name| format!("http://127.0.0.1:9/{name}\n"))
        .collect();
    fs::write(temp.path().join("train.txt"), manifest).unwrap();
    seed_split(&zoo_dir, "open-images-v7", "validation", 2);

    let catalog_path = temp.path().join("catalog.json");
    fs::write(
        &catalog_path,
        r#"{ "datasets": { "open-images-v7": { "splits": { "train": { "manifest": "train.txt" } } } } }"#,
    )
    .unwrap();

    let config = MaterializeConfig::builder()
        .zoo_dir(&zoo_dir)
        .out_dir(&out_dir)
        .train_range(range("1:3"))
        .val_range(range("0:2"))
        .catalog(Some(catalog_path))
        .build()
        .unwrap();

    zoolink::run(&config, &NoOpProgressReporter).await.unwrap();

    assert_eq!(sorted_names(&out_dir.join("train")), vec!["alpha.jpg", "mu.jpg"]);
    assert_eq!(sorted_names(&out_dir.join("valid")).len(), 2);
}

#[tokio::test]
async fn test_unknown_dataset_fails_before_linking() {
    let temp = TempDir::new().unwrap();
    let zoo_dir = temp.path().join("zoo_cache");
    let out_dir = temp.path().join("dataset");

    let zoo = CachedZoo::new(&zoo_dir, ZooCatalog::empty()).unwrap();
    let err = zoolink::materialize(
        &zoo,
        &config(&zoo_dir, &out_dir, "0:2", "0:1"),
        &NoOpProgressReporter,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ZooLinkError::DatasetNotFound { .. }));
    assert!(!out_dir.join("train").exists());
}

/// Zoo whose train split holds one unlinkable sample (`/` has no file name)
/// between two regular files
struct PartlyBrokenZoo {
    data_dir: PathBuf,
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl DatasetZoo for PartlyBrokenZoo {
    async fn load(
        &self,
        request: &LoadRequest,
        _progress: Option<&ProgressIndicator>,
    ) -> zoolink::Result<Dataset> {
        self.requested.lock().unwrap().push(request.split.clone());
        let mut paths = vec![
            self.data_dir.join("a.jpg"),
            PathBuf::from("/"),
            self.data_dir.join("b.jpg"),
        ];
        if request.split != "train" {
            paths.remove(1);
        }
        let samples = paths
            .into_iter()
            .take(request.max_samples)
            .map(Sample::from_path)
            .collect();
        Ok(Dataset::new("broken", request.split.clone(), samples, None))
    }
}

fn partly_broken_zoo(dir: &Path) -> PartlyBrokenZoo {
    let data_dir = dir.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("a.jpg"), "a").unwrap();
    fs::write(data_dir.join("b.jpg"), "b").unwrap();
    PartlyBrokenZoo {
        data_dir,
        requested: Mutex::new(Vec::new()),
    }
}

#[tokio::test]
async fn test_keep_going_records_failures() {
    let temp = TempDir::new().unwrap();
    let zoo = partly_broken_zoo(temp.path());
    let out_dir = temp.path().join("dataset");

    let config = MaterializeConfig::builder()
        .out_dir(&out_dir)
        .train_range(range("0:3"))
        .val_range(range("0:2"))
        .failure_policy(FailurePolicy::Continue)
        .build()
        .unwrap();

    let summary = zoolink::materialize(&zoo, &config, &NoOpProgressReporter)
        .await
        .unwrap();

    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.splits[0].links.failed.len(), 1);
    assert_eq!(summary.splits[0].links.created(), 2);
    assert_eq!(sorted_names(&out_dir.join("train")), vec!["a.jpg", "b.jpg"]);

    // The validation split still ran after the failure
    assert_eq!(*zoo.requested.lock().unwrap(), vec!["train", "validation"]);
    assert_eq!(sorted_names(&out_dir.join("valid")), vec!["a.jpg", "b.jpg"]);
}

#[tokio::test]
async fn test_abort_stops_at_first_failure() {
    let temp = TempDir::new().unwrap();
    let zoo = partly_broken_zoo(temp.path());
    let out_dir = temp.path().join("dataset");

    let config = MaterializeConfig::builder()
        .out_dir(&out_dir)
        .train_range(range("0:3"))
        .val_range(range("0:2"))
        .build()
        .unwrap();

    let err = zoolink::materialize(&zoo, &config, &NoOpProgressReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, ZooLinkError::Link { .. }));
    assert_eq!(*zoo.requested.lock().unwrap(), vec!["train"]);
    assert!(!out_dir.join("valid").exists());
}

#[tokio::test]
async fn test_inverted_range_links_nothing_and_succeeds() {
    let temp = TempDir::new().unwrap();
    let zoo_dir = temp.path().join("zoo_cache");
    let out_dir = temp.path().join("dataset");
    seed_split(&zoo_dir, "open-images-v7", "train", 25);
    seed_split(&zoo_dir, "open-images-v7", "validation", 8);

    let zoo = CachedZoo::new(&zoo_dir, ZooCatalog::empty()).unwrap();
    let summary = zoolink::materialize(
        &zoo,
        &config(&zoo_dir, &out_dir, "20:10", "1:5"),
        &NoOpProgressReporter,
    )
    .await
    .unwrap();

    assert_eq!(summary.splits[0].fetched, 10);
    assert_eq!(summary.splits[0].window, 0);
    assert!(sorted_names(&out_dir.join("train")).is_empty());
    assert_eq!(sorted_names(&out_dir.join("valid")).len(), 4);
    assert_eq!(summary.failed_count(), 0);
}
