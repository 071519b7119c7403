use std::collections::HashSet;
use std::fs;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use tidyfile_analyze::{
    resolve, resolve_all, AgeFilter, AgeFilterConfig, DuplicateConfig, DuplicateFinder,
    DuplicateGroup, Fingerprinter, KeepStrategy,
};
use tidyfile_core::{FileRecord, Fingerprint, NullReporter, TypeClassifier};
use tidyfile_scan::{Enumerator, ScanConfig};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn test_duplicate_config_builder() {
    let config = DuplicateConfig::builder()
        .chunk_size(8192usize)
        .parallel(false)
        .min_size(1u64)
        .build()
        .unwrap();

    assert_eq!(config.chunk_size, 8192);
    assert!(!config.parallel);
    assert_eq!(config.min_size, 1);

    let default_config = DuplicateConfig::default();
    assert_eq!(default_config.chunk_size, 64 * 1024);
    assert!(default_config.parallel);
    assert_eq!(default_config.min_size, 0);
}

#[test]
fn test_duplicate_group_properties() {
    let group = DuplicateGroup {
        fingerprint: Fingerprint::new([0xaa; 32]),
        size: 4096,
        members: vec![
            FileRecord::new("/path/file1.txt", 4096, at(1)),
            FileRecord::new("/path/file2.txt", 4096, at(2)),
            FileRecord::new("/other/file3.txt", 4096, at(3)),
        ],
    };

    assert_eq!(group.count(), 3);
    assert_eq!(group.deletable_count(), 2);
    assert_eq!(group.wasted_bytes(), 8192);
    assert_eq!(group.fingerprint.to_hex().len(), 64);
}

#[test]
fn test_no_collisions_across_thousand_distinct_files() {
    let temp = TempDir::new().unwrap();
    let fingerprinter = Fingerprinter::new();
    let mut seen = HashSet::new();

    for i in 0..1000u32 {
        let path = temp.path().join(format!("f{i:04}.bin"));
        fs::write(&path, format!("fixture file number {i}")).unwrap();
        assert!(seen.insert(fingerprinter.fingerprint(&path).unwrap()));
    }
    assert_eq!(seen.len(), 1000);
}

#[test]
fn test_grouping_is_idempotent_and_parallelism_invisible() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    for i in 0..40 {
        // four content classes, ten files each
        fs::write(root.join(format!("file{i:02}.txt")), format!("class {}", i % 4)).unwrap();
    }

    let output = Enumerator::new().scan(&ScanConfig::new(root)).unwrap();
    let parallel = DuplicateFinder::new();
    let sequential = DuplicateFinder::with_config(
        DuplicateConfig::builder().parallel(false).build().unwrap(),
    );

    let first = parallel.group(&output.records, &NullReporter);
    let second = parallel.group(&output.records, &NullReporter);
    let third = sequential.group(&output.records, &NullReporter);

    assert_eq!(first.group_count, 4);
    assert_eq!(first.groups, second.groups);
    assert_eq!(first.groups, third.groups);

    // groups appear in order of their first member's discovery
    let firsts: Vec<String> = first.groups.iter().map(|g| g.members[0].file_name()).collect();
    assert_eq!(firsts, vec!["file00.txt", "file01.txt", "file02.txt", "file03.txt"]);
}

#[test]
fn test_resolver_invariant_for_every_strategy() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir(root.join("nested")).unwrap();
    for name in ["a.txt", "bb.txt", "nested/c.txt"] {
        fs::write(root.join(name), "same").unwrap();
    }
    fs::write(root.join("d.txt"), "other").unwrap();
    fs::write(root.join("nested/e.txt"), "other").unwrap();

    let config = ScanConfig::builder().root(root).recursive(true).build().unwrap();
    let output = Enumerator::new().scan(&config).unwrap();
    let report = DuplicateFinder::new().group(&output.records, &NullReporter);
    assert_eq!(report.group_count, 2);

    for strategy in [
        KeepStrategy::KeepOldest,
        KeepStrategy::KeepNewest,
        KeepStrategy::KeepShortestPath,
        KeepStrategy::KeepFirst,
    ] {
        for decision in resolve_all(&report.groups, strategy) {
            assert_eq!(decision.remove.len(), decision.group.members.len() - 1);
            assert!(decision.group.contains(decision.keep.path()));
            assert!(decision.remove.iter().all(|r| r.path() != decision.keep.path()));
        }
    }
}

#[test]
fn test_keep_oldest_ignores_input_permutation() {
    let t1 = FileRecord::new("/data/zzz/oldest.txt", 3, at(100));
    let t2 = FileRecord::new("/data/b.txt", 3, at(200));
    let t3 = FileRecord::new("/a.txt", 3, at(300));

    let permutations = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    let all = [t1.clone(), t2, t3];

    for order in permutations {
        let group = DuplicateGroup {
            fingerprint: Fingerprint::new([1; 32]),
            size: 3,
            members: order.iter().map(|&i| all[i].clone()).collect(),
        };
        assert_eq!(resolve(&group, KeepStrategy::KeepOldest).keep, t1);
    }
}

#[test]
fn test_age_boundary_exact_day_included_younger_excluded() {
    let temp = TempDir::new().unwrap();
    let now = SystemTime::now();
    let records = vec![
        FileRecord::new("/x/exactly.txt", 1, now - DAY * 7),
        FileRecord::new("/x/one-day-younger.txt", 1, now - DAY * 6),
    ];

    let filter = AgeFilter::with_config(
        AgeFilterConfig::builder()
            .reference_time(now)
            .archive_dir(temp.path())
            .build()
            .unwrap(),
    );
    let plans = filter.filter(&records, 7, false).unwrap();

    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].entries.len(), 1);
    assert_eq!(plans[0].entries[0].file_name(), "exactly.txt");
}

#[test]
fn test_scan_classify_then_plan_by_category() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("inbox");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("report.pdf"), "pdf").unwrap();
    fs::write(root.join("photo.png"), "png").unwrap();
    fs::write(root.join("song.mp3"), "mp3").unwrap();

    let classifier = TypeClassifier::default();
    let output = Enumerator::with_classifier(&classifier)
        .scan(&ScanConfig::new(&root))
        .unwrap();

    // every file was just written; judge them a year from now
    let filter = AgeFilter::with_config(
        AgeFilterConfig::builder()
            .reference_time(SystemTime::now() + DAY * 365)
            .archive_dir(temp.path().join("Archives"))
            .build()
            .unwrap(),
    );
    let plans = filter.filter(&output.records, 30, true).unwrap();
    let categories: Vec<_> = plans.iter().filter_map(|p| p.category.clone()).collect();
    assert_eq!(categories, vec!["Audio", "Images", "PDFs"]);
    assert!(plans.iter().all(|p| p.len() == 1));
}
