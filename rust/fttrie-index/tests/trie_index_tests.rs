use std::sync::Arc;

use fttrie_common::error::ErrorKind;
use fttrie_index::{
    BoundedTokenCache, BuildFlags, FtQuery, Posting, QueryFlags, TrieIndex, TrieIndexOptions,
};
use fttrie_io::{DirectorySegmentStore, MemorySegmentStore};
use fttrie_testkit::{
    TrieIndexWriter,
    vocab::{SAMPLE_WORDS, random_vocabulary, writer_for_words},
};
use tempfile::TempDir;

fn open(store: &MemorySegmentStore) -> TrieIndex {
    TrieIndex::open(store, BuildFlags::default(), TrieIndexOptions::default())
        .expect("open index")
}

fn sample_index() -> TrieIndex {
    open(&writer_for_words(SAMPLE_WORDS).build_memory().unwrap())
}

fn search(index: &TrieIndex, query: &FtQuery) -> Vec<Posting> {
    index
        .search(query)
        .expect("search")
        .collect_postings()
        .expect("postings")
}

/// Maps the postings of a `writer_for_words` index back to the words.
fn matched_words(index: &TrieIndex, query: &FtQuery) -> Vec<&'static str> {
    let mut words: Vec<&str> = search(index, query)
        .iter()
        .map(|p| SAMPLE_WORDS[p.pre as usize])
        .collect();
    words.sort();
    words
}

#[test]
fn test_every_token_is_found() {
    let words = random_vocabulary(17, 400, b"abcdef", 1..12);
    let mut writer = TrieIndexWriter::new();
    let mut rng = fastrand::Rng::with_seed(17);
    for word in &words {
        for _ in 0..rng.usize(1..4) {
            writer.add(word, rng.u32(0..1000), &[rng.u32(0..50)]);
        }
    }
    let index = open(&writer.build_memory().unwrap());

    for word in &words {
        let node = index
            .find_exact(word.as_bytes())
            .unwrap()
            .unwrap_or_else(|| panic!("{word} not found"));
        assert_eq!(node.posting_size as usize, writer.posting_count(word), "{word}");
    }

    let tokens = index.tokens().unwrap();
    let spelled: Vec<String> = tokens
        .iter()
        .map(|(t, _)| String::from_utf8(t.clone()).unwrap())
        .collect();
    assert_eq!(spelled, words);
    assert!(index.verify_integrity().unwrap().is_ok());
}

#[test]
fn test_estimate_matches_search() {
    let mut writer = TrieIndexWriter::new();
    writer
        .add("tree", 1, &[0])
        .add("tree", 4, &[1, 7])
        .add("tree", 9, &[2])
        .add("trie", 4, &[3])
        .add("try", 2, &[5]);
    let index = open(&writer.build_memory().unwrap());

    for token in ["tree", "trie", "try", "tr", "trees", "x"] {
        let query = FtQuery::exact(token);
        let estimate = index.estimate_count(&query).unwrap() as usize;
        assert_eq!(estimate, search(&index, &query).len(), "{token}");
        assert_eq!(estimate, writer.posting_count(token), "{token}");
    }
}

#[test]
fn test_exact_postings() {
    let mut writer = TrieIndexWriter::new();
    writer.add("tree", 4, &[7, 1]).add("tree", 1, &[0]).add("trie", 2, &[3]);
    let index = open(&writer.build_memory().unwrap());

    let postings = search(&index, &FtQuery::exact("tree"));
    assert_eq!(
        postings,
        [Posting::new(1, vec![0]), Posting::new(4, vec![1, 7])]
    );
    assert!(index.search(&FtQuery::exact("tr")).unwrap().is_empty());
    assert!(index.search(&FtQuery::exact("")).unwrap().is_empty());
    assert_eq!(index.estimate_count(&FtQuery::exact("")).unwrap(), 0);
}

#[test]
fn test_wildcard_queries() {
    let index = sample_index();
    assert_eq!(matched_words(&index, &FtQuery::wildcard("c.t")), ["cat", "cot", "cut"]);
    assert_eq!(
        matched_words(&index, &FtQuery::wildcard("c.*")),
        ["cat", "color", "colour", "cot", "cup", "cut"]
    );
    assert_eq!(matched_words(&index, &FtQuery::wildcard("colo.?r")), ["color", "colour"]);
    assert_eq!(matched_words(&index, &FtQuery::wildcard("kit.+")), ["kitchen", "kite", "kitten"]);
    assert_eq!(matched_words(&index, &FtQuery::wildcard(".*")).len(), SAMPLE_WORDS.len());
    // without a marker the token is matched literally
    assert_eq!(matched_words(&index, &FtQuery::wildcard("trie")), ["trie"]);
    assert!(matched_words(&index, &FtQuery::wildcard("q.z")).is_empty());
}

#[test]
fn test_wildcard_marker_is_literal_in_exact_mode() {
    let mut writer = TrieIndexWriter::new();
    writer.add("a.b", 1, &[0]).add("axb", 2, &[0]);
    let index = open(&writer.build_memory().unwrap());
    let postings = search(&index, &FtQuery::exact("a.b"));
    assert_eq!(postings.len(), 1);
    assert_eq!(postings[0].pre, 1);
    assert_eq!(search(&index, &FtQuery::wildcard("a.b")).len(), 2);
}

#[test]
fn test_fuzzy_queries() {
    let index = sample_index();
    let at_two = matched_words(&index, &FtQuery::fuzzy("kitten", 2));
    assert!(at_two.contains(&"mitten"));
    assert!(!at_two.contains(&"sitting"));
    let at_three = matched_words(&index, &FtQuery::fuzzy("kitten", 3));
    assert!(at_three.contains(&"sitting"));

    // "colr" has length 4, so the default budget is one edit
    assert_eq!(matched_words(&index, &FtQuery::fuzzy("colr", 0)), ["color"]);
}

#[test]
fn test_fuzzy_budget_from_options() {
    let store = writer_for_words(SAMPLE_WORDS).build_memory().unwrap();
    let options = TrieIndexOptions {
        max_errors: 2,
        ..Default::default()
    };
    let index = TrieIndex::open(&store, BuildFlags::default(), options).unwrap();
    assert_eq!(
        matched_words(&index, &FtQuery::fuzzy("cot", 0)),
        ["ant", "cat", "cot", "cup", "cut", "kit"]
    );
}

#[test]
fn test_shared_pre_values_merge() {
    let mut writer = TrieIndexWriter::new();
    writer
        .add("cat", 1, &[0, 4])
        .add("cot", 1, &[2, 4])
        .add("cot", 3, &[1])
        .add("cut", 2, &[6]);
    let index = open(&writer.build_memory().unwrap());

    let postings = search(&index, &FtQuery::wildcard("c.t"));
    assert_eq!(
        postings,
        [
            Posting::new(1, vec![0, 2, 4]),
            Posting::new(2, vec![6]),
            Posting::new(3, vec![1]),
        ]
    );
    let fuzzy = search(&index, &FtQuery::fuzzy("cet", 1));
    assert_eq!(fuzzy, postings);
}

#[test]
fn test_fast_mode() {
    let mut writer = TrieIndexWriter::new();
    writer.add("cat", 1, &[0, 4]).add("cot", 1, &[2]).add("cot", 5, &[1]);
    let index = open(&writer.build_memory().unwrap());

    let query = FtQuery::from_flags(
        "c.t",
        QueryFlags {
            wildcard: true,
            fast: true,
            ..Default::default()
        },
    )
    .unwrap();
    let postings = search(&index, &query);
    assert_eq!(postings, [Posting::new(1, vec![]), Posting::new(5, vec![])]);
    let exact = search(&index, &FtQuery::exact("cot").with_fast(true));
    assert_eq!(exact.iter().map(|p| p.pre).collect::<Vec<_>>(), [1, 5]);
    assert!(exact.iter().all(|p| p.positions.is_empty()));
}

#[test]
fn test_close_is_idempotent_and_isolated() {
    let store = writer_for_words(SAMPLE_WORDS).build_memory().unwrap();
    let mut first = open(&store);
    let second = open(&store);

    let pending = first.search(&FtQuery::exact("kite")).unwrap();
    first.close();
    first.close();
    assert!(first.is_closed());
    let err = first.estimate_count(&FtQuery::exact("kite")).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));

    // iterators handed out before closing stay valid
    assert_eq!(pending.collect_postings().unwrap().len(), 1);
    assert_eq!(matched_words(&second, &FtQuery::exact("kite")), ["kite"]);
}

#[test]
fn test_shared_cache_across_handles() {
    let store = writer_for_words(SAMPLE_WORDS).build_memory().unwrap();
    let cache = Arc::new(BoundedTokenCache::new(100));
    let first = open(&store).with_cache(cache.clone());
    let second = open(&store).with_cache(cache.clone());
    first.estimate_count(&FtQuery::exact("tree")).unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(second.estimate_count(&FtQuery::exact("tree")).unwrap(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_directory_store() {
    let dir = TempDir::new().unwrap();
    writer_for_words(SAMPLE_WORDS).write_to_dir(dir.path()).unwrap();
    let store = DirectorySegmentStore::new(dir.path());
    let index =
        TrieIndex::open(&store, BuildFlags::default(), TrieIndexOptions::default()).unwrap();
    assert_eq!(matched_words(&index, &FtQuery::wildcard("tr.e")), ["tree", "trie"]);
    assert!(index.verify_integrity().unwrap().is_ok());

    let missing = TempDir::new().unwrap();
    let err = TrieIndex::open(
        &DirectorySegmentStore::new(missing.path()),
        BuildFlags::default(),
        TrieIndexOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io { .. }));
}

#[test]
fn test_custom_segment_prefix() {
    let store = TrieIndexWriter::with_prefix("body_")
        .add("alpha", 3, &[1])
        .build_memory()
        .unwrap();
    let options = TrieIndexOptions {
        segment_prefix: "body_".to_string(),
        ..Default::default()
    };
    let index = TrieIndex::open(&store, BuildFlags::default(), options).unwrap();
    assert_eq!(index.estimate_count(&FtQuery::exact("alpha")).unwrap(), 1);
    assert!(TrieIndex::open(&store, BuildFlags::default(), TrieIndexOptions::default()).is_err());
}

#[test]
fn test_corrupted_offsets_are_format_errors() {
    let segs = writer_for_words(&["abc", "abd", "xyz"]).finish().unwrap();
    let mut offsets = segs.offsets.clone();
    // node 1 now ends past the node stream
    offsets[8..12].copy_from_slice(&u32::MAX.to_be_bytes());
    let mut store = segs.into_store();
    store.insert("ftxc", offsets);
    let index = open(&store);

    let err = index.search(&FtQuery::exact("abc")).unwrap_err();
    assert!(err.is_integrity(), "{err}");
    let report = index.verify_integrity().unwrap();
    assert!(!report.is_ok());
}

#[test]
fn test_cyclic_child_reference_is_format_error() {
    // root -> "ab" (1) -> "c" (2); "ab" now lists itself as its child
    let mut segs = writer_for_words(&["ab", "abc"]).finish().unwrap();
    segs.set_child(1, 0, 1, b'a');
    let index = open(&segs.into_store());

    assert!(index.diagnostics().unwrap_err().is_integrity());
    assert!(index.tokens().unwrap_err().is_integrity());
    for query in ["a.*", "a.+"] {
        let err = index.search(&FtQuery::wildcard(query)).unwrap_err();
        assert!(err.is_integrity(), "{query}: {err}");
    }
    // bounded lookups never revisit a node
    assert_eq!(search(&index, &FtQuery::exact("ab")).len(), 1);
    assert_eq!(search(&index, &FtQuery::fuzzy("ab", 1)).len(), 1);
    let report = index.verify_integrity().unwrap();
    assert!(report.violations.contains(&"node 1: referenced more than once".to_string()));
}

#[test]
fn test_diagnostics() {
    let mut writer = writer_for_words(SAMPLE_WORDS);
    writer.add("tree", 100, &[0]).add("tree", 101, &[0]).add("cat", 102, &[0]);
    let store = writer.build_memory().unwrap();
    let flags = BuildFlags {
        stemming: true,
        ..Default::default()
    };
    let options = TrieIndexOptions {
        stats_top_k: 2,
        ..Default::default()
    };
    let index = TrieIndex::open(&store, flags, options).unwrap();
    let info = index.diagnostics().unwrap();

    assert_eq!(info.kind, "compressed-trie");
    assert!(info.flags.stemming);
    assert_eq!(info.size_on_disk, store.total_size());
    assert_eq!(info.stats.token_count as usize, SAMPLE_WORDS.len());
    assert_eq!(info.stats.posting_count as usize, SAMPLE_WORDS.len() + 3);
    let top: Vec<&str> = info.stats.most_frequent.iter().map(|t| t.token.as_str()).collect();
    assert_eq!(top, ["tree", "cat"]);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["kind"], "compressed-trie");
    assert_eq!(json["flags"]["stemming"], true);
    assert!(info.to_string().contains("- stemming: ON"));
}

#[test]
fn test_concurrent_queries() {
    let index = sample_index();
    std::thread::scope(|scope| {
        for word in SAMPLE_WORDS {
            let index = &index;
            scope.spawn(move || {
                assert_eq!(matched_words(index, &FtQuery::exact(*word)), [*word]);
                assert!(matched_words(index, &FtQuery::fuzzy(*word, 1)).contains(word));
            });
        }
    });
}
