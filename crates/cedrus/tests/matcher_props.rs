// Property tests for the matcher: the scan output is checked against a
// naive oracle, must not depend on insertion order, and must survive a
// persistence round-trip.

use std::collections::BTreeSet;

use cedrus::{Matcher, Trie, TrieFormat};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c')], 1..6)
}

fn dict_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::btree_set(key_strategy(), 1..16)
        .prop_map(|set: BTreeSet<Vec<u8>>| set.into_iter().collect())
}

fn text_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c')], 0..120)
}

fn build(pairs: &[(Vec<u8>, usize)]) -> Matcher<usize> {
    let mut m = Matcher::new();
    for (key, value) in pairs {
        m.insert(key, *value).expect("insert failed");
    }
    m.compile();
    m
}

fn collect(m: &Matcher<usize>, text: &[u8]) -> Vec<(usize, usize, usize)> {
    let mut resp = m.scan(text).expect("scan failed");
    let mut out = Vec::new();
    while resp.has_next() {
        for token in resp.next_match_item() {
            out.push((token.at, token.klen, *token.value));
        }
    }
    out
}

/// Every occurrence of every key, by brute force.
fn oracle(pairs: &[(Vec<u8>, usize)], text: &[u8]) -> Vec<(usize, usize, usize)> {
    let mut out = Vec::new();
    for (key, value) in pairs {
        if key.len() > text.len() {
            continue;
        }
        for (i, window) in text.windows(key.len()).enumerate() {
            if window == key.as_slice() {
                out.push((i + key.len() - 1, key.len(), *value));
            }
        }
    }
    out.sort_unstable();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn scan_agrees_with_the_oracle(keys in dict_strategy(), text in text_strategy()) {
        let pairs: Vec<(Vec<u8>, usize)> =
            keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect();
        let m = build(&pairs);

        let mut got = collect(&m, &text);
        got.sort_unstable();
        prop_assert_eq!(got, oracle(&pairs, &text));
    }

    #[test]
    fn scan_is_insertion_order_independent(keys in dict_strategy(), text in text_strategy()) {
        let pairs: Vec<(Vec<u8>, usize)> =
            keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect();
        let mut reversed = pairs.clone();
        reversed.reverse();

        let forward = build(&pairs);
        let backward = build(&reversed);

        let mut a = collect(&forward, &text);
        let mut b = collect(&backward, &text);
        a.sort_unstable();
        b.sort_unstable();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn tokens_slice_back_to_their_keys(keys in dict_strategy(), text in text_strategy()) {
        let pairs: Vec<(Vec<u8>, usize)> =
            keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect();
        let m = build(&pairs);

        let mut resp = m.scan(&text).expect("scan failed");
        while resp.has_next() {
            for token in resp.next_match_item() {
                let key = m.key_of(&text, &token);
                prop_assert_eq!(key, pairs[*token.value].0.as_slice());
            }
        }
    }

    #[test]
    fn fail_links_point_at_proper_suffixes(keys in dict_strategy()) {
        let pairs: Vec<(Vec<u8>, usize)> =
            keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect();
        let m = build(&pairs);

        let trie = m.trie();
        for id in 0..trie.size() as i32 {
            let path = match trie.key(id) {
                Ok(path) => path,
                Err(_) => continue, // free slot, marker child, or the root
            };
            let fid = match m.fail_of(id) {
                Some(fid) => fid,
                None => continue,
            };
            let suffix = trie.key(fid).unwrap_or_default(); // root is the empty suffix
            prop_assert!(suffix.len() < path.len());
            prop_assert!(path.ends_with(&suffix));
        }
    }

    #[test]
    fn round_trip_preserves_matches(keys in dict_strategy(), text in text_strategy()) {
        let pairs: Vec<(Vec<u8>, usize)> =
            keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect();
        let m = build(&pairs);
        let want = collect(&m, &text);

        for format in [TrieFormat::Json, TrieFormat::Binary] {
            let mut image = Vec::new();
            m.trie().save(&mut image, format).expect("save failed");
            let loaded: Trie<usize> =
                Trie::load(image.as_slice(), format).expect("load failed");
            prop_assert_eq!(loaded.status(), m.trie().status());

            let mut reloaded = Matcher::from_trie(loaded);
            reloaded.compile();
            prop_assert_eq!(collect(&reloaded, &text), want.clone());
        }
    }
}
