// End-to-end matcher scenarios: the classic overlapping dictionary, the
// nested single-letter dictionary, degenerate dictionaries, and the
// lifecycle errors.

use cedrus::{MatchError, Matcher, MatcherConfig};

/// Drains a scan into `(at, klen, value)` triples in emission order.
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

fn build(words: &[&str]) -> Matcher<usize> {
    let mut m = Matcher::new();
    for (i, word) in words.iter().enumerate() {
        m.insert(word, i).expect("insert failed");
    }
    m.compile();
    m
}

#[test]
fn overlapping_dictionary() {
    let words = ["she", "he", "her", "hers"];
    let m = build(&words);
    let text = b"hershertongher";

    let got = collect(&m, text);
    assert_eq!(
        got,
        vec![
            (1, 2, 1),  // he
            (2, 3, 2),  // her
            (3, 4, 3),  // hers
            (5, 3, 0),  // she
            (5, 2, 1),  // he, via the suffix chain of she
            (6, 3, 2),  // her
            (12, 2, 1), // he
            (13, 3, 2), // her
        ]
    );

    // every token slices back to the key that owns its value
    for &(at, klen, value) in &got {
        assert_eq!(&text[at + 1 - klen..=at], words[value].as_bytes());
    }
}

#[test]
fn key_of_slices_the_text() {
    let m = build(&["she", "he", "her", "hers"]);
    let text = b"hershertongher";
    let mut resp = m.scan(text).unwrap();
    while resp.has_next() {
        for token in resp.next_match_item() {
            let key = m.key_of(text, &token);
            assert_eq!(key.len(), token.klen);
            assert_eq!(m.trie().get(key).unwrap(), token.value);
        }
    }
}

#[test]
fn nested_single_letter_patterns() {
    let mut m = Matcher::new();
    for k in 1..=5usize {
        m.insert("a".repeat(k), k - 1).unwrap();
    }
    m.compile();

    let got = collect(&m, b"aaaaaaaaaa");
    // positions 0..=3 yield 1..=4 tokens, every later position all 5
    assert_eq!(got.len(), 1 + 2 + 3 + 4 + 6 * 5);
    let mut values: Vec<usize> = got.iter().map(|&(_, _, v)| v).collect();
    values.sort_unstable();
    values.dedup();
    assert_eq!(values, vec![0, 1, 2, 3, 4]);
}

#[test]
fn empty_dictionary_matches_nothing() {
    let mut m: Matcher<usize> = Matcher::new();
    m.compile();
    let mut resp = m.scan(b"any text at all").unwrap();
    assert!(!resp.has_next());
    assert!(resp.next_match_item().is_empty());
    resp.release();

    // and an empty text is fine either way
    let resp = m.scan(b"").unwrap();
    assert!(!resp.has_next());
}

#[test]
fn single_byte_patterns() {
    let m = build(&["a", "b"]);
    let got = collect(&m, b"abab");
    assert_eq!(got, vec![(0, 1, 0), (1, 1, 1), (2, 1, 0), (3, 1, 1)]);
}

#[test]
fn scan_before_compile_is_rejected() {
    let mut m: Matcher<usize> = Matcher::new();
    m.insert("key", 0).unwrap();
    assert!(matches!(m.scan(b"key"), Err(MatchError::NotCompiled)));
}

#[test]
fn compile_is_idempotent_and_freezes_the_dictionary() {
    let mut m = Matcher::new();
    m.insert("key", 0usize).unwrap();
    m.compile();
    m.compile(); // no-op
    assert!(matches!(
        m.insert("other", 1),
        Err(MatchError::AlreadyCompiled)
    ));
    assert!(matches!(m.delete("key"), Err(MatchError::AlreadyCompiled)));
    assert_eq!(collect(&m, b"key"), vec![(2, 3, 0)]);
}

#[test]
fn delete_before_compile_takes_effect() {
    let mut m = Matcher::new();
    m.insert("he", 0usize).unwrap();
    m.insert("hers", 1usize).unwrap();
    m.delete("he").unwrap();
    m.compile();
    assert_eq!(collect(&m, b"hers"), vec![(3, 4, 1)]);
}

#[test]
fn buffer_cap_aborts_the_scan() {
    let mut m = Matcher::with_config(MatcherConfig {
        match_buffer_size: 2,
        max_match_buffer: 4,
    });
    m.insert("a", 0usize).unwrap();
    m.compile();

    // four accepting positions fit exactly
    assert_eq!(collect(&m, b"aaaa").len(), 4);
    // the fifth does not
    assert!(matches!(m.scan(b"aaaaa"), Err(MatchError::TooLarge(4))));
    // the failure leaves the matcher usable
    assert_eq!(collect(&m, b"aaa").len(), 3);
}

#[test]
fn prefix_terminals_accept_midway() {
    let mut m = Matcher::new();
    m.insert("ab", 0usize).unwrap();
    m.insert("abc", 1usize).unwrap();
    m.compile();
    let got = collect(&m, b"abc");
    assert_eq!(got, vec![(1, 2, 0), (2, 3, 1)]);
}

#[test]
fn automaton_dump_includes_fail_edges() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("dfa.gv");
    let m = build(&["she", "he", "her", "hers"]);
    m.dump_graph(&path).unwrap();

    let dot = std::fs::read_to_string(&path).unwrap();
    assert!(dot.starts_with("digraph DFA {"));
    assert!(dot.contains("label=\"(*)\" color=red style=dashed"));
    assert!(dot.contains("label=\"(s)\""));
}

#[test]
fn huge_single_letter_dictionary() {
    let n: usize = 24 * 1024;
    let mut m = Matcher::new();
    let mut content = Vec::with_capacity(n);
    for i in 0..n {
        content.push(b'a');
        m.insert(&content, i).unwrap();
    }
    m.compile();

    let mut resp = m.scan(&content).expect("scan failed");
    let mut count: u64 = 0;
    while resp.has_next() {
        count += resp.next_match_item().len() as u64;
    }
    let n = n as u64;
    assert_eq!(count, n * (n + 1) / 2);
}
