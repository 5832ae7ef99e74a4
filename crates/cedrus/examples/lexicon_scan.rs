//! Build a small dictionary, scan a sentence, and print every match.
//!
//! Run with: `cargo run --example lexicon_scan`

use cedrus::{MatchError, Matcher};

fn main() -> Result<(), MatchError> {
    let mut matcher = Matcher::new();
    for (i, word) in ["rust", "trust", "us", "st"].iter().enumerate() {
        matcher.insert(word, i)?;
    }
    matcher.compile();

    let text = b"in rust we trust";
    println!("scanning: {}", String::from_utf8_lossy(text));

    let mut resp = matcher.scan(text)?;
    while resp.has_next() {
        for token in resp.next_match_item() {
            let key = matcher.key_of(text, &token);
            println!(
                "  [{:>2}..{:>2}] {:<6} value={}",
                token.at + 1 - token.klen,
                token.at,
                String::from_utf8_lossy(key),
                token.value
            );
        }
    }
    resp.release();
    Ok(())
}
