use lazyseq_rs::{from, from_fn, DuplicatePolicy, JoinMode, SequenceExt};
use std::env;
use std::fs;
use tracing_subscriber::EnvFilter;

/// Word frequency report built from lazy combinators.
///
/// Usage: cargo run --example wordstats <filename> [top]
///
/// Set `RUST_LOG=lazyseq_rs=trace` to see where the pipeline materializes.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <filename> [top]", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    let top: isize = args.get(2).and_then(|n| n.parse().ok()).unwrap_or(10);

    let text = fs::read_to_string(filename).unwrap_or_else(|_| {
        eprintln!("File \"{}\" not found.", filename);
        std::process::exit(1);
    });

    // Restartable word stream over the file contents, read once into the cache.
    let words = from_fn(|| {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
    })
    .cache();

    let counts = (&words)
        .group_by(|w| w.clone())
        .map(|g| (g.key().clone(), g.len()))
        .sort_by_descending(|a: &(String, usize), b: &(String, usize)| a.1.cmp(&b.1))
        .then_by_key(|(word, _): &(String, usize)| word.clone());

    println!("Words:        {}", words.count().expect("cached words replay"));
    println!(
        "Distinct:     {}",
        (&words)
            .to_set(DuplicatePolicy::Allow)
            .expect("cached words replay")
            .len()
    );
    println!(
        "Longest:      {}",
        words
            .max_by_key(|w| w.len())
            .expect("cached words replay")
            .unwrap_or_default()
    );

    println!("\n=== Top {} ===", top);
    for (word, count) in counts.take(top).to_vec().expect("cached words replay") {
        println!("{:>8}  {}", count, word);
    }

    let lengths = from(vec![1usize, 4, 8, 12]);
    println!("\n=== Words by length ===");
    for (bound, n) in (&lengths)
        .zip((&lengths).skip(1), JoinMode::Left, |lo, hi| (lo.unwrap_or(0), hi))
        .map(|(lo, hi)| {
            let n = (&words)
                .filter(move |w| w.len() >= lo && hi.map_or(true, |hi| w.len() < hi))
                .count()
                .unwrap_or(0);
            let bound = match hi {
                Some(hi) => format!("{}-{}", lo, hi - 1),
                None => format!("{}+", lo),
            };
            (bound, n)
        })
        .to_vec()
        .expect("static lengths")
    {
        println!("{:>8}  {}", n, bound);
    }
}
