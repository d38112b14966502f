//! Splits one repository search into many narrower ones.
//!
//! GitHub stops returning results after the first 1000 hits of a query, so a
//! broad query like `language:python` is crossed with star, creation date and
//! size filters. Segments may overlap; the crawler dedups repositories.

/// Non-overlapping star filters.
pub const STAR_RANGES: [&str; 8] = [
    "stars:0..10",
    "stars:11..50",
    "stars:51..100",
    "stars:101..500",
    "stars:501..1000",
    "stars:1001..5000",
    "stars:5001..10000",
    "stars:>10000",
];

/// Repository size filters (KB) queried on the base filter alone.
pub const SIZE_RANGES: [&str; 3] = ["size:<1000", "size:1000..5000", "size:>5000"];

/// Number of one-year creation windows per star range.
pub const YEAR_WINDOW: i32 = 10;

/// Ordered search segments for repositories written in `language`.
pub fn segmented_queries(language: &str, current_year: i32) -> Vec<String> {
    let base = format!("language:{}", language);
    let first_year = current_year - YEAR_WINDOW;

    let mut queries = Vec::new();
    for stars in STAR_RANGES {
        queries.push(format!("{} {}", base, stars));
        for year in first_year..current_year {
            queries.push(format!(
                "{} {} created:{}-01-01..{}-01-01",
                base,
                stars,
                year,
                year + 1
            ));
        }
    }

    queries.push(format!("{} created:>{}-01-01", base, current_year - 1));

    for size in SIZE_RANGES {
        queries.push(format!("{} {}", base, size));
    }

    queries
}
