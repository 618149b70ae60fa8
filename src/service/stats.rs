//! Stats aggregation
//!
//! Turns one analyzed comment batch into a [`StatsSnapshot`]. Pure:
//! the snapshot reflects only the given batch and is never merged
//! with a prior one.

use crate::data::{KeywordCount, StatsSnapshot};
use crate::nlp::AnalyzedComment;

/// Maximum number of keywords kept in a snapshot
pub const MAX_TRACKED_KEYWORDS: usize = 20;

/// Aggregate an ordered batch of analyzed comments into a snapshot.
///
/// Single pass, in input order:
/// - each comment increments exactly one sentiment bucket;
/// - each tag on a comment increments its category bucket, so one
///   comment may increment several categories;
/// - each comment increments its language count;
/// - keyword occurrences accumulate case-sensitively, with no
///   normalization.
///
/// Afterwards keywords are sorted descending by count (stable, so
/// ties keep first-encountered order) and truncated to
/// [`MAX_TRACKED_KEYWORDS`].
pub fn aggregate(comments: &[AnalyzedComment]) -> StatsSnapshot {
    let mut snapshot = StatsSnapshot::default();

    for comment in comments {
        let analysis = &comment.analysis;

        *snapshot.sentiment.bucket_mut(analysis.sentiment) += 1;

        for tag in &analysis.tags {
            *snapshot.categories.bucket_mut(*tag) += 1;
        }

        *snapshot
            .languages
            .entry(analysis.language.clone())
            .or_insert(0) += 1;

        for keyword in &analysis.keywords {
            // Linear lookup; the accumulator only grows until the final
            // truncation, which is acceptable for per-video batch sizes.
            match snapshot
                .keywords
                .iter_mut()
                .find(|entry| entry.word == *keyword)
            {
                Some(entry) => entry.count += 1,
                None => snapshot.keywords.push(KeywordCount {
                    word: keyword.clone(),
                    count: 1,
                }),
            }
        }
    }

    snapshot
        .keywords
        .sort_by(|a, b| b.count.cmp(&a.count));
    snapshot.keywords.truncate(MAX_TRACKED_KEYWORDS);

    snapshot
}
