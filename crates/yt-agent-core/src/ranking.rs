//! Relevance scoring for listing results.

use std::cmp::Ordering;

use yt_agent_client::types::ResultItem;

const POPULAR_VIEWS: u64 = 100_000;

pub fn score(item: &ResultItem, query: &str) -> f64 {
    let title = item.title.to_lowercase();
    let query = query.to_lowercase();
    let views = item.view_count.unwrap_or(0);

    let mut score = 0.0;
    if title.contains(&query) {
        score += 5.0;
    }
    if query.contains("python") && !title.contains("pyth network") {
        if title.contains("tutorial") || title.contains("course") {
            score += 10.0;
        }
        if title.contains("crypto") {
            score -= 20.0;
        }
    }
    if views > POPULAR_VIEWS {
        score += 3.0;
    }
    if title.contains("#shorts") {
        score -= 10.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let popularity = (views as f64 + 1.0).ln() * 0.1;
    score + popularity
}

/// Returns a new ordering, highest score first. Ties keep input order.
pub fn rank(items: &[ResultItem], query: &str) -> Vec<ResultItem> {
    let mut scored: Vec<(f64, &ResultItem)> =
        items.iter().map(|item| (score(item, query), item)).collect();
    // `sort_by` is stable.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, item)| item.clone()).collect()
}

/// Highest-scoring item, first one on ties.
pub fn best(items: &[ResultItem], query: &str) -> Option<ResultItem> {
    rank(items, query).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yt_agent_client::types::ItemKind;

    fn video(id: &str, title: &str, views: Option<u64>) -> ResultItem {
        ResultItem {
            id: id.to_string(),
            kind: ItemKind::Video,
            title: title.to_string(),
            channel_title: None,
            view_count: views,
            thumbnail_url: None,
            published_at: None,
        }
    }

    #[test]
    fn worked_example_scores_about_nineteen() {
        let item = video("aaaaaaaaaaa", "Python Tutorial for Beginners", Some(500_000));
        let expected = 5.0 + 10.0 + 3.0 + 0.1 * 500_001f64.ln();
        assert!((score(&item, "python") - expected).abs() < 1e-9);
        assert!((score(&item, "python") - 19.3).abs() < 0.05);
    }

    #[test]
    fn crypto_penalty_compounds_with_tutorial_bonus() {
        let item = video("aaaaaaaaaaa", "Python crypto trading course", None);
        assert!((score(&item, "python") - (5.0 + 10.0 - 20.0)).abs() < 1e-9);
    }

    #[test]
    fn pyth_network_titles_skip_python_adjustments() {
        let item = video("aaaaaaaaaaa", "Pyth Network crypto course", None);
        assert!(score(&item, "python").abs() < 1e-9);
    }

    #[test]
    fn shorts_are_penalised() {
        let item = video("aaaaaaaaaaa", "Rust in 60 seconds #shorts", Some(1_000));
        let expected = -10.0 + 0.1 * 1_001f64.ln();
        assert!((score(&item, "golang") - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_views_count_as_zero() {
        let item = video("aaaaaaaaaaa", "Something else", None);
        assert!(score(&item, "rust").abs() < 1e-9);
    }

    #[test]
    fn ranks_descending_and_stable() {
        let items = vec![
            video("aaaaaaaaaaa", "cooking", None),
            video("bbbbbbbbbbb", "rust tutorial", None),
            video("ccccccccccc", "gardening", None),
            video("ddddddddddd", "Rust for beginners", Some(200_000)),
        ];
        let ranked = rank(&items, "rust");
        let ids: Vec<&str> = ranked.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["ddddddddddd", "bbbbbbbbbbb", "aaaaaaaaaaa", "ccccccccccc"]);
    }

    #[test]
    fn ranking_is_idempotent_and_leaves_input_alone() {
        let items = vec![
            video("aaaaaaaaaaa", "python course", Some(10)),
            video("bbbbbbbbbbb", "python crypto", Some(10)),
            video("ccccccccccc", "python", Some(5_000_000)),
        ];
        let snapshot = items.clone();
        let once = rank(&items, "python");
        let twice = rank(&once, "python");
        assert_eq!(once, twice);
        assert_eq!(items, snapshot);
    }

    #[test]
    fn best_picks_first_on_tie() {
        let items = vec![
            video("aaaaaaaaaaa", "same", Some(42)),
            video("bbbbbbbbbbb", "same", Some(42)),
        ];
        assert_eq!(best(&items, "other").map(|item| item.id), Some("aaaaaaaaaaa".into()));
        assert!(best(&[], "other").is_none());
    }
}
