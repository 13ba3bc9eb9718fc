use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::treemap::PositionedLeaf;

/// Case-insensitive skim score of `needle` against `hay`, `None` when it doesn't match.
pub fn fuzzy_score(needle: &str, hay: &str) -> Option<i64> {
    SkimMatcherV2::default().ignore_case().fuzzy_match(hay, needle)
}

/// Indices of leaves whose name or category fuzzy-matches `query`, best match first.
pub fn matching_leaves(query: &str, leaves: &[PositionedLeaf]) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<(i64, usize)> = leaves
        .iter()
        .filter_map(|l| {
            let by_name = fuzzy_score(query, &l.name);
            let by_category = l.category.as_deref().and_then(|c| fuzzy_score(query, c));
            by_name.max(by_category).map(|score| (score, l.index))
        })
        .collect();
    // stable: equal scores stay in leaf order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, index)| index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Hierarchy;
    use crate::model::RawNode;
    use crate::treemap::TreemapLayout;

    #[test]
    fn matches_name_or_category() {
        let raw = RawNode::branch(
            "Root",
            vec![
                RawNode::leaf("Mario Kart Wii", "Wii", 35.0),
                RawNode::leaf("Pokemon Red", "GB", 31.0),
                RawNode::leaf("Tetris", "GB", 30.0),
            ],
        );
        let tree = Hierarchy::from_raw(&raw);
        let leaves = TreemapLayout::new(100.0, 100.0).compute(&tree).leaves(&tree);

        assert_eq!(matching_leaves("mario", &leaves), vec![0]);
        assert_eq!(matching_leaves("gb", &leaves), vec![1, 2]);
        assert!(matching_leaves("   ", &leaves).is_empty());
        assert!(fuzzy_score("tts", "Tetris").is_some());
    }

    #[test]
    fn contiguous_match_ranks_first() {
        let raw = RawNode::branch(
            "Root",
            vec![
                RawNode::leaf("Kinect Adventures Rush Time", "X360", 40.0),
                RawNode::leaf("Mario Kart Wii", "Wii", 35.0),
            ],
        );
        let tree = Hierarchy::from_raw(&raw);
        let leaves = TreemapLayout::new(100.0, 100.0).compute(&tree).leaves(&tree);

        assert_eq!(matching_leaves("kart", &leaves), vec![1, 0]);
    }
}
