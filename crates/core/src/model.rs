use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl Default for NodeId {
    fn default() -> Self {
        NodeId(0)
    }
}

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A leaf value exactly as it appears in the source document.
///
/// The published datasets encode values as strings (`"82.53"`), so both forms are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric weight; unparseable text counts as zero.
    pub fn as_f64(&self) -> f64 {
        let v = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if v.is_finite() {
            v
        } else {
            0.0
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RawNode>>,
}

impl RawNode {
    pub fn leaf(name: impl Into<String>, category: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            category: Some(category.into()),
            value: Some(RawValue::Number(value)),
            children: None,
        }
    }

    pub fn branch(name: impl Into<String>, children: Vec<RawNode>) -> Self {
        Self {
            name: name.into(),
            category: None,
            value: None,
            children: Some(children),
        }
    }

    pub fn children(&self) -> &[RawNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Distinct leaf categories in pre-order, first appearance wins.
    pub fn categories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                if let Some(cat) = &node.category {
                    if !out.iter().any(|c| c == cat) {
                        out.push(cat.clone());
                    }
                }
            }
            for child in node.children().iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Video,
    Movies,
    Kickstarter,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [DatasetKind::Video, DatasetKind::Movies, DatasetKind::Kickstarter];

    pub fn key(self) -> &'static str {
        match self {
            DatasetKind::Video => "video",
            DatasetKind::Movies => "movies",
            DatasetKind::Kickstarter => "kickstarter",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DatasetKind::Video => "Video Game Sales",
            DatasetKind::Movies => "Movie Sales",
            DatasetKind::Kickstarter => "Kickstarter Pledges",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DatasetKind::Video => "Top 100 Most Sold Video Games Grouped by Platform",
            DatasetKind::Movies => "Top 100 Highest Grossing Movies Grouped By Genre",
            DatasetKind::Kickstarter => {
                "Top 100 Most Pledged Kickstarter Campaigns Grouped By Category"
            }
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            DatasetKind::Video => "https://cdn.freecodecamp.org/testable-projects-fcc/data/tree_map/video-game-sales-data.json",
            DatasetKind::Movies => "https://cdn.freecodecamp.org/testable-projects-fcc/data/tree_map/movie-data.json",
            DatasetKind::Kickstarter => "https://cdn.freecodecamp.org/testable-projects-fcc/data/tree_map/kickstarter-funding-data.json",
        }
    }

    /// Position in load order.
    pub fn slot(self) -> usize {
        match self {
            DatasetKind::Video => 0,
            DatasetKind::Movies => 1,
            DatasetKind::Kickstarter => 2,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(DatasetKind::Video),
            "movies" => Ok(DatasetKind::Movies),
            "kickstarter" => Ok(DatasetKind::Kickstarter),
            other => Err(format!(
                "unknown dataset `{other}` (expected video, movies or kickstarter)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub root: RawNode,
}

impl Dataset {
    pub fn new(kind: DatasetKind, root: RawNode) -> Self {
        Self { kind, root }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_accept_numbers_and_numeric_strings() {
        let node: RawNode =
            serde_json::from_str(r#"{"name":"Wii Sports","category":"Wii","value":"82.53"}"#)
                .unwrap();
        assert_eq!(node.value.as_ref().unwrap().as_f64(), 82.53);
        assert_eq!(node.value.unwrap().to_string(), "82.53");

        let node: RawNode = serde_json::from_str(r#"{"name":"x","value":7}"#).unwrap();
        assert_eq!(node.value.unwrap().as_f64(), 7.0);

        assert_eq!(RawValue::Text("n/a".into()).as_f64(), 0.0);
    }

    #[test]
    fn categories_follow_first_appearance() {
        let root = RawNode::branch(
            "Root",
            vec![
                RawNode::branch(
                    "Wii",
                    vec![RawNode::leaf("a", "Wii", 1.0), RawNode::leaf("b", "Wii", 2.0)],
                ),
                RawNode::branch("DS", vec![RawNode::leaf("c", "DS", 3.0)]),
                RawNode::leaf("d", "Wii", 4.0),
            ],
        );
        assert_eq!(root.categories(), vec!["Wii".to_string(), "DS".to_string()]);
    }

    #[test]
    fn dataset_keys_round_trip() {
        for kind in DatasetKind::ALL {
            assert_eq!(kind.key().parse::<DatasetKind>().unwrap(), kind);
        }
        assert!("films".parse::<DatasetKind>().is_err());
    }
}
