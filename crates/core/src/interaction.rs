use serde::{Deserialize, Serialize};

use crate::treemap::PositionedLeaf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    pub offset_x: f64,
    pub offset_y: f64,
    pub fade_ms: u64,
    pub opacity: f32,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            offset_x: 10.0,
            offset_y: -20.0,
            fade_ms: 100,
            opacity: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverState {
    Idle,
    Hovering(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub name: String,
    pub category: String,
    pub value: String,
}

impl TooltipContent {
    pub fn from_leaf(leaf: &PositionedLeaf) -> Self {
        Self {
            name: leaf.name.clone(),
            category: leaf.category.clone().unwrap_or_default(),
            value: leaf.value_text(),
        }
    }

    pub fn lines(&self) -> [String; 3] {
        [
            format!("Name: {}", self.name),
            format!("Category: {}", self.category),
            format!("Value: {}", self.value),
        ]
    }
}

/// Linear opacity ramp. Times are seconds on the caller's clock.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    start: f64,
    duration: f64,
}

impl Fade {
    fn at(&self, now: f64) -> f32 {
        if self.duration <= 0.0 || now >= self.start + self.duration {
            return self.to;
        }
        let t = ((now - self.start) / self.duration).clamp(0.0, 1.0) as f32;
        self.from + (self.to - self.from) * t
    }
}

#[derive(Debug, Clone)]
pub struct Tooltip {
    config: TooltipConfig,
    state: HoverState,
    content: Option<TooltipContent>,
    position: (f64, f64),
    fade: Fade,
}

impl Tooltip {
    pub fn new(config: TooltipConfig) -> Self {
        Self {
            config,
            state: HoverState::Idle,
            content: None,
            position: (0.0, 0.0),
            fade: Fade {
                from: 0.0,
                to: 0.0,
                start: 0.0,
                duration: 0.0,
            },
        }
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn content(&self) -> Option<&TooltipContent> {
        self.content.as_ref()
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    /// Hidden, idle, no transition in flight.
    pub fn reset(&mut self) {
        self.state = HoverState::Idle;
        self.content = None;
        self.fade = Fade {
            from: 0.0,
            to: 0.0,
            start: 0.0,
            duration: 0.0,
        };
    }

    pub fn pointer_move(&mut self, leaf: &PositionedLeaf, pointer: (f64, f64), now: f64) {
        if self.state != HoverState::Hovering(leaf.index) {
            tracing::trace!(leaf = leaf.index, name = %leaf.name, "hover");
        }
        self.state = HoverState::Hovering(leaf.index);
        self.content = Some(TooltipContent::from_leaf(leaf));
        self.position = (
            pointer.0 + self.config.offset_x,
            pointer.1 + self.config.offset_y,
        );
        self.transition(self.config.opacity, now);
    }

    pub fn pointer_leave(&mut self, now: f64) {
        if self.state == HoverState::Idle {
            return;
        }
        self.state = HoverState::Idle;
        self.transition(0.0, now);
    }

    fn transition(&mut self, to: f32, now: f64) {
        if self.fade.to == to {
            return;
        }
        self.fade = Fade {
            from: self.opacity(now),
            to,
            start: now,
            duration: self.config.fade_ms as f64 / 1000.0,
        };
    }

    pub fn opacity(&self, now: f64) -> f32 {
        self.fade.at(now)
    }

    pub fn is_hidden(&self, now: f64) -> bool {
        self.opacity(now) <= 0.0
    }

    /// A fade is still running.
    pub fn is_animating(&self, now: f64) -> bool {
        self.opacity(now) != self.fade.to
    }
}

impl Default for Tooltip {
    fn default() -> Self {
        Self::new(TooltipConfig::default())
    }
}

pub fn hit_test(leaves: &[PositionedLeaf], x: f64, y: f64) -> Option<&PositionedLeaf> {
    leaves.iter().find(|l| l.rect.contains(x, y))
}
