use crate::layout::Led;

/// Lights held by a leaf before it splits.
const LEAF_CAPACITY: usize = 8;

/// Depth at which leaves stop splitting, so stacked lights cannot recurse forever.
const MAX_DEPTH: u8 = 10;

/// Closed axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub const UNIT: Self = Self {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 1.0,
        max_y: 1.0,
    };

    /// Rectangle of `width` x `height` centred on `(x, y)`.
    pub fn centered(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x: x - width / 2.0,
            min_y: y - height / 2.0,
            max_x: x + width / 2.0,
            max_y: y + height / 2.0,
        }
    }

    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    fn quadrants(&self) -> [Rect; 4] {
        let mid_x = (self.min_x + self.max_x) / 2.0;
        let mid_y = (self.min_y + self.max_y) / 2.0;
        [
            Rect { max_x: mid_x, max_y: mid_y, ..*self },
            Rect { min_x: mid_x, max_y: mid_y, ..*self },
            Rect { max_x: mid_x, min_y: mid_y, ..*self },
            Rect { min_x: mid_x, min_y: mid_y, ..*self },
        ]
    }
}

#[derive(Debug)]
enum Node {
    Leaf(Vec<Led>),
    Branch(Box<[Quad; 4]>),
}

#[derive(Debug)]
struct Quad {
    bounds: Rect,
    depth: u8,
    node: Node,
}

impl Quad {
    fn new(bounds: Rect, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            node: Node::Leaf(Vec::new()),
        }
    }

    fn child_for(bounds: &Rect, x: f32, y: f32) -> usize {
        let mid_x = (bounds.min_x + bounds.max_x) / 2.0;
        let mid_y = (bounds.min_y + bounds.max_y) / 2.0;
        usize::from(x >= mid_x) + 2 * usize::from(y >= mid_y)
    }

    fn insert(&mut self, led: Led) {
        match &mut self.node {
            Node::Branch(children) => {
                children[Self::child_for(&self.bounds, led.x(), led.y())].insert(led);
            }
            Node::Leaf(leds) => {
                leds.push(led);
                if leds.len() > LEAF_CAPACITY && self.depth < MAX_DEPTH {
                    self.split();
                }
            }
        }
    }

    fn split(&mut self) {
        let Node::Leaf(leds) = std::mem::replace(&mut self.node, Node::Leaf(Vec::new())) else {
            return;
        };
        let depth = self.depth + 1;
        let children = self.bounds.quadrants().map(|bounds| Quad::new(bounds, depth));
        self.node = Node::Branch(Box::new(children));
        for led in leds {
            self.insert(led);
        }
    }

    fn query(&self, area: &Rect, found: &mut Vec<usize>) {
        if !self.bounds.intersects(area) {
            return;
        }
        match &self.node {
            Node::Leaf(leds) => found.extend(
                leds.iter()
                    .filter(|led| area.contains(led.x(), led.y()))
                    .map(Led::index),
            ),
            Node::Branch(children) => {
                for child in children.iter() {
                    child.query(area, found);
                }
            }
        }
    }
}

/// Region mask over light positions in the unit square.
#[derive(Debug)]
pub(crate) struct Quadtree {
    root: Quad,
}

impl Quadtree {
    pub fn new(leds: &[Led]) -> Self {
        let mut root = Quad::new(Rect::UNIT, 0);
        for &led in leds {
            debug_assert!(Rect::UNIT.contains(led.x(), led.y()), "{led:?} outside unit square");
            root.insert(led);
        }
        Self { root }
    }

    /// Indices of every light inside `area`, ascending.
    pub fn query(&self, area: &Rect) -> Vec<usize> {
        let mut found = Vec::new();
        self.root.query(area, &mut found);
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(side: usize) -> Vec<Led> {
        (0..side * side)
            .map(|i| {
                let x = (i % side) as f32 / (side - 1) as f32;
                let y = (i / side) as f32 / (side - 1) as f32;
                Led::new(i, x, y)
            })
            .collect()
    }

    #[test]
    fn test_query_matches_linear_scan() {
        let leds = grid(11);
        let tree = Quadtree::new(&leds);
        let area = Rect::centered(0.37, 0.61, 0.3, 0.2);

        let expected: Vec<usize> = leds
            .iter()
            .filter(|led| area.contains(led.x(), led.y()))
            .map(Led::index)
            .collect();

        assert!(!expected.is_empty());
        assert_eq!(tree.query(&area), expected);
    }

    #[test]
    fn test_query_includes_border_points() {
        let tree = Quadtree::new(&grid(3));
        // Exactly covers the middle column x = 0.5.
        let area = Rect::centered(0.5, 0.5, 0.0, 1.0);
        assert_eq!(tree.query(&area), vec![1, 4, 7]);
    }

    #[test]
    fn test_query_outside_is_empty() {
        let tree = Quadtree::new(&grid(5));
        assert!(tree.query(&Rect::centered(3.0, 3.0, 0.5, 0.5)).is_empty());
    }

    #[test]
    fn test_stacked_points_do_not_recurse_forever() {
        let leds: Vec<Led> = (0..64).map(|i| Led::new(i, 0.25, 0.25)).collect();
        let tree = Quadtree::new(&leds);
        let found = tree.query(&Rect::centered(0.25, 0.25, 0.01, 0.01));
        assert_eq!(found, (0..64).collect::<Vec<_>>());
    }
}
