//! Barnes-Hut quadtree for approximate repulsion.
//!
//! Cells live in one flat `Vec`; the four children of a split cell are
//! stored contiguously starting at `first_child`. Leaves hold their nodes
//! directly. Coincident nodes would split forever, so subdivision stops at
//! [`MAX_DEPTH`] and the leaf keeps every node that lands in it.

use crate::layout::codec::{NodeBuffer, NODE_MASS, NODE_SIZE};

const MAX_DEPTH: u32 = 24;

#[derive(Debug, Clone, Copy)]
struct Body {
    node: usize,
    x: f64,
    y: f64,
    mass: f64,
    size: f64,
}

#[derive(Debug, Clone)]
struct Cell {
    cx: f64,
    cy: f64,
    half: f64,
    depth: u32,
    mass: f64,
    mass_x: f64,
    mass_y: f64,
    first_child: Option<usize>,
    bodies: Vec<Body>,
}

impl Cell {
    fn new(cx: f64, cy: f64, half: f64, depth: u32) -> Self {
        Self {
            cx,
            cy,
            half,
            depth,
            mass: 0.0,
            mass_x: 0.0,
            mass_y: 0.0,
            first_child: None,
            bodies: Vec::new(),
        }
    }

    fn quadrant(&self, x: f64, y: f64) -> usize {
        let right = (x >= self.cx) as usize;
        let bottom = (y >= self.cy) as usize;
        bottom * 2 + right
    }

    fn center_of_mass(&self) -> (f64, f64) {
        (self.mass_x / self.mass, self.mass_y / self.mass)
    }
}

/// Quadtree over one node buffer.
#[derive(Debug)]
pub struct QuadTree {
    cells: Vec<Cell>,
}

impl QuadTree {
    pub fn build(nodes: &NodeBuffer) -> Self {
        let count = nodes.node_count();
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for n in 0..count {
            let (x, y) = nodes.position(n);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let root = if count == 0 || !(min_x.is_finite() && max_x.is_finite()) {
            Cell::new(0.0, 0.0, 1.0, 0)
        } else {
            let half = ((max_x - min_x).max(max_y - min_y) / 2.0).max(1.0) * 1.01;
            Cell::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0, half, 0)
        };

        let mut tree = Self { cells: vec![root] };
        for n in 0..count {
            let (x, y) = nodes.position(n);
            tree.insert(Body {
                node: n,
                x,
                y,
                mass: nodes.get(n, NODE_MASS),
                size: nodes.get(n, NODE_SIZE),
            });
        }
        tree
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn split(&mut self, cell: usize) -> usize {
        let first = self.cells.len();
        let Cell { cx, cy, half, depth, .. } = self.cells[cell];
        let q = half / 2.0;
        for (ox, oy) in [(-q, -q), (q, -q), (-q, q), (q, q)] {
            self.cells.push(Cell::new(cx + ox, cy + oy, q, depth + 1));
        }
        self.cells[cell].first_child = Some(first);
        first
    }

    fn insert(&mut self, body: Body) {
        let mut cell = 0;
        loop {
            {
                let c = &mut self.cells[cell];
                c.mass += body.mass;
                c.mass_x += body.x * body.mass;
                c.mass_y += body.y * body.mass;
            }

            if let Some(first) = self.cells[cell].first_child {
                cell = first + self.cells[cell].quadrant(body.x, body.y);
                continue;
            }

            if self.cells[cell].bodies.is_empty() || self.cells[cell].depth >= MAX_DEPTH {
                self.cells[cell].bodies.push(body);
                return;
            }

            // Occupied leaf: push its bodies one level down and retry from here.
            let displaced = std::mem::take(&mut self.cells[cell].bodies);
            let first = self.split(cell);
            for old in displaced {
                let q = self.cells[cell].quadrant(old.x, old.y);
                let child = &mut self.cells[first + q];
                child.mass += old.mass;
                child.mass_x += old.x * old.mass;
                child.mass_y += old.y * old.mass;
                child.bodies.push(old);
            }
            cell = first + self.cells[cell].quadrant(body.x, body.y);
        }
    }

    /// Repulsive force on node `n` from every other node, approximated with `theta`.
    pub fn repulsion(
        &self,
        nodes: &NodeBuffer,
        n: usize,
        coefficient: f64,
        theta: f64,
        adjust_sizes: bool,
    ) -> (f64, f64) {
        let (x, y) = nodes.position(n);
        let mass = nodes.get(n, NODE_MASS);
        let size = nodes.get(n, NODE_SIZE);
        let (mut fx, mut fy) = (0.0f64, 0.0f64);
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let cell = &self.cells[index];
            if cell.mass == 0.0 {
                continue;
            }

            if let Some(first) = cell.first_child {
                let (mx, my) = cell.center_of_mass();
                let (dx, dy) = (x - mx, y - my);
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > 0.0 && (2.0 * cell.half) / dist < theta {
                    let factor = coefficient * mass * cell.mass / (dist * dist);
                    fx += dx * factor;
                    fy += dy * factor;
                } else {
                    stack.extend(first..first + 4);
                }
                continue;
            }

            for body in &cell.bodies {
                if body.node == n {
                    continue;
                }
                let (dx, dy) = (x - body.x, y - body.y);
                let factor = pair_factor(dx, dy, mass, body.mass, size, body.size, coefficient, adjust_sizes);
                fx += dx * factor;
                fy += dy * factor;
            }
        }

        (fx, fy)
    }
}

/// Repulsion factor between two bodies; multiply by the offset to get the force.
#[allow(clippy::too_many_arguments)]
pub(crate) fn pair_factor(
    dx: f64,
    dy: f64,
    m1: f64,
    m2: f64,
    s1: f64,
    s2: f64,
    coefficient: f64,
    adjust_sizes: bool,
) -> f64 {
    if adjust_sizes {
        let distance = (dx * dx + dy * dy).sqrt() - s1 - s2;
        if distance > 0.0 {
            coefficient * m1 * m2 / (distance * distance)
        } else if distance < 0.0 {
            100.0 * coefficient * m1 * m2
        } else {
            0.0
        }
    } else {
        let distance = dx * dx + dy * dy;
        if distance > 0.0 {
            coefficient * m1 * m2 / distance
        } else {
            0.0
        }
    }
}
