//! Layout engine for newly materialized diagrams
//!
//! Use cases and requirements go into a near-square grid. Actors are spread
//! around the grid by walking its bounding box once (left edge top-to-bottom,
//! top edge left-to-right, right edge top-to-bottom, bottom edge
//! left-to-right) and dropping one actor at each equal step.
//!
//! The computation is pure: identical ordered input always yields identical
//! coordinates.

use indexmap::IndexMap;
use needs_types::{Need, NeedType};
use serde::{Deserialize, Serialize};

use crate::host::{Bounds, ElementKind};

/// Layout configuration constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Grid cell width
    pub element_width: i32,
    /// Grid cell height
    pub element_height: i32,
    /// Horizontal gap between grid cells
    pub horizontal_spacing: i32,
    /// Vertical gap between grid rows
    pub vertical_spacing: i32,
    /// Outer margin of the whole drawing
    pub margin: i32,
    /// Space reserved left of the grid for actors
    pub left_reserve: i32,
    /// Space reserved above the grid for actors
    pub top_reserve: i32,
    /// Actor distance left of the grid
    pub actor_offset_left: i32,
    /// Actor distance above the grid
    pub actor_offset_top: i32,
    /// Actor distance right of the grid
    pub actor_offset_right: i32,
    /// Actor distance below the grid
    pub actor_offset_bottom: i32,
    /// View size for each element kind
    pub views: ViewSizes,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            element_width: 120,
            element_height: 80,
            horizontal_spacing: 40,
            vertical_spacing: 30,
            margin: 50,
            left_reserve: 200,
            top_reserve: 100,
            actor_offset_left: 150,
            actor_offset_top: 120,
            actor_offset_right: 50,
            actor_offset_bottom: 50,
            views: ViewSizes::default(),
        }
    }
}

/// Width and height of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSizes {
    pub use_case: Size,
    pub actor: Size,
    pub requirement: Size,
}

impl Default for ViewSizes {
    fn default() -> Self {
        Self {
            use_case: Size {
                width: 120,
                height: 60,
            },
            actor: Size {
                width: 60,
                height: 80,
            },
            requirement: Size {
                width: 120,
                height: 60,
            },
        }
    }
}

impl ViewSizes {
    pub fn for_kind(&self, kind: ElementKind) -> Size {
        match kind {
            ElementKind::UseCase => self.use_case,
            ElementKind::Actor => self.actor,
            ElementKind::Requirement => self.requirement,
        }
    }
}

/// Top-left corner of a placed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn bounds(&self, size: Size) -> Bounds {
        Bounds {
            x: self.x,
            y: self.y,
            width: size.width,
            height: size.height,
        }
    }
}

/// Columns and rows of the central grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub columns: usize,
    pub rows: usize,
}

impl GridShape {
    /// Near-square grid for `count` cells. Shapes wider than twice their
    /// height are recomputed from a 1.5x inflated area. Zero cells give 1x1.
    pub fn for_count(count: usize) -> Self {
        if count == 0 {
            return Self {
                columns: 1,
                rows: 1,
            };
        }
        let mut columns = (count as f64).sqrt().ceil() as usize;
        let mut rows = count.div_ceil(columns);
        if columns > rows * 2 {
            columns = ((count as f64) * 1.5).sqrt().ceil() as usize;
            rows = count.div_ceil(columns);
        }
        Self { columns, rows }
    }
}

/// Layout engine for needs
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn grid_origin(&self) -> Point {
        Point {
            x: self.config.margin + self.config.left_reserve,
            y: self.config.margin + self.config.top_reserve,
        }
    }

    /// Positions for every need, keyed by need id, in input order.
    pub fn positions<'a, I>(&self, needs: I) -> IndexMap<String, Point>
    where
        I: IntoIterator<Item = &'a Need>,
    {
        let mut central = Vec::new();
        let mut peripheral = Vec::new();
        for need in needs {
            if is_peripheral(need) {
                peripheral.push(need.id.as_str());
            } else {
                central.push(need.id.as_str());
            }
        }
        self.place(&central, &peripheral)
    }

    /// Place already-partitioned ids.
    pub fn place(&self, central: &[&str], peripheral: &[&str]) -> IndexMap<String, Point> {
        let cfg = &self.config;
        let origin = self.grid_origin();
        let shape = GridShape::for_count(central.len());
        let cell_w = cfg.element_width + cfg.horizontal_spacing;
        let cell_h = cfg.element_height + cfg.vertical_spacing;

        let mut positions = IndexMap::with_capacity(central.len() + peripheral.len());

        for (index, id) in central.iter().enumerate() {
            let column = (index % shape.columns) as i32;
            let row = (index / shape.columns) as i32;
            positions.insert(
                id.to_string(),
                Point {
                    x: origin.x + column * cell_w,
                    y: origin.y + row * cell_h,
                },
            );
        }

        let grid_w = shape.columns as i32 * cell_w - cfg.horizontal_spacing;
        let grid_h = shape.rows as i32 * cell_h - cfg.vertical_spacing;
        let perimeter = f64::from(2 * grid_w + 2 * grid_h);
        let total = peripheral.len();

        for (index, id) in peripheral.iter().enumerate() {
            let p = index as f64 / total as f64 * perimeter;
            positions.insert(id.to_string(), self.perimeter_point(origin, grid_w, grid_h, p));
        }

        tracing::debug!(
            central = central.len(),
            peripheral = peripheral.len(),
            columns = shape.columns,
            rows = shape.rows,
            "layout computed"
        );
        positions
    }

    fn perimeter_point(&self, origin: Point, grid_w: i32, grid_h: i32, p: f64) -> Point {
        let cfg = &self.config;
        let (w, h) = (f64::from(grid_w), f64::from(grid_h));
        let (x0, y0) = (f64::from(origin.x), f64::from(origin.y));

        let (x, y) = if p < h {
            (x0 - f64::from(cfg.actor_offset_left), y0 + p)
        } else if p < h + w {
            (x0 + (p - h), y0 - f64::from(cfg.actor_offset_top))
        } else if p < 2.0 * h + w {
            (
                x0 + w + f64::from(cfg.actor_offset_right),
                y0 + (p - h - w),
            )
        } else {
            (
                x0 + (p - 2.0 * h - w),
                y0 + h + f64::from(cfg.actor_offset_bottom),
            )
        };
        Point {
            x: x as i32,
            y: y as i32,
        }
    }
}

/// Actors go around the grid; use cases, requirements and unclassified needs go in it.
fn is_peripheral(need: &Need) -> bool {
    matches!(need.resolved_type(), Some(NeedType::Actor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn need(id: &str, need_type: NeedType) -> Need {
        Need::new(id, id, need_type)
    }

    #[test]
    fn test_grid_shape() {
        assert_eq!(GridShape::for_count(0), GridShape { columns: 1, rows: 1 });
        assert_eq!(GridShape::for_count(1), GridShape { columns: 1, rows: 1 });
        assert_eq!(GridShape::for_count(3), GridShape { columns: 2, rows: 2 });
        assert_eq!(GridShape::for_count(5), GridShape { columns: 3, rows: 2 });
        assert_eq!(GridShape::for_count(10), GridShape { columns: 4, rows: 3 });
    }

    #[test]
    fn test_central_grid_row_major() {
        let engine = LayoutEngine::new();
        let needs = [
            need("U1", NeedType::UseCase),
            need("U2", NeedType::UseCase),
            need("R1", NeedType::Requirement),
        ];
        let pos = engine.positions(&needs);
        assert_eq!(pos["U1"], Point { x: 250, y: 150 });
        assert_eq!(pos["U2"], Point { x: 410, y: 150 });
        assert_eq!(pos["R1"], Point { x: 250, y: 260 });
    }

    #[test]
    fn test_actors_walk_the_perimeter() {
        let engine = LayoutEngine::new();
        // One use case: grid 120x80, perimeter 400
        let needs = [
            need("U1", NeedType::UseCase),
            need("A1", NeedType::Actor),
            need("A2", NeedType::Actor),
            need("A3", NeedType::Actor),
            need("A4", NeedType::Actor),
        ];
        let pos = engine.positions(&needs);
        // p = 0 -> left edge, top
        assert_eq!(pos["A1"], Point { x: 100, y: 150 });
        // p = 100 -> top edge, 20 in
        assert_eq!(pos["A2"], Point { x: 270, y: 30 });
        // p = 200 -> right edge, 0 down
        assert_eq!(pos["A3"], Point { x: 420, y: 150 });
        // p = 300 -> bottom edge, 20 in
        assert_eq!(pos["A4"], Point { x: 270, y: 280 });
    }

    #[test]
    fn test_actor_only_input_uses_unit_grid() {
        let engine = LayoutEngine::new();
        let needs = [need("A1", NeedType::Actor)];
        let pos = engine.positions(&needs);
        assert_eq!(pos["A1"], Point { x: 100, y: 150 });
    }

    #[test]
    fn test_positions_are_deterministic() {
        let engine = LayoutEngine::new();
        let needs: Vec<Need> = (0..17)
            .map(|i| {
                let t = if i % 3 == 0 {
                    NeedType::Actor
                } else {
                    NeedType::UseCase
                };
                need(&format!("N{}", i), t)
            })
            .collect();
        assert_eq!(engine.positions(&needs), engine.positions(&needs));
    }
}
