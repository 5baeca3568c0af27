use crate::grid::GridPoint;

/// Lazy Bresenham walk between two grid points, both ends inclusive.
///
/// Every step moves at most one cell on each axis, so painting every yielded
/// cell leaves no gaps however far the pointer jumped between two events.
#[derive(Clone, Debug)]
pub struct LinePath {
    x: i32,
    y: i32,
    end: GridPoint,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    error: i32,
    done: bool,
}

impl LinePath {
    pub fn new(from: GridPoint, to: GridPoint) -> Self {
        let dx = (to.x - from.x).abs();
        let dy = (to.y - from.y).abs();
        Self {
            x: from.x,
            y: from.y,
            end: to,
            dx,
            dy,
            sx: if from.x > to.x { -1 } else { 1 },
            sy: if from.y > to.y { -1 } else { 1 },
            error: dx - dy,
            done: false,
        }
    }
}

impl Iterator for LinePath {
    type Item = GridPoint;

    fn next(&mut self) -> Option<GridPoint> {
        if self.done {
            return None;
        }
        let current = GridPoint::new(self.x, self.y);
        if current == self.end {
            self.done = true;
            return Some(current);
        }

        let e2 = self.error * 2;
        if e2 > -self.dy {
            self.error -= self.dy;
            self.x += self.sx;
        }
        if e2 < self.dx {
            self.error += self.dx;
            self.y += self.sy;
        }
        Some(current)
    }
}

impl std::iter::FusedIterator for LinePath {}

/// All cells on the line from `from` to `to`, in walk order.
/// Always `max(|dx|, |dy|) + 1` points long.
pub fn trace(from: GridPoint, to: GridPoint) -> Vec<GridPoint> {
    LinePath::new(from, to).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    #[test]
    fn single_point_line() {
        assert_eq!(trace(p(3, -2), p(3, -2)), vec![p(3, -2)]);
    }

    #[test]
    fn shallow_stroke_picks_staircase_cells() {
        assert_eq!(
            trace(p(0, 0), p(3, 1)),
            vec![p(0, 0), p(1, 0), p(2, 1), p(3, 1)]
        );
    }

    #[test]
    fn straight_lines() {
        assert_eq!(trace(p(0, 0), p(0, 3)), vec![p(0, 0), p(0, 1), p(0, 2), p(0, 3)]);
        assert_eq!(trace(p(2, 5), p(0, 5)), vec![p(2, 5), p(1, 5), p(0, 5)]);
        assert_eq!(trace(p(0, 0), p(-2, -2)), vec![p(0, 0), p(-1, -1), p(-2, -2)]);
    }

    #[test]
    fn paths_are_gap_free_and_minimal() {
        let from = p(0, 0);
        for x in -7..=7 {
            for y in -7..=7 {
                let to = p(x, y);
                let path = trace(from, to);

                assert_eq!(path.first(), Some(&from));
                assert_eq!(path.last(), Some(&to));
                assert_eq!(path.len(), (x.abs().max(y.abs()) + 1) as usize);
                for pair in path.windows(2) {
                    let step = (pair[1].x - pair[0].x).abs().max((pair[1].y - pair[0].y).abs());
                    assert_eq!(step, 1, "gap between {:?} and {:?}", pair[0], pair[1]);
                }
            }
        }
    }

    #[test]
    fn reversed_path_has_same_length_and_endpoints() {
        let cases = [(p(0, 0), p(3, 1)), (p(5, 2), p(-4, 9)), (p(1, 1), p(1, 8)), (p(-3, 0), p(4, 4))];
        for (a, b) in cases {
            let forward = trace(a, b);
            let backward = trace(b, a);
            assert_eq!(forward.len(), backward.len());
            assert_eq!(forward.first(), backward.last());
            assert_eq!(forward.last(), backward.first());
        }
    }

    #[test]
    fn iterator_is_fused() {
        let mut path = LinePath::new(p(0, 0), p(1, 0));
        assert_eq!(path.next(), Some(p(0, 0)));
        assert_eq!(path.next(), Some(p(1, 0)));
        assert_eq!(path.next(), None);
        assert_eq!(path.next(), None);
    }
}
