//! Internal utility functions and helpers.

pub(crate) mod atomic;
pub(crate) mod infbounds;

// indices of *all* elements of an iterator satisfying a predicate,
// i.e. a vectorized std::iter::position

pub(crate) trait PositionAll<T>: Iterator<Item = T> {
    fn position_all<F>(&mut self, predicate: F) -> Vec<usize>
    where
        F: FnMut(&T) -> bool;
}

impl<T, I> PositionAll<T> for I
where
    I: Iterator<Item = T>,
{
    fn position_all<F>(&mut self, mut f: F) -> Vec<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.enumerate()
            .filter_map(|(index, item)| f(&item).then_some(index))
            .collect()
    }
}

#[test]
fn test_position_all() {
    let b = [1.0, 1e21, -3.0, f64::INFINITY];
    let idx = b.iter().position_all(|&v| *v < 1e20);
    assert_eq!(idx, vec![0, 2]);

    let idx = b.iter().position_all(|&v| *v == 2.0);
    assert_eq!(idx, Vec::<usize>::new());
}
