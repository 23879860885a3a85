//! Binary search bounds over a comparator.
//!
//! Both functions expect `slice` sorted ascending by `compare`, which orders an
//! element against the probe (`compare(element, target)`).

use std::cmp::Ordering;

/// First index `i` such that `target <= slice[i]`.
///
/// `0` if `target` is not greater than the first element, `slice.len()` if it is
/// greater than the last one.
pub fn lower_bound<T, K, F>(slice: &[T], target: &K, mut compare: F) -> usize
where
    F: FnMut(&T, &K) -> Ordering,
{
    let (mut lower, mut upper) = (0, slice.len());
    while lower < upper {
        let center = lower + (upper - lower) / 2;
        if compare(&slice[center], target) == Ordering::Less {
            lower = center + 1;
        } else {
            upper = center;
        }
    }
    lower
}

/// First index `i` such that `target < slice[i]`.
///
/// `0` if `target` is less than the first element, `slice.len()` if it is not
/// less than the last one.
pub fn upper_bound<T, K, F>(slice: &[T], target: &K, mut compare: F) -> usize
where
    F: FnMut(&T, &K) -> Ordering,
{
    let (mut lower, mut upper) = (0, slice.len());
    while lower < upper {
        let center = lower + (upper - lower) / 2;
        if compare(&slice[center], target) == Ordering::Greater {
            upper = center;
        } else {
            lower = center + 1;
        }
    }
    upper
}
