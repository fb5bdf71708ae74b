use std::cmp::Ordering;

use crate::cartesian::{CartesianPoint2d, Orientation};

/// Convex hull of a point set, in counterclockwise order, without repeating the first point.
///
/// Collinear points on the hull edges are dropped. Returns the input (deduplicated) if there are
/// fewer than three distinct points.
pub fn convex_hull<P: CartesianPoint2d + Clone>(points: &[P]) -> Vec<P> {
    let mut sorted: Vec<P> = points.to_vec();
    sorted.sort_by(|a, b| {
        a.x()
            .partial_cmp(&b.x())
            .unwrap_or(Ordering::Equal)
            .then(a.y().partial_cmp(&b.y()).unwrap_or(Ordering::Equal))
    });
    sorted.dedup_by(|a, b| a.equal(b));

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<P> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        push_hull_point(&mut lower, p);
    }

    let mut upper: Vec<P> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        push_hull_point(&mut upper, p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn push_hull_point<P: CartesianPoint2d + Clone>(chain: &mut Vec<P>, p: &P) {
    while chain.len() >= 2 {
        let a = &chain[chain.len() - 2];
        let b = &chain[chain.len() - 1];
        if Orientation::triplet(a, b, p) == Orientation::Counterclockwise {
            break;
        }
        chain.pop();
    }
    chain.push(p.clone());
}
