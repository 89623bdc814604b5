//! Appearance descriptors: L2 normalization, smoothing and cosine distance.

/// Fixed-length appearance embedding of one detection crop.
pub type Descriptor = Vec<f32>;

/// Scale `v` to unit length in place. Zero vectors are left as they are.
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Fold `observed` into the running descriptor.
///
/// `smoothed = momentum * smoothed + (1 - momentum) * observed`, renormalized.
/// A length mismatch restarts the average from `observed`.
pub fn smooth(smoothed: &mut Descriptor, observed: &[f32], momentum: f32) {
    let mut observed = observed.to_vec();
    normalize(&mut observed);

    if smoothed.len() != observed.len() {
        *smoothed = observed;
        return;
    }
    for (s, o) in smoothed.iter_mut().zip(&observed) {
        *s = momentum * *s + (1.0 - momentum) * o;
    }
    normalize(smoothed);
}

/// Cosine distance `1 - cos(a, b)` in `[0, 2]`.
///
/// Returns `None` for mismatched lengths or a zero-length vector.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        return None;
    }
    Some((1.0 - dot / (na * nb)).clamp(0.0, 2.0))
}
