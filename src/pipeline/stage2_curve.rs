/// Area under the step function through `(x, y)` after the envelope correction.
///
/// The sequences are padded with `(0, 0)` in front and `(1, 0)` at the back,
/// `y` is replaced by its running maximum taken from the right, and the area
/// is summed over the positions where `x` changes. Used for both AP
/// (recall, precision) and AR (exp(-threshold), recall).
pub fn integrate(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());

    let mut mx = Vec::with_capacity(x.len() + 2);
    mx.push(0.0);
    mx.extend_from_slice(x);
    mx.push(1.0);

    let mut my = Vec::with_capacity(y.len() + 2);
    my.push(0.0);
    my.extend_from_slice(y);
    my.push(0.0);

    for i in (1..my.len()).rev() {
        my[i - 1] = my[i - 1].max(my[i]);
    }

    let mut area = 0.0;
    for i in 0..mx.len() - 1 {
        if mx[i + 1] != mx[i] {
            area += (mx[i + 1] - mx[i]) * my[i + 1];
        }
    }
    area
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_curve.rs"]
mod tests;
