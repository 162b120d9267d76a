use crate::error::{Error, Result};
use crate::matrix::Matrix;

fn check_shapes(a: &Matrix, b: &Matrix, c: &Matrix) -> Result<()> {
    if a.cols() != b.rows() || c.shape() != (a.rows(), b.cols()) {
        return Err(Error::ShapeMismatch { lhs: a.shape(), rhs: b.shape(), out: c.shape() });
    }
    Ok(())
}

/// Accumulates `A * B` into `c` on the calling thread.
///
/// Uses i-k-j loop order so the innermost loop walks a row of `b` and a row
/// of `c` sequentially. `c` is expected to be zeroed; existing values are
/// added to, not replaced.
pub fn multiply_serial(a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
    check_shapes(a, b, c)?;
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    let (a, b, c) = (a.as_slice(), b.as_slice(), c.as_mut_slice());

    for i in 0..m {
        for p in 0..k {
            let a_ip = a[i * k + p];
            let b_row = &b[p * n..(p + 1) * n];
            let c_row = &mut c[i * n..(i + 1) * n];
            for (c_ij, b_pj) in c_row.iter_mut().zip(b_row) {
                *c_ij += a_ip * b_pj;
            }
        }
    }
    Ok(())
}

/// Textbook i-j-k order, one dot product per output element.
/// Overwrites `c`.
pub fn multiply_serial_ijk(a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
    check_shapes(a, b, c)?;
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    let (a, b, c) = (a.as_slice(), b.as_slice(), c.as_mut_slice());

    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] = sum;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{analytic_product, analytic_product_reversed, Pattern};

    #[test]
    fn four_by_four_matches_closed_form() {
        let a = Matrix::with_pattern(4, 4, Pattern::Ones);
        let b = Matrix::with_pattern(4, 4, Pattern::RowIndex);
        let mut c = Matrix::zeros(4, 4);

        multiply_serial(&a, &b, &mut c).unwrap();

        assert_eq!(c, analytic_product(4));
        assert_eq!(c.row(3), &[10.0; 4]);
    }

    #[test]
    fn ramp_times_ones_scales_each_row() {
        let ramp = Matrix::with_pattern(4, 4, Pattern::RowIndex);
        let ones = Matrix::with_pattern(4, 4, Pattern::Ones);
        let mut c = Matrix::zeros(4, 4);
        let mut d = Matrix::zeros(4, 4);

        multiply_serial(&ramp, &ones, &mut c).unwrap();
        multiply_serial_ijk(&ramp, &ones, &mut d).unwrap();

        assert_eq!(c, analytic_product_reversed(4));
        assert_eq!(c.row(0), &[4.0; 4]);
        assert_eq!(c.row(3), &[16.0; 4]);
        assert_eq!(c, d);
    }

    #[test]
    fn single_element_is_exact() {
        let a = Matrix::from_vec(1, 1, vec![3.5]).unwrap();
        let b = Matrix::from_vec(1, 1, vec![-2.0]).unwrap();
        let mut c = Matrix::zeros(1, 1);
        let mut d = Matrix::zeros(1, 1);

        multiply_serial(&a, &b, &mut c).unwrap();
        multiply_serial_ijk(&a, &b, &mut d).unwrap();

        assert_eq!(c.get(0, 0), -7.0);
        assert_eq!(c, d);
    }

    #[test]
    fn rectangular_operands() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Matrix::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let mut c = Matrix::zeros(2, 2);

        multiply_serial(&a, &b, &mut c).unwrap();

        assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn accumulates_into_existing_output() {
        let a = Matrix::with_pattern(2, 2, Pattern::Ones);
        let b = Matrix::with_pattern(2, 2, Pattern::Ones);
        let mut c = Matrix::with_pattern(2, 2, Pattern::Ones);

        multiply_serial(&a, &b, &mut c).unwrap();

        assert_eq!(c.as_slice(), &[3.0; 4]);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        let mut c = Matrix::zeros(2, 3);

        let err = multiply_serial(&a, &b, &mut c).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert!(multiply_serial_ijk(&a, &b, &mut c).is_err());
    }
}
