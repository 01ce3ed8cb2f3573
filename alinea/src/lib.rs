//! Alinea - Lazy linear-algebra expressions with alias-aware assignment
//!
//! Expressions such as `&a * &b + &c` build a tree without computing
//! anything. Assigning the tree to a destination evaluates it in one fused
//! pass, unless the destination is also read by the expression in a way
//! that would let the write clobber values still needed; then the result
//! goes through a temporary first.
//!
//! ```ignore
//! use alinea::prelude::*;
//!
//! let m = Var::new(DenseMatrix::from_rows(vec![vec![1, 2], vec![3, 4]])?);
//! m.assign(trans(&m))?; // transposed through a temporary
//! ```

pub use alinea_core::{
    codes, resolve, same_values, shape_error, AlineaError, Density, Element, ErrorKind, Kind,
    OpKind, Operand, Orientation, Result, ResultType, Shape, StorageError, StorageId, Target,
};
pub use alinea_expr::{
    can_alias, classify, cross, eval, expr, hadamard, inner, is_aliased, kernels, materialize,
    outer, trans, AliasRule, AssignOp, EvalContext, Expr, Factor, IntoExpr, Kernel, Leaf, Node,
    Op, Strategy, TraceStep, Var, Verdict,
};
pub use alinea_storage::{
    to_dmatrix, transfer, Container, DenseMatrix, DenseVector, SparseMatrix, SparseVector, Store,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use alinea_expr::prelude::*;
    pub use alinea_storage::Store;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::*;

    fn dense(rows: Vec<Vec<i64>>) -> Var<DenseMatrix<i64>> {
        Var::new(DenseMatrix::from_rows(rows).unwrap())
    }

    /// Deterministic, non-symmetric test matrix
    fn sample(rows: usize, cols: usize, seed: i64) -> DenseMatrix<i64> {
        let data = (0..rows)
            .map(|r| (0..cols).map(|c| ((r as i64 * 7 + c as i64 * 3 + seed) % 11) - 5).collect())
            .collect();
        DenseMatrix::from_rows(data).unwrap()
    }

    /// The 3×4 sparse fixture
    fn fixture() -> SparseMatrix<i64> {
        SparseMatrix::from_triplets(
            3,
            4,
            Orientation::RowMajor,
            vec![
                (0, 0, -1),
                (0, 2, -2),
                (1, 1, 2),
                (1, 2, -3),
                (1, 3, 1),
                (2, 1, 1),
                (2, 2, 2),
                (2, 3, 2),
            ],
        )
        .unwrap()
    }

    fn same<A: Operand<Elem = i64>, B: Operand<Elem = i64>>(a: &Var<A>, b: &Var<B>) -> bool {
        same_values(&*a.borrow(), &*b.borrow())
    }

    mod property_tests {
        use super::*;

        #[test]
        fn test_in_place_add_matches_fresh_result() {
            for len in 0..6 {
                let v = Var::new(DenseVector::from_vec((0..len as i64).collect()));
                let w = Var::new(DenseVector::from_vec((0..len as i64).map(|x| 3 - x * x).collect()));
                let result = Var::new(DenseVector::<i64>::zeros(0));
                result.assign(&v + &w).unwrap();
                v.assign(&v + &w).unwrap();
                assert!(same(&v, &result), "length {}", len);
            }
        }

        #[test]
        fn test_compound_product_matches_fresh_result() {
            for n in 1..5 {
                let m = Var::new(sample(n, n, n as i64));
                let result = Var::new(DenseMatrix::<i64>::zeros(0, 0));
                result.assign(&m).unwrap();
                result.mul_assign(&m).unwrap();

                let copy = Var::new(DenseMatrix::<i64>::zeros(0, 0));
                copy.assign(&m).unwrap();
                copy.mul_assign(&copy).unwrap();
                assert!(same(&copy, &result), "size {}", n);

                let direct = Var::new(DenseMatrix::<i64>::zeros(0, 0));
                direct.assign(&m * &m).unwrap();
                assert!(same(&direct, &result), "size {}", n);
            }
        }

        #[test]
        fn test_self_transpose_matches_fresh_result() {
            for (rows, cols) in [(1, 1), (2, 2), (3, 3), (4, 4), (2, 3)] {
                let m = Var::new(sample(rows, cols, 1));
                let result = Var::new(DenseMatrix::<i64>::zeros(0, 0));
                result.assign(trans(&m)).unwrap();
                m.assign(trans(&m)).unwrap();
                assert_eq!(m.borrow().shape(), Shape::new(cols, rows));
                assert!(same(&m, &result), "{}×{}", rows, cols);
            }
        }

        #[test]
        fn test_result_type_is_stable() {
            let a = Var::new(fixture());
            let b = dense(vec![vec![1, 0], vec![0, 1], vec![2, 2], vec![1, 1]]);
            let c = Var::new(SparseMatrix::<i64>::new(3, 2));
            let first = (&a * &b + &c).result_type().unwrap();
            let second = (&a * &b + &c).result_type().unwrap();
            assert_eq!(first, second);
            assert_eq!(first.shape, Shape::new(3, 2));
            assert_eq!(first.density, Density::Dense);
        }

        fn candidates<'a>(
            d: &'a Var<DenseMatrix<i64>>,
            w: &'a Var<DenseMatrix<i64>>,
        ) -> Vec<Expr<'a, i64>> {
            vec![
                d + w,
                trans(d) - w,
                d * w + d,
                -w,
                eval(w * d) + w,
                d * 3i64,
                hadamard(d, w),
            ]
        }

        #[test]
        fn test_every_strategy_matches_a_fresh_destination() {
            let w = Var::new(sample(3, 3, 5));
            let count = candidates(&w, &w).len();
            for i in 0..count {
                let d = Var::new(sample(3, 3, 2));
                let fresh = Var::new(DenseMatrix::<i64>::zeros(0, 0));
                fresh.assign(candidates(&d, &w).swap_remove(i)).unwrap();
                d.assign(candidates(&d, &w).swap_remove(i)).unwrap();
                assert!(same(&d, &fresh), "case {}", i);

                let forced = Var::new(sample(3, 3, 2));
                let mut ctx = EvalContext::new().with_strategy_override(Some(Strategy::Temporary));
                ctx.assign(&forced, candidates(&forced, &w).swap_remove(i)).unwrap();
                assert!(same(&forced, &fresh), "case {}", i);
            }
        }

        #[test]
        fn test_empty_shapes() {
            let v = Var::new(DenseVector::from_vec(vec![1i64, 2, 3]));
            let e = Var::new(DenseVector::<i64>::zeros(0));
            v.assign(&e + &e).unwrap();
            assert_eq!(v.borrow().len(), 0);

            let m = dense(vec![vec![1, 2], vec![3, 4]]);
            let z = Var::new(DenseMatrix::<i64>::zeros(0, 3));
            m.assign(&z + &z).unwrap();
            assert_eq!(m.borrow().shape(), Shape::new(0, 3));
            assert!(m.borrow().to_rows().is_empty());

            let p = Var::new(sample(3, 2, 0));
            let q = Var::new(DenseMatrix::<i64>::zeros(2, 0));
            m.assign(&p * &q).unwrap();
            assert_eq!(m.borrow().shape(), Shape::new(3, 0));
            assert_eq!(m.borrow().nnz(), 0);

            let s = Var::new(fixture());
            let t = Var::new(SparseMatrix::<i64>::new(0, 4));
            s.assign(&t).unwrap();
            assert_eq!(s.borrow().shape(), Shape::new(0, 4));
            assert_eq!(s.borrow().nnz(), 0);
        }

        #[test]
        fn test_empty_inner_dimension_gives_zeros() {
            let a = Var::new(DenseMatrix::<i64>::zeros(2, 0));
            let b = Var::new(DenseMatrix::<i64>::zeros(0, 3));
            let c = Var::new(DenseMatrix::<i64>::zeros(0, 0));
            c.assign(&a * &b).unwrap();
            assert_eq!(c.borrow().to_rows(), vec![vec![0; 3]; 2]);
        }
    }

    mod fixture_tests {
        use super::*;

        #[test]
        fn test_matrix_vector_into_its_own_matrix() {
            let a = Var::new(fixture());
            let x = Var::new(SparseVector::from_dense(&[-1, 0, -3, 2]));
            let reference: Vec<i64> = a
                .borrow()
                .to_rows()
                .iter()
                .map(|row| row.iter().zip([-1, 0, -3, 2]).map(|(p, q)| p * q).sum())
                .collect();
            assert_eq!(reference, vec![7, 11, -2]);

            let result = Var::new(SparseVector::<i64>::new(0));
            result.assign(&a * &x).unwrap();

            let mut ctx = EvalContext::new().with_tracing(true);
            ctx.assign(&a, &a * &x).unwrap();
            assert_eq!(a.borrow().shape(), Shape::new(3, 1));
            assert!(same(&a, &result));
            assert_eq!(
                a.borrow().to_rows(),
                reference.iter().map(|&v| vec![v]).collect::<Vec<_>>()
            );
            assert_eq!(
                ctx.last_step().unwrap().verdict,
                Verdict::temporary(AliasRule::ReductionRequiresTemporary)
            );
        }

        #[test]
        fn test_sparse_matrix_product() {
            let a = Var::new(fixture());
            let b = Var::new(
                SparseMatrix::from_triplets(
                    4,
                    2,
                    Orientation::ColumnMajor,
                    vec![(0, 0, 1), (1, 1, 2), (2, 0, -1), (3, 1, 3)],
                )
                .unwrap(),
            );
            let sparse = Var::new(SparseMatrix::<i64>::new(0, 0));
            sparse.assign(&a * &b).unwrap();
            assert_eq!(sparse.borrow().to_rows(), vec![vec![1, 0], vec![3, 7], vec![-2, 8]]);

            let da = Var::new(DenseMatrix::from_rows(a.borrow().to_rows()).unwrap());
            let db = Var::new(DenseMatrix::from_rows(b.borrow().to_rows()).unwrap());
            let reference = Var::new(DenseMatrix::<i64>::zeros(0, 0));
            reference.assign(&da * &db).unwrap();
            assert!(same(&sparse, &reference));

            let mixed = Var::new(DenseMatrix::<i64>::zeros(0, 0));
            mixed.assign(&a * &db).unwrap();
            assert!(same(&mixed, &reference));

            a.assign(&a * &b).unwrap();
            assert!(same(&a, &reference));
        }

        #[test]
        fn test_row_vector_times_matrix() {
            let start = vec![2i64, -1, 3];
            for order in [Orientation::RowMajor, Orientation::ColumnMajor] {
                let m = Var::new(DenseMatrix::from_rows_in(sample(3, 3, 1).to_rows(), order).unwrap());
                let sm = Var::new(SparseMatrix::from_operand(&*m.borrow(), order));
                let rows = m.borrow().to_rows();
                let reference: Vec<i64> =
                    (0..3).map(|j| (0..3).map(|i| start[i] * rows[i][j]).sum()).collect();

                let a = Var::new(DenseVector::row_from_vec(start.clone()));
                let mut ctx = EvalContext::new().with_tracing(true);
                ctx.assign(&a, &a * &m).unwrap();
                assert_eq!(a.borrow().as_slice(), reference.as_slice());
                assert_eq!(
                    ctx.last_step().unwrap().verdict,
                    Verdict::temporary(AliasRule::ReductionRequiresTemporary)
                );

                let b = Var::new(DenseVector::row_from_vec(start.clone()));
                b.mul_assign(&sm).unwrap();
                assert_eq!(b.borrow().as_slice(), reference.as_slice());

                let s = Var::new(SparseVector::from_dense(&start).into_row());
                s.assign(&s * &sm).unwrap();
                assert_eq!(s.borrow().to_rows(), vec![reference.clone()]);

                let t = Var::new(SparseVector::from_dense(&start).into_row());
                t.mul_assign(&m).unwrap();
                assert_eq!(t.borrow().to_rows(), vec![reference.clone()]);
            }
        }

        /// Runs `step` on a copy of `c` and then on `c` itself
        fn matches_copy(
            c: &Var<SparseMatrix<i64>>,
            step: impl Fn(&Var<SparseMatrix<i64>>) -> Result<()>,
        ) {
            let copy = Var::new(c.snapshot());
            step(&copy).unwrap();
            step(c).unwrap();
            assert!(same(c, &copy));
        }

        #[test]
        fn test_sparse_compound_through_products() {
            for order in [Orientation::RowMajor, Orientation::ColumnMajor] {
                let sparse = |seed| Var::new(SparseMatrix::from_operand(&sample(3, 3, seed), order));
                let d = sparse(1);
                let e = sparse(2);

                let c = sparse(0);
                matches_copy(&c, |dst| dst.add_assign(&c * &e));
                let c = sparse(0);
                matches_copy(&c, |dst| dst.sub_assign(&d * &c));
                let c = sparse(0);
                matches_copy(&c, |dst| dst.mul_assign(&c * &e));

                let c = sparse(0);
                matches_copy(&c, |dst| dst.add_assign((&d * &c) * &e));
                let c = sparse(0);
                matches_copy(&c, |dst| dst.sub_assign(&d * (&c * &e)));
                let c = sparse(0);
                matches_copy(&c, |dst| dst.mul_assign(&d * (&c * &e)));

                // the destination on the right of a product it is assigned from
                let c = sparse(0);
                let reference = Var::new(DenseMatrix::<i64>::zeros(0, 0));
                reference.assign(&e * &c).unwrap();
                c.assign(&e * &c).unwrap();
                assert!(same(&c, &reference));
            }
        }

        #[test]
        fn test_sparse_outer_product() {
            let a = Var::new(SparseVector::from_entries(3, vec![(0, 2), (2, -1)]).unwrap());
            let b = Var::new(SparseVector::from_entries(4, vec![(1, 3), (3, 1)]).unwrap().into_row());
            let c = Var::new(SparseMatrix::<i64>::new(0, 0));
            c.assign(&a * &b).unwrap();
            assert_eq!(c.borrow().nnz(), 4);
            assert_eq!(
                c.borrow().to_rows(),
                vec![vec![0, 6, 0, 2], vec![0, 0, 0, 0], vec![0, -3, 0, -1]]
            );

            let column = Var::new(SparseVector::from_entries(4, vec![(1, 3), (3, 1)]).unwrap());
            let d = Var::new(DenseMatrix::<i64>::zeros(0, 0));
            d.assign(outer(&a, &column)).unwrap();
            assert!(same(&c, &d));
        }

        #[test]
        fn test_sparse_vector_sums() {
            let a = Var::new(SparseVector::from_entries(5, vec![(0, 1), (3, 2)]).unwrap());
            let b = Var::new(SparseVector::from_entries(5, vec![(1, 4), (3, -2), (4, 1)]).unwrap());

            let c = Var::new(SparseVector::<i64>::new(0));
            c.assign(&a + &b).unwrap();
            assert_eq!(c.borrow().entries(), &[(0, 1), (1, 4), (3, 0), (4, 1)]);

            a.assign(&a + &b).unwrap();
            assert!(same(&a, &c));

            a.sub_assign(&b).unwrap();
            assert_eq!(a.borrow().to_rows(), vec![vec![1], vec![0], vec![0], vec![2], vec![0]]);

            let d = Var::new(DenseVector::from_vec(vec![1i64; 5]));
            let mixed = Var::new(DenseVector::<i64>::zeros(0));
            mixed.assign(&b + &d).unwrap();
            assert_eq!(mixed.borrow().as_slice(), &[1, 5, 1, -1, 2]);
        }

        #[test]
        fn test_cross_product() {
            let a = Var::new(DenseVector::row_from_vec(vec![1i64, 2, 3]));
            let b = Var::new(DenseVector::row_from_vec(vec![4i64, 5, 6]));
            let c = Var::new(DenseVector::<i64>::zeros_row(0));
            c.assign(cross(&a, &b)).unwrap();
            assert_eq!(c.borrow().as_slice(), &[-3, 6, -3]);

            a.assign(cross(&a, &b)).unwrap();
            assert!(same(&a, &c));

            let short = Var::new(DenseVector::row_from_vec(vec![1i64, 2]));
            let err = c.assign(cross(&short, &short)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_fixed_extent_mismatch() {
            let m = Var::new(sample(2, 2, 0).with_fixed_extent());
            let before = m.snapshot();
            let n = Var::new(sample(3, 3, 0));
            let err = m.assign(&n).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
            assert_eq!(m.snapshot(), before);

            let same_shape = Var::new(sample(2, 2, 4));
            m.assign(&same_shape).unwrap();
            assert!(!m.borrow().is_resizable());
        }

        #[test]
        fn test_vector_destination_keeps_its_orientation() {
            let v = Var::new(DenseVector::from_vec(vec![1i64, 2]));
            let row = Var::new(DenseVector::row_from_vec(vec![1i64, 2]));
            let err = v.assign(&row).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
            assert_eq!(v.snapshot().as_slice(), &[1, 2]);
        }

        #[test]
        fn test_out_of_order_append() {
            let mut v = SparseVector::<i64>::new(4);
            v.append(2, 0, 5).unwrap();
            let err = v.append(1, 0, 1).unwrap_err();
            assert!(matches!(err, StorageError::OutOfOrderAppend { last: 2, .. }));
            assert_eq!(AlineaError::from(err).kind(), ErrorKind::InvalidArgument);
            assert_eq!(v.entries(), &[(2, 5)]);
        }

        #[test]
        fn test_unsafe_override_shows_the_corruption() {
            let rows = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]];
            let safe = dense(rows.clone());
            safe.assign(trans(&safe)).unwrap();

            let forced = dense(rows);
            let mut ctx = EvalContext::new()
                .with_strategy_override(Some(Strategy::InPlace))
                .allow_unsafe_override(true);
            ctx.assign(&forced, trans(&forced)).unwrap();

            assert!(!same(&forced, &safe));
            assert_eq!(
                forced.borrow().to_rows(),
                vec![vec![1, 4, 7], vec![4, 5, 8], vec![7, 8, 9]]
            );
        }

        #[test]
        fn test_operand_mismatch_surfaces_at_assignment() {
            let v = Var::new(DenseVector::from_vec(vec![1i64, 2, 3]));
            let w = Var::new(DenseVector::from_vec(vec![1i64, 2]));
            let e = &v + &w;
            assert!(e.is_error());
            let err = v.assign(e).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
            assert_eq!(err.notes, vec!["in assignment".to_string()]);
            assert_eq!(v.snapshot().as_slice(), &[1, 2, 3]);
        }
    }

    mod interop_tests {
        use super::*;
        use nalgebra::DMatrix;

        const EPSILON: f64 = 1e-12;

        fn close(a: &DMatrix<f64>, b: &DMatrix<f64>) -> bool {
            a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < EPSILON)
        }

        #[test]
        fn test_dense_product_matches_nalgebra() {
            let a = DMatrix::from_fn(3, 4, |r, c| (r * 4 + c) as f64 * 0.5 - 1.25);
            let b = DMatrix::from_fn(4, 2, |r, c| (r as f64 - c as f64) * 0.75);
            let va = Var::new(DenseMatrix::from(&a));
            let vb = Var::new(DenseMatrix::from(&b));
            let c = Var::new(DenseMatrix::<f64>::zeros(0, 0));
            c.assign(&va * &vb).unwrap();
            assert!(close(&to_dmatrix(&*c.borrow()), &(&a * &b)));

            let sa = Var::new(SparseMatrix::from_operand(&*va.borrow(), Orientation::RowMajor));
            let s = Var::new(SparseMatrix::<f64>::new(0, 0));
            s.assign(&sa * &vb).unwrap();
            assert!(close(&to_dmatrix(&*s.borrow()), &(&a * &b)));
        }

        #[test]
        fn test_square_power_matches_nalgebra() {
            let m = DMatrix::from_fn(3, 3, |r, c| if r <= c { (r + c) as f64 + 0.5 } else { -1.0 });
            let v = Var::new(DenseMatrix::from(&m));
            v.mul_assign(&v).unwrap();
            v.mul_assign(&v).unwrap();
            let expected = &m * &m * &m * &m;
            assert!(close(&to_dmatrix(&*v.borrow()), &expected));
        }

        #[test]
        fn test_container_serde_round_trip() {
            let a = Var::new(fixture());
            let x = Var::new(SparseVector::from_dense(&[-1, 0, -3, 2]));
            let value = (&a * &x).evaluate().unwrap();
            let json = serde_json::to_string(&value).unwrap();
            let back: Container<i64> = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
            assert_eq!(back.nnz(), 3);
        }
    }
}
