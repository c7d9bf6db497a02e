use std::convert::TryFrom;

use gridflux::comm::SerialCommunicator;
use gridflux::element::{ElementIndex, REFERENCE_CORNERS};
use gridflux::grid::{BoundaryType, GhostedField, Partition, StructuredGrid, Subdomain};
use gridflux::nalgebra::{DMatrix, DVector, DVectorView, Point2, Vector4};
use gridflux::plaplace::manufactured::{
    boundary_field, boundary_value, exact_solution, forcing, forcing_field, initial_iterate,
};
use gridflux::plaplace::{ElementEnergyKernel, PLaplaceParameters, PLaplaceProblem, HALO_WIDTH};
use gridflux::quadrature::QuadratureDegree;
use gridflux_optimize::calculus::{approximate_gradient_fd, approximate_jacobian_fd};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use proptest::prelude::*;

use super::{grid_and_blocks, pseudo_random_vector};

fn degree(n: usize) -> QuadratureDegree {
    QuadratureDegree::try_from(n).unwrap()
}

fn problem(mx: usize, my: usize, parameters: PLaplaceParameters) -> PLaplaceProblem {
    PLaplaceProblem::new(StructuredGrid::new(mx, my), parameters).unwrap()
}

/// A state near the manufactured solution, perturbed so that gradients do not vanish.
fn perturbed_state(problem: &PLaplaceProblem, seed: u64) -> DVector<f64> {
    exact_solution(problem) + 0.1 * pseudo_random_vector(problem.grid().num_points(), seed)
}

/// Ghosted fields `(u, f, g)` over the whole grid.
fn whole_fields(
    problem: &PLaplaceProblem,
    u: &DVector<f64>,
) -> (GhostedField<f64>, GhostedField<f64>, GhostedField<f64>) {
    let grid = problem.grid();
    let u = GhostedField::from_global(grid, grid.whole(), HALO_WIDTH, BoundaryType::Ghosted, u, f64::NAN);
    (u, forcing_field(problem, grid.whole()), boundary_field(problem, grid.whole()))
}

fn objective(problem: &PLaplaceProblem, u: &DVector<f64>) -> f64 {
    let (u, f, g) = whole_fields(problem, u);
    problem.compute_objective(&SerialCommunicator, &u, &f, &g)
}

/// Nodal values of `a + b xi + c eta + d xi eta` in local node order.
fn bilinear_nodal_values([a, b, c, d]: [f64; 4]) -> Vector4<f64> {
    Vector4::from_fn(|l, _| {
        let [xi, eta] = REFERENCE_CORNERS[l];
        a + b * xi + c * eta + d * xi * eta
    })
}

#[test]
fn element_energy_is_exact_for_quadratic_integrands() {
    // p = 2: the integrand |grad u|^2 / 2 - f u is quadratic in each variable
    let (hx, hy) = (0.2, 0.125);
    let (cx, cy) = (4.0 / (hx * hx), 4.0 / (hy * hy));
    let [a, b, c, d] = [0.3, -1.2, 0.7, 0.9];
    let u = bilinear_nodal_values([a, b, c, d]);
    let f0 = 1.7;
    let f = Vector4::repeat(f0);

    // int (b + d eta)^2 = 4 b^2 + 4 d^2 / 3 over the reference square, and int u = 4 a
    let expected = 0.25
        * hx
        * hy
        * (0.5 * (cx * (4.0 * b * b + 4.0 * d * d / 3.0) + cy * (4.0 * c * c + 4.0 * d * d / 3.0)) - 4.0 * f0 * a);

    for n in 2..=3 {
        let kernel = ElementEnergyKernel::<f64>::from_f64(2.0, 0.0, hx, hy, degree(n));
        assert_scalar_eq!(kernel.element_energy(&f, &u), expected, comp = abs, tol = 1e-12);
    }

    // A single point is exact only once the integrand is linear in each variable
    let kernel = ElementEnergyKernel::<f64>::from_f64(2.0, 0.0, hx, hy, degree(1));
    assert!((kernel.element_energy(&f, &u) - expected).abs() > 1e-6);
    let u_affine = bilinear_nodal_values([a, b, c, 0.0]);
    let expected_affine = 0.25 * hx * hy * (0.5 * (cx * 4.0 * b * b + cy * 4.0 * c * c) - 4.0 * f0 * a);
    assert_scalar_eq!(kernel.element_energy(&f, &u_affine), expected_affine, comp = abs, tol = 1e-12);
}

#[test]
fn element_energy_with_constant_gradient_matches_closed_form() {
    let (hx, hy) = (0.1, 0.1);
    let (p, eps) = (3.0, 0.5);
    let (b, c) = (0.02, -0.05);
    let u = bilinear_nodal_values([0.0, b, c, 0.0]);
    let grad_sq = 4.0 / (hx * hx) * b * b + 4.0 / (hy * hy) * c * c;
    let expected = hx * hy * (grad_sq + eps * eps).powf(p / 2.0) / p;
    for n in 1..=3 {
        let kernel = ElementEnergyKernel::<f64>::from_f64(p, eps, hx, hy, degree(n));
        assert_scalar_eq!(kernel.element_energy(&Vector4::zeros(), &u), expected, comp = abs, tol = 1e-14);
    }
}

#[test]
fn element_gradient_and_hessian_match_finite_differences() {
    let kernel = ElementEnergyKernel::<f64>::from_f64(3.5, 0.1, 0.25, 0.2, degree(3));
    let f = Vector4::new(0.4, -0.3, 1.1, 0.2);
    let u = Vector4::new(0.9, 0.1, -0.4, 0.5);

    let mut x = DVector::from_column_slice(u.as_slice());
    let fd_gradient = approximate_gradient_fd(
        |x| kernel.element_energy(&f, &Vector4::from_iterator(x.iter().copied())),
        &mut x,
        1e-6,
    );
    let gradient = kernel.element_gradient(&f, &u);
    assert_matrix_eq!(gradient, fd_gradient, comp = abs, tol = 1e-6);

    let fd_hessian = approximate_jacobian_fd(
        4,
        |x, mut out| {
            let g = kernel.element_gradient(&f, &Vector4::from_iterator(x.iter().copied()));
            out.copy_from(&g);
        },
        &mut x,
        1e-6,
    );
    let hessian = kernel.element_hessian(&u);
    assert_matrix_eq!(hessian, fd_hessian, comp = abs, tol = 1e-5);
    assert_matrix_eq!(hessian, hessian.transpose(), comp = abs, tol = 1e-12);
}

#[test]
fn element_derivatives_are_finite_at_vanishing_gradient() {
    let u = Vector4::repeat(0.3);
    let f = Vector4::repeat(1.0);
    for p in [1.5, 2.0, 3.0, 4.0] {
        let kernel = ElementEnergyKernel::<f64>::from_f64(p, 0.0, 0.1, 0.1, degree(2));
        assert!(kernel.element_energy(&f, &u).is_finite());
        assert!(kernel.element_gradient(&f, &u).iter().all(|x| x.is_finite()));
        assert!(kernel.element_hessian(&u).iter().all(|x| x.is_finite()));
    }
}

#[test]
fn manufactured_forcing_for_laplacian() {
    // For p = 2 the equation is -Laplace(g) = f
    for &(x, y) in &[(0.0, 0.0), (0.3, 0.8), (1.0, 0.5)] {
        let alpha = 1.3;
        let expected = -((x + alpha) * (x + alpha) + (y + alpha) * (y + alpha));
        assert_scalar_eq!(forcing(x, y, 2.0, alpha), expected, comp = abs, tol = 1e-12);
    }
}

#[test]
fn manufactured_forcing_matches_divergence_of_flux() {
    let (p, alpha) = (4.0, 1.0);
    // Flux |grad g|^(p - 2) grad g of the manufactured solution
    let flux = |x: f64, y: f64| {
        let (xa, ya) = (x + alpha, y + alpha);
        let (gx, gy) = (xa * ya * ya, xa * xa * ya);
        let s = (gx * gx + gy * gy).powf((p - 2.0) / 2.0);
        (s * gx, s * gy)
    };
    let h = 1e-5;
    for &(x, y) in &[(0.25, 0.5), (0.7, 0.1), (0.9, 0.9)] {
        let div = (flux(x + h, y).0 - flux(x - h, y).0) / (2.0 * h) + (flux(x, y + h).1 - flux(x, y - h).1) / (2.0 * h);
        let f = forcing(x, y, p, alpha);
        assert!((f + div).abs() <= 1e-5 * f.abs());
    }
}

#[test]
fn manufactured_fields() {
    let problem = problem(4, 3, PLaplaceParameters::default());
    assert_eq!(problem.node_coordinates(-1, -1), Point2::origin());
    assert_scalar_eq!(problem.node_coordinates(4, 3).x, 1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(problem.node_coordinates(4, 3).y, 1.0, comp = abs, tol = 1e-15);

    let g = boundary_field(&problem, problem.grid().whole());
    assert!(g.at(0, 0).is_nan());
    assert!(g.at(3, 2).is_nan());
    assert_eq!(g.at(-1, 1), boundary_value(0.0, 0.5, 1.0));
    assert_eq!(g.at(4, 3), boundary_value(1.0, 1.0, 1.0));

    let f = forcing_field(&problem, problem.grid().whole());
    assert_eq!(f.at(-1, -1), forcing(0.0, 0.0, 4.0, 1.0));
    assert_scalar_eq!(f.at(2, 1), forcing(0.6, 0.5, 4.0, 1.0), comp = abs, tol = 1e-10);

    let u0 = initial_iterate(&problem);
    let exact = exact_solution(&problem);
    assert_eq!(u0.len(), 12);
    let (x, y) = (0.2, 0.25);
    let k = problem.grid().global_index(0, 0);
    assert_scalar_eq!(
        u0[k],
        (1.0 - x) * boundary_value(0.0, y, 1.0) + x * boundary_value(1.0, y, 1.0),
        comp = abs,
        tol = 1e-14
    );
    assert_scalar_eq!(exact[k], boundary_value(x, y, 1.0), comp = abs, tol = 1e-14);
}

#[test]
fn problem_rejects_invalid_parameters() {
    let parameters = PLaplaceParameters {
        p: 0.9,
        ..PLaplaceParameters::default()
    };
    assert!(PLaplaceProblem::new(StructuredGrid::new(3, 3), parameters).is_err());
}

#[test]
fn objective_of_linear_problem_matches_closed_form() {
    // p = 2, eps = 0, zero forcing: I(u) = |grad u|^2 / 2 integrated over the square. For the
    // discrete interpolant of u = x the energy is exactly 1/2.
    let parameters = PLaplaceParameters::new(2.0, 0.0, 1.0, 2).unwrap();
    let problem = problem(5, 4, parameters);
    let grid = *problem.grid();
    let u = DVector::from_fn(grid.num_points(), |k, _| problem.node_coordinates((k % 5) as isize, 0).x);
    let u = GhostedField::from_global(&grid, grid.whole(), 1, BoundaryType::Ghosted, &u, f64::NAN);
    let g = GhostedField::from_fn(grid.whole(), 1, |i, j| problem.node_coordinates(i, j).x);
    let f = GhostedField::from_element(grid.whole(), 1, 0.0);
    assert_scalar_eq!(problem.local_objective(&u, &f, &g), 0.5, comp = abs, tol = 1e-13);
}

#[test]
fn objective_gradient_matches_finite_differences() {
    for &(p, eps) in &[(4.0, 0.0), (2.0, 0.0), (1.5, 0.3)] {
        let parameters = PLaplaceParameters::new(p, eps, 1.0, 2).unwrap();
        let problem = problem(4, 3, parameters);
        let mut u = perturbed_state(&problem, 7);

        let (u_field, f, g) = whole_fields(&problem, &u);
        let gradient = problem.compute_gradient(&u_field, &f, &g);
        let fd_gradient = approximate_gradient_fd(|x: DVectorView<f64>| objective(&problem, &x.into_owned()), &mut u, 1e-6);
        assert_matrix_eq!(gradient, fd_gradient, comp = abs, tol = 1e-6);
    }
}

#[test]
fn objective_hessian_matches_finite_differences() {
    let parameters = PLaplaceParameters::new(3.0, 0.1, 0.5, 3).unwrap();
    let problem = problem(3, 4, parameters);
    let n = problem.grid().num_points();
    let mut u = perturbed_state(&problem, 11);

    let (u_field, _, g) = whole_fields(&problem, &u);
    let hessian = DMatrix::from(&problem.compute_hessian(&u_field, &g));

    let fd_hessian = approximate_jacobian_fd(
        n,
        |x, mut out| {
            let (u, f, g) = whole_fields(&problem, &x.into_owned());
            out.copy_from(&problem.compute_gradient(&u, &f, &g));
        },
        &mut u,
        1e-6,
    );
    assert_matrix_eq!(hessian, fd_hessian, comp = abs, tol = 1e-5);
    assert_matrix_eq!(hessian, hessian.transpose(), comp = abs, tol = 1e-12);
}

#[test]
fn element_owner_is_consistent_with_owned_element_range() {
    let problem = problem(7, 5, PLaplaceParameters::default());
    let partition = Partition::new(*problem.grid(), 3, 2);
    for element in problem.elements() {
        let owner = problem.element_owner(&partition, element).unwrap();
        let (i_range, j_range) = problem.owned_element_range(&partition.subdomains()[owner]);
        assert!(i_range.contains(&element.i) && j_range.contains(&element.j));
    }
    assert_eq!(problem.elements().count(), problem.num_elements());
    assert_eq!(problem.num_elements(), 8 * 6);
}

#[test]
fn owned_element_range_of_whole_grid_covers_all_elements() {
    let problem = problem(4, 6, PLaplaceParameters::default());
    let (i_range, j_range) = problem.owned_element_range(&problem.grid().whole());
    assert_eq!(i_range, 0..=4);
    assert_eq!(j_range, 0..=6);

    let (i_range, j_range) = problem.owned_element_range(&Subdomain::new(2, 0, 2, 3));
    assert_eq!(i_range, 3..=4);
    assert_eq!(j_range, 0..=3);
    assert_eq!(problem.element_owner(&Partition::serial(*problem.grid()), ElementIndex::new(4, 6)), Some(0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_element_has_exactly_one_owner(((mx, my), (px, py)) in grid_and_blocks()) {
        let problem = problem(mx, my, PLaplaceParameters::default());
        let partition = Partition::new(*problem.grid(), px, py);
        let mut counts = vec![0; problem.num_elements()];
        for subdomain in partition.subdomains() {
            let (i_range, j_range) = problem.owned_element_range(subdomain);
            for j in j_range {
                for i in i_range.clone() {
                    counts[j as usize * (mx + 1) + i as usize] += 1;
                }
            }
        }
        prop_assert!(counts.iter().all(|&count| count == 1));
    }

    #[test]
    fn partitioned_objective_matches_serial(((mx, my), (px, py)) in grid_and_blocks(), seed in 0u64..1000) {
        let problem = problem(mx, my, PLaplaceParameters::default());
        let grid = *problem.grid();
        let u = perturbed_state(&problem, seed);
        let f = forcing_field(&problem, grid.whole());
        let g = boundary_field(&problem, grid.whole());

        let serial = objective(&problem, &u);
        let partitioned = problem.compute_objective_partitioned(&Partition::new(grid, px, py), &u, &f, &g);
        prop_assert!(serial.is_finite());
        prop_assert!((serial - partitioned).abs() <= 1e-12 * serial.abs().max(1.0));
    }

    #[test]
    fn subdomain_gradients_assemble_to_serial_gradient(((mx, my), (px, py)) in grid_and_blocks(), seed in 0u64..1000) {
        let problem = problem(mx, my, PLaplaceParameters::default());
        let grid = *problem.grid();
        let u = perturbed_state(&problem, seed);
        let (u_whole, f_whole, g_whole) = whole_fields(&problem, &u);
        let serial = problem.compute_gradient(&u_whole, &f_whole, &g_whole);

        let mut assembled = DVector::from_element(grid.num_points(), f64::NAN);
        for &subdomain in Partition::new(grid, px, py).subdomains() {
            let u_local = u_whole.restrict(subdomain, HALO_WIDTH);
            let f_local = f_whole.restrict(subdomain, HALO_WIDTH);
            let g_local = g_whole.restrict(subdomain, HALO_WIDTH);
            problem.compute_gradient_into(&mut assembled, &u_local, &f_local, &g_local);
        }
        assert_matrix_eq!(assembled, serial, comp = abs, tol = 1e-13);
    }
}
