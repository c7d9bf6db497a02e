use itertools::iproduct;
use log::{debug, info};
use nalgebra::{DVector, Point2};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;

use crate::advection::{initial_state, AdvectionParameters, FaceDirection, FaceStencil, SourceTerm, ZeroSource};
use crate::config::{ConfigError, Validate};
use crate::grid::{BoundaryType, GhostedField, Partition, StructuredGrid, Subdomain};

/// Halo depth required on the state passed to [`AdvectionModel::compute_rhs`]. The limiter
/// samples the cell two away from a face on the upwind side.
pub const HALO_WIDTH: usize = 2;

/// The semi-discrete advection operator `u' = G(t, u)` on a periodic grid of cells.
#[derive(Debug, Clone)]
pub struct AdvectionModel<S = ZeroSource> {
    grid: StructuredGrid,
    parameters: AdvectionParameters,
    source: S,
    hx: f64,
    hy: f64,
}

impl AdvectionModel {
    pub fn new(grid: StructuredGrid, parameters: AdvectionParameters) -> Result<Self, ConfigError> {
        parameters.validate()?;
        let hx = 2.0 / grid.mx() as f64;
        let hy = 2.0 / grid.my() as f64;
        info!(
            "advection problem '{}' on {} x {} grid with dx = {} x dy = {} cells and '{}' limiter",
            parameters.problem,
            grid.mx(),
            grid.my(),
            hx,
            hy,
            parameters.limiter
        );
        Ok(Self {
            grid,
            parameters,
            source: ZeroSource,
            hx,
            hy,
        })
    }
}

impl<S: SourceTerm> AdvectionModel<S> {
    /// Replaces the source term.
    pub fn with_source<S2: SourceTerm>(self, source: S2) -> AdvectionModel<S2> {
        AdvectionModel {
            grid: self.grid,
            parameters: self.parameters,
            source,
            hx: self.hx,
            hy: self.hy,
        }
    }

    pub fn grid(&self) -> &StructuredGrid {
        &self.grid
    }

    pub fn parameters(&self) -> &AdvectionParameters {
        &self.parameters
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Cell dimensions `(hx, hy)`.
    pub fn cell_spacing(&self) -> (f64, f64) {
        (self.hx, self.hy)
    }

    pub fn cell_center(&self, i: isize, j: isize) -> Point2<f64> {
        Point2::new(
            -1.0 + (i as f64 + 0.5) * self.hx,
            -1.0 + (j as f64 + 0.5) * self.hy,
        )
    }

    /// Wind speed normal to the face in `direction` of cell `(i, j)`, evaluated at the face
    /// midpoint.
    fn face_wind(&self, i: isize, j: isize, direction: FaceDirection) -> f64 {
        let center = self.cell_center(i, j);
        match direction {
            FaceDirection::East => self.parameters.wind(center.x + 0.5 * self.hx, center.y, direction),
            FaceDirection::North => self.parameters.wind(center.x, center.y + 0.5 * self.hy, direction),
        }
    }

    fn face_stencil(u: &GhostedField<f64>, i: isize, j: isize, direction: FaceDirection) -> FaceStencil<f64> {
        let (di, dj) = direction.offset();
        FaceStencil::new(
            u.at(i - di, j - dj),
            u.at(i, j),
            u.at(i + di, j + dj),
            u.at(i + 2 * di, j + 2 * dj),
        )
    }

    /// Evaluates `G(t, u)` on the owned cells of the subdomain of `u` and stores it in `rate`.
    ///
    /// `u` must carry at least [`HALO_WIDTH`] halo layers with periodically exchanged values.
    /// `rate` must live on the same subdomain; its halo is left untouched.
    pub fn compute_rhs_into(&self, rate: &mut GhostedField<f64>, t: f64, u: &GhostedField<f64>) {
        assert!(u.halo() >= HALO_WIDTH, "state needs a halo of depth {}, got {}", HALO_WIDTH, u.halo());
        assert_eq!(rate.subdomain(), u.subdomain(), "rate and state live on different subdomains");
        let subdomain = *u.subdomain();
        let (xs, ys) = (subdomain.xs as isize, subdomain.ys as isize);
        let (xe, ye) = (subdomain.xe() as isize, subdomain.ye() as isize);
        let limiter = self.parameters.limiter;

        for (i, j) in subdomain.owned_indices() {
            let (i, j) = (i as isize, j as isize);
            let center = self.cell_center(i, j);
            rate.set(i, j, self.source.value(t, center.x, center.y, u.at(i, j)));
        }

        // Visit the east and north faces of the owned cells and of the cells just below and to
        // the left, so that every face of an owned cell is computed exactly once
        for (j, i) in iproduct!(ys - 1..ye, xs - 1..xe) {
            for direction in FaceDirection::ALL {
                let (h, owned_here, owned_there) = match direction {
                    FaceDirection::East if j < ys => continue,
                    FaceDirection::North if i < xs => continue,
                    FaceDirection::East => (self.hx, i >= xs, i + 1 < xe),
                    FaceDirection::North => (self.hy, j >= ys, j + 1 < ye),
                };
                let a = self.face_wind(i, j, direction);
                let flux = Self::face_stencil(u, i, j, direction).flux(a, limiter);
                let (di, dj) = direction.offset();
                if owned_here {
                    *rate.at_mut(i, j) -= flux / h;
                }
                if owned_there {
                    *rate.at_mut(i + di, j + dj) += flux / h;
                }
            }
        }
    }

    /// Evaluates `G(t, u)` on the owned cells of the subdomain of `u`. The result has no halo.
    pub fn compute_rhs(&self, t: f64, u: &GhostedField<f64>) -> GhostedField<f64> {
        let mut rate = GhostedField::from_element(*u.subdomain(), 0, 0.0);
        self.compute_rhs_into(&mut rate, t, u);
        rate
    }

    /// Evaluates `G(t, u)` for a global state vector, in parallel over the subdomains of
    /// `partition`. The halo exchange is performed for each subdomain.
    pub fn compute_rhs_partitioned(&self, partition: &Partition, t: f64, u: &DVector<f64>) -> DVector<f64> {
        assert_eq!(partition.grid(), &self.grid, "partition does not match model grid");
        let local_rates: Vec<_> = partition
            .subdomains()
            .par_iter()
            .map(|&subdomain| {
                let u_local =
                    GhostedField::from_global(&self.grid, subdomain, HALO_WIDTH, BoundaryType::Periodic, u, 0.0);
                self.compute_rhs(t, &u_local)
            })
            .collect();

        let mut rate = DVector::zeros(self.grid.num_points());
        for local_rate in &local_rates {
            local_rate.scatter_owned_into(&self.grid, &mut rate);
        }
        debug!(
            "advection rhs at t = {} over {} subdomains, |G|_inf = {:e}",
            t,
            local_rates.len(),
            rate.amax()
        );
        rate
    }

    /// Adds the Jacobian rows of the owned cells of the subdomain of `u` to `coo`.
    ///
    /// The Jacobian is that of the first-order upwind scheme, whatever limiter is configured.
    /// Columns are global cell indices with periodic wraparound. Entries are pushed without
    /// combining duplicates, which on very coarse grids (`mx` or `my` at most 2) arise when
    /// several faces reference the same neighbour; they are summed on conversion.
    pub fn compute_jacobian_into(&self, coo: &mut CooMatrix<f64>, t: f64, u: &GhostedField<f64>) {
        let n = self.grid.num_points();
        assert_eq!((coo.nrows(), coo.ncols()), (n, n), "Jacobian matrix does not match grid size");
        let subdomain = *u.subdomain();

        for (i, j) in subdomain.owned_indices() {
            let (i, j) = (i as isize, j as isize);
            let row = self.grid.periodic_index(i, j);
            let center = self.cell_center(i, j);
            coo.push(row, row, self.source.derivative(t, center.x, center.y, u.at(i, j)));

            // Outflow through the east and north faces, inflow through the west and south faces
            // (the east and north faces of the neighbours below and to the left)
            for direction in FaceDirection::ALL {
                let (di, dj) = direction.offset();
                let h = match direction {
                    FaceDirection::East => self.hx,
                    FaceDirection::North => self.hy,
                };

                let a = self.face_wind(i, j, direction);
                let (ui, uj) = if a >= 0.0 { (i, j) } else { (i + di, j + dj) };
                coo.push(row, self.grid.periodic_index(ui, uj), -a / h);

                let (wi, wj) = (i - di, j - dj);
                let a = self.face_wind(wi, wj, direction);
                let (ui, uj) = if a >= 0.0 { (wi, wj) } else { (i, j) };
                coo.push(row, self.grid.periodic_index(ui, uj), a / h);
            }
        }
    }

    /// The Jacobian rows of the owned cells as a square matrix over all cells.
    pub fn compute_jacobian(&self, t: f64, u: &GhostedField<f64>) -> CsrMatrix<f64> {
        let n = self.grid.num_points();
        let mut coo = CooMatrix::new(n, n);
        self.compute_jacobian_into(&mut coo, t, u);
        CsrMatrix::from(&coo)
    }

    /// The full Jacobian for a global state vector, assembled in parallel over the subdomains of
    /// `partition`.
    pub fn compute_jacobian_partitioned(&self, partition: &Partition, t: f64, u: &DVector<f64>) -> CsrMatrix<f64> {
        assert_eq!(partition.grid(), &self.grid, "partition does not match model grid");
        let n = self.grid.num_points();
        let coo = partition
            .subdomains()
            .par_iter()
            .fold(
                || CooMatrix::new(n, n),
                |mut coo, &subdomain| {
                    // Only the owned values enter the Jacobian
                    let u_local = GhostedField::from_global(&self.grid, subdomain, 0, BoundaryType::Periodic, u, 0.0);
                    self.compute_jacobian_into(&mut coo, t, &u_local);
                    coo
                },
            )
            .reduce(
                || CooMatrix::new(n, n),
                |mut coo, other| {
                    for (i, j, v) in other.triplet_iter() {
                        coo.push(i, j, *v);
                    }
                    coo
                },
            );
        debug!(
            "advection Jacobian at t = {}: {} entries pushed by {} subdomains",
            t,
            coo.nnz(),
            partition.subdomains().len()
        );
        CsrMatrix::from(&coo)
    }

    /// The initial state of the configured problem on the owned cells of `subdomain`, with
    /// `halo` layers filled periodically.
    pub fn initial_field(&self, subdomain: Subdomain, halo: usize) -> GhostedField<f64> {
        GhostedField::from_fn(subdomain, halo, |i, j| {
            let (i, j) = self.grid.wrap(i, j);
            let center = self.cell_center(i as isize, j as isize);
            initial_state(self.parameters.problem, center.x, center.y)
        })
    }

    /// The initial state of the configured problem as a global vector.
    pub fn initial_vector(&self) -> DVector<f64> {
        let mut u = DVector::zeros(self.grid.num_points());
        self.initial_field(self.grid.whole(), 0).scatter_owned_into(&self.grid, &mut u);
        u
    }
}
