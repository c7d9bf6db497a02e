use std::ops::RangeInclusive;

use itertools::iproduct;
use log::{debug, info};
use nalgebra::{DVector, Point2, Vector4};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;

use crate::comm::{CompensatedSum, Communicator};
use crate::config::{ConfigError, Validate};
use crate::element::ElementIndex;
use crate::grid::{BoundaryType, GhostedField, Partition, StructuredGrid, Subdomain};
use crate::plaplace::{ElementEnergyKernel, PLaplaceParameters};

/// Halo depth required on every node field passed to [`PLaplaceProblem`].
pub const HALO_WIDTH: usize = 1;

/// The discrete p-Laplacian energy on an `mx x my` grid of interior nodes.
///
/// Elements are identified by their top-right node `(i, j)` with `0 <= i <= mx` and
/// `0 <= j <= my`, so there are `(mx + 1) (my + 1)` elements in total.
///
/// # Element ownership
///
/// In a partitioned grid, element `(i, j)` is integrated by the subdomain that owns its
/// lower-left node `(i - 1, j - 1)`. Elements along the left and bottom boundary have no
/// interior lower-left node; for those the index is clamped into the interior, i.e. the owner of
/// node `(max(i - 1, 0), max(j - 1, 0))` integrates the element. Every element therefore has
/// exactly one owner, and all of its corners lie within one halo layer of that owner.
///
/// # Fields
///
/// All methods taking ghosted fields expect `u`, `f` and `g` with (at least) [`HALO_WIDTH`]
/// halo layers on the same subdomain. At boundary nodes the element reads `g`, at interior nodes
/// `u`; `f` is read at every corner.
#[derive(Debug, Clone)]
pub struct PLaplaceProblem {
    grid: StructuredGrid,
    parameters: PLaplaceParameters,
    kernel: ElementEnergyKernel<f64>,
}

impl PLaplaceProblem {
    pub fn new(grid: StructuredGrid, parameters: PLaplaceParameters) -> Result<Self, ConfigError> {
        parameters.validate()?;
        let hx = 1.0 / (grid.mx() + 1) as f64;
        let hy = 1.0 / (grid.my() + 1) as f64;
        info!(
            "p-Laplacian on a grid of {} x {} = {} interior nodes (element dims {} x {}), p = {}, eps = {}, quadrature degree {}",
            grid.mx(),
            grid.my(),
            grid.num_points(),
            hx,
            hy,
            parameters.p,
            parameters.eps,
            parameters.quadrature_degree
        );
        let kernel = ElementEnergyKernel::from_f64(parameters.p, parameters.eps, hx, hy, parameters.quadrature_degree);
        Ok(Self {
            grid,
            parameters,
            kernel,
        })
    }

    pub fn grid(&self) -> &StructuredGrid {
        &self.grid
    }

    pub fn parameters(&self) -> &PLaplaceParameters {
        &self.parameters
    }

    pub fn kernel(&self) -> &ElementEnergyKernel<f64> {
        &self.kernel
    }

    /// Physical position `(hx (i + 1), hy (j + 1))` of node `(i, j)`.
    pub fn node_coordinates(&self, i: isize, j: isize) -> Point2<f64> {
        let geometry = self.kernel.geometry();
        Point2::new(geometry.hx * (i + 1) as f64, geometry.hy * (j + 1) as f64)
    }

    /// Whether node `(i, j)` lies on the boundary of the unit square (or beyond).
    pub fn is_boundary_node(&self, i: isize, j: isize) -> bool {
        !self.grid.contains(i, j)
    }

    pub fn num_elements(&self) -> usize {
        (self.grid.mx() + 1) * (self.grid.my() + 1)
    }

    /// All elements of the grid.
    pub fn elements(&self) -> impl Iterator<Item = ElementIndex> {
        let (mx, my) = (self.grid.mx() as isize, self.grid.my() as isize);
        iproduct!(0..=my, 0..=mx).map(|(j, i)| ElementIndex::new(i, j))
    }

    /// The anchor ranges `(i_range, j_range)` of the elements attributed to `subdomain`.
    pub fn owned_element_range(&self, subdomain: &Subdomain) -> (RangeInclusive<isize>, RangeInclusive<isize>) {
        let range = |start: usize, end: usize| {
            let first = if start == 0 { 0 } else { start as isize + 1 };
            first..=end as isize
        };
        (
            range(subdomain.xs, subdomain.xe()),
            range(subdomain.ys, subdomain.ye()),
        )
    }

    /// Index of the subdomain of `partition` that integrates `element`.
    pub fn element_owner(&self, partition: &Partition, element: ElementIndex) -> Option<usize> {
        let (i, j) = element.lower_left();
        partition.owner_of(i.max(0), j.max(0))
    }

    /// Nodal values of the state for one element in local node order: `g` at boundary nodes,
    /// `u` elsewhere.
    fn element_state(&self, element: ElementIndex, u: &GhostedField<f64>, g: &GhostedField<f64>) -> Vector4<f64> {
        let nodes = element.nodes();
        Vector4::from_fn(|l, _| {
            let (i, j) = nodes[l];
            if self.is_boundary_node(i, j) {
                g.at(i, j)
            } else {
                u.at(i, j)
            }
        })
    }

    fn element_forcing(&self, element: ElementIndex, f: &GhostedField<f64>) -> Vector4<f64> {
        let nodes = element.nodes();
        Vector4::from_fn(|l, _| {
            let (i, j) = nodes[l];
            f.at(i, j)
        })
    }

    fn local_objective_sum(&self, u: &GhostedField<f64>, f: &GhostedField<f64>, g: &GhostedField<f64>) -> CompensatedSum {
        let (i_range, j_range) = self.owned_element_range(u.subdomain());
        iproduct!(j_range, i_range)
            .map(|(j, i)| {
                let element = ElementIndex::new(i, j);
                let u_element = self.element_state(element, u, g);
                let f_element = self.element_forcing(element, f);
                self.kernel.element_energy(&f_element, &u_element)
            })
            .collect()
    }

    /// The energy of the elements attributed to the subdomain of `u`.
    pub fn local_objective(&self, u: &GhostedField<f64>, f: &GhostedField<f64>, g: &GhostedField<f64>) -> f64 {
        self.local_objective_sum(u, f, g).value()
    }

    /// The total energy, summed over all ranks of `comm`.
    ///
    /// This is a collective operation: every rank must call it with its own subdomain fields.
    pub fn compute_objective(
        &self,
        comm: &impl Communicator,
        u: &GhostedField<f64>,
        f: &GhostedField<f64>,
        g: &GhostedField<f64>,
    ) -> f64 {
        let local = self.local_objective(u, f, g);
        let total = comm.all_reduce_sum(local);
        debug!("objective on rank {}: local {:e}, total {:e}", comm.rank(), local, total);
        total
    }

    /// The total energy of a global state vector, evaluated in parallel over the subdomains of
    /// `partition`.
    ///
    /// `f` and `g` cover the whole grid with [`HALO_WIDTH`] halo layers, e.g. as constructed by
    /// [`forcing_field`](crate::plaplace::manufactured::forcing_field) and
    /// [`boundary_field`](crate::plaplace::manufactured::boundary_field) on
    /// [`StructuredGrid::whole`].
    pub fn compute_objective_partitioned(
        &self,
        partition: &Partition,
        u: &DVector<f64>,
        f: &GhostedField<f64>,
        g: &GhostedField<f64>,
    ) -> f64 {
        assert_eq!(partition.grid(), &self.grid, "partition does not match problem grid");
        partition
            .subdomains()
            .par_iter()
            .map(|&subdomain| {
                let u_local =
                    GhostedField::from_global(&self.grid, subdomain, HALO_WIDTH, BoundaryType::Ghosted, u, f64::NAN);
                let f_local = f.restrict(subdomain, HALO_WIDTH);
                let g_local = g.restrict(subdomain, HALO_WIDTH);
                self.local_objective_sum(&u_local, &f_local, &g_local)
            })
            .reduce(CompensatedSum::new, CompensatedSum::merge)
            .value()
    }

    /// Elements touching at least one owned node, i.e. all elements whose contributions are
    /// needed for the derivatives at the owned nodes.
    fn elements_around(&self, subdomain: &Subdomain) -> impl Iterator<Item = ElementIndex> {
        let i_range = subdomain.xs as isize..=subdomain.xe() as isize;
        let j_range = subdomain.ys as isize..=subdomain.ye() as isize;
        iproduct!(j_range, i_range).map(|(j, i)| ElementIndex::new(i, j))
    }

    /// Writes the gradient of the objective with respect to the owned nodal values into their
    /// slots of a global vector.
    ///
    /// Each owned entry is assembled from the (up to four) elements around the node, so no
    /// communication between subdomains is needed. Entries of nodes not owned by the
    /// subdomain of `u` are left untouched.
    pub fn compute_gradient_into(
        &self,
        gradient: &mut DVector<f64>,
        u: &GhostedField<f64>,
        f: &GhostedField<f64>,
        g: &GhostedField<f64>,
    ) {
        assert_eq!(gradient.len(), self.grid.num_points(), "gradient vector does not match grid size");
        let subdomain = *u.subdomain();
        for (i, j) in subdomain.owned_indices() {
            gradient[self.grid.global_index(i, j)] = 0.0;
        }
        for element in self.elements_around(&subdomain) {
            let u_element = self.element_state(element, u, g);
            let f_element = self.element_forcing(element, f);
            let element_gradient = self.kernel.element_gradient(&f_element, &u_element);
            for (l, &(i, j)) in element.nodes().iter().enumerate() {
                if subdomain.owns(i, j) {
                    gradient[self.grid.global_index(i as usize, j as usize)] += element_gradient[l];
                }
            }
        }
    }

    /// The gradient of the objective with respect to the nodal values owned by the subdomain of
    /// `u`. Entries of other nodes are zero.
    pub fn compute_gradient(&self, u: &GhostedField<f64>, f: &GhostedField<f64>, g: &GhostedField<f64>) -> DVector<f64> {
        let mut gradient = DVector::zeros(self.grid.num_points());
        self.compute_gradient_into(&mut gradient, u, f, g);
        gradient
    }

    /// Adds the rows of the objective Hessian belonging to owned nodes to `coo`.
    ///
    /// Columns of boundary nodes are omitted, since boundary values are fixed. Duplicate entries
    /// are pushed and are summed on conversion to a compressed format.
    pub fn compute_hessian_into(&self, coo: &mut CooMatrix<f64>, u: &GhostedField<f64>, g: &GhostedField<f64>) {
        let n = self.grid.num_points();
        assert_eq!((coo.nrows(), coo.ncols()), (n, n), "Hessian matrix does not match grid size");
        let subdomain = *u.subdomain();
        for element in self.elements_around(&subdomain) {
            let u_element = self.element_state(element, u, g);
            let element_hessian = self.kernel.element_hessian(&u_element);
            let nodes = element.nodes();
            for (a, &(ia, ja)) in nodes.iter().enumerate() {
                if !subdomain.owns(ia, ja) {
                    continue;
                }
                let row = self.grid.global_index(ia as usize, ja as usize);
                for (b, &(ib, jb)) in nodes.iter().enumerate() {
                    if self.is_boundary_node(ib, jb) {
                        continue;
                    }
                    let col = self.grid.global_index(ib as usize, jb as usize);
                    coo.push(row, col, element_hessian[(a, b)]);
                }
            }
        }
    }

    /// The Hessian rows of the owned nodes as a square matrix over all interior nodes.
    pub fn compute_hessian(&self, u: &GhostedField<f64>, g: &GhostedField<f64>) -> CsrMatrix<f64> {
        let n = self.grid.num_points();
        let mut coo = CooMatrix::new(n, n);
        self.compute_hessian_into(&mut coo, u, g);
        debug!("p-Laplacian Hessian on {:?}: {} entries pushed", u.subdomain(), coo.nnz());
        CsrMatrix::from(&coo)
    }
}
