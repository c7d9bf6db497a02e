//! Structured grids, owned subdomains and halo-padded fields.
//!
//! A [`StructuredGrid`] is a logical `mx x my` index space. Each process (or in-process worker)
//! owns a contiguous rectangle of it, described by a [`Subdomain`]. Fields are stored per
//! subdomain in a [`GhostedField`], which additionally holds `halo` layers of neighbouring values
//! on every side. Indices into a ghosted field are global grid indices and may therefore be
//! negative or exceed the grid extents inside the halo.
//!
//! Populating the halo is the job of the grid collaborator: [`GhostedField::from_global`]
//! performs the exchange for an in-process global vector, either with periodic wraparound or
//! with a fixed value outside the domain.
use nalgebra::{DMatrix, DVector, Scalar};
use serde::{Deserialize, Serialize};

/// A logical two-dimensional index space of `mx x my` points.
///
/// Global vectors over the grid use the natural ordering `j * mx + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructuredGrid {
    mx: usize,
    my: usize,
}

impl StructuredGrid {
    /// # Panics
    ///
    /// Panics if either extent is zero.
    pub fn new(mx: usize, my: usize) -> Self {
        assert!(mx > 0 && my > 0, "grid extents must be positive, got {} x {}", mx, my);
        Self { mx, my }
    }

    pub fn mx(&self) -> usize {
        self.mx
    }

    pub fn my(&self) -> usize {
        self.my
    }

    pub fn num_points(&self) -> usize {
        self.mx * self.my
    }

    /// The subdomain covering the entire grid.
    pub fn whole(&self) -> Subdomain {
        Subdomain::new(0, 0, self.mx, self.my)
    }

    pub fn contains(&self, i: isize, j: isize) -> bool {
        i >= 0 && j >= 0 && (i as usize) < self.mx && (j as usize) < self.my
    }

    /// Index of point `(i, j)` in a global vector.
    pub fn global_index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.mx && j < self.my);
        j * self.mx + i
    }

    /// Maps an arbitrary index pair onto the grid with periodic wraparound.
    pub fn wrap(&self, i: isize, j: isize) -> (usize, usize) {
        (
            i.rem_euclid(self.mx as isize) as usize,
            j.rem_euclid(self.my as isize) as usize,
        )
    }

    /// Global vector index of `(i, j)` after periodic wraparound.
    pub fn periodic_index(&self, i: isize, j: isize) -> usize {
        let (i, j) = self.wrap(i, j);
        self.global_index(i, j)
    }
}

/// The contiguous rectangle `[xs, xs + xm) x [ys, ys + ym)` owned by one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subdomain {
    pub xs: usize,
    pub ys: usize,
    pub xm: usize,
    pub ym: usize,
}

impl Subdomain {
    pub fn new(xs: usize, ys: usize, xm: usize, ym: usize) -> Self {
        Self { xs, ys, xm, ym }
    }

    /// One past the last owned index in x.
    pub fn xe(&self) -> usize {
        self.xs + self.xm
    }

    /// One past the last owned index in y.
    pub fn ye(&self) -> usize {
        self.ys + self.ym
    }

    pub fn num_owned(&self) -> usize {
        self.xm * self.ym
    }

    pub fn owns(&self, i: isize, j: isize) -> bool {
        i >= self.xs as isize && i < self.xe() as isize && j >= self.ys as isize && j < self.ye() as isize
    }

    /// Iterates over owned indices, with `i` varying fastest.
    pub fn owned_indices(&self) -> impl Iterator<Item = (usize, usize)> {
        let (xs, xe) = (self.xs, self.xe());
        (self.ys..self.ye()).flat_map(move |j| (xs..xe).map(move |i| (i, j)))
    }
}

/// How halo entries outside the grid are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryType {
    /// Halo entries outside the grid are left to the caller (filled with a fixed value).
    Ghosted,
    /// Index `mx` aliases index `0`, and likewise in y.
    Periodic,
}

/// A static decomposition of a grid into `px x py` rectangular subdomains.
///
/// Block sizes along each axis differ by at most one, larger blocks first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    grid: StructuredGrid,
    px: usize,
    py: usize,
    subdomains: Vec<Subdomain>,
}

fn split_extent(n: usize, parts: usize) -> Vec<(usize, usize)> {
    let base = n / parts;
    let remainder = n % parts;
    let mut start = 0;
    (0..parts)
        .map(|k| {
            let len = base + usize::from(k < remainder);
            let block = (start, len);
            start += len;
            block
        })
        .collect()
}

impl Partition {
    /// # Panics
    ///
    /// Panics if `px` or `py` is zero or exceeds the grid extent along its axis.
    pub fn new(grid: StructuredGrid, px: usize, py: usize) -> Self {
        assert!(px > 0 && px <= grid.mx(), "invalid number of x-blocks {} for mx = {}", px, grid.mx());
        assert!(py > 0 && py <= grid.my(), "invalid number of y-blocks {} for my = {}", py, grid.my());
        let x_blocks = split_extent(grid.mx(), px);
        let y_blocks = split_extent(grid.my(), py);
        let subdomains = y_blocks
            .iter()
            .flat_map(|&(ys, ym)| {
                x_blocks
                    .iter()
                    .map(move |&(xs, xm)| Subdomain::new(xs, ys, xm, ym))
            })
            .collect();
        Self {
            grid,
            px,
            py,
            subdomains,
        }
    }

    /// A partition with a single subdomain covering the whole grid.
    pub fn serial(grid: StructuredGrid) -> Self {
        Self::new(grid, 1, 1)
    }

    pub fn grid(&self) -> &StructuredGrid {
        &self.grid
    }

    pub fn num_blocks(&self) -> (usize, usize) {
        (self.px, self.py)
    }

    pub fn subdomains(&self) -> &[Subdomain] {
        &self.subdomains
    }

    /// Index of the subdomain owning grid point `(i, j)`, if it lies in the grid.
    pub fn owner_of(&self, i: isize, j: isize) -> Option<usize> {
        self.subdomains.iter().position(|s| s.owns(i, j))
    }
}

/// A field over a subdomain plus `halo` layers of neighbouring entries on every side.
///
/// Valid indices are `[xs - halo, xe + halo) x [ys - halo, ye + halo)`, in global grid
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostedField<T: Scalar> {
    subdomain: Subdomain,
    halo: usize,
    // Row index is the local x offset, column index the local y offset
    values: DMatrix<T>,
}

impl<T: Scalar> GhostedField<T> {
    /// Fills every entry, owned and halo, from a function of the global indices `(i, j)`.
    pub fn from_fn(subdomain: Subdomain, halo: usize, mut f: impl FnMut(isize, isize) -> T) -> Self {
        let i0 = subdomain.xs as isize - halo as isize;
        let j0 = subdomain.ys as isize - halo as isize;
        let values = DMatrix::from_fn(subdomain.xm + 2 * halo, subdomain.ym + 2 * halo, |r, c| {
            f(i0 + r as isize, j0 + c as isize)
        });
        Self {
            subdomain,
            halo,
            values,
        }
    }

    pub fn from_element(subdomain: Subdomain, halo: usize, value: T) -> Self {
        Self::from_fn(subdomain, halo, |_, _| value.clone())
    }

    /// Scatters a global vector into a ghosted field, populating the halo.
    ///
    /// With [`BoundaryType::Periodic`], halo indices outside the grid wrap around, as many times
    /// as needed when the halo is deeper than the grid. With [`BoundaryType::Ghosted`], they are
    /// set to `fill`.
    ///
    /// # Panics
    ///
    /// Panics if `global` does not have one entry per grid point.
    pub fn from_global(
        grid: &StructuredGrid,
        subdomain: Subdomain,
        halo: usize,
        boundary: BoundaryType,
        global: &DVector<T>,
        fill: T,
    ) -> Self {
        assert_eq!(global.len(), grid.num_points(), "global vector does not match grid size");
        Self::from_fn(subdomain, halo, |i, j| match boundary {
            BoundaryType::Periodic => global[grid.periodic_index(i, j)].clone(),
            BoundaryType::Ghosted if grid.contains(i, j) => global[grid.global_index(i as usize, j as usize)].clone(),
            BoundaryType::Ghosted => fill.clone(),
        })
    }

    /// Copies the entries needed for a smaller subdomain out of a field that covers it.
    ///
    /// # Panics
    ///
    /// Panics if the requested subdomain plus halo is not contained in this field.
    pub fn restrict(&self, subdomain: Subdomain, halo: usize) -> Self {
        Self::from_fn(subdomain, halo, |i, j| self.at(i, j))
    }

    pub fn subdomain(&self) -> &Subdomain {
        &self.subdomain
    }

    pub fn halo(&self) -> usize {
        self.halo
    }

    /// Whether `(i, j)` is a valid index, including the halo.
    pub fn contains(&self, i: isize, j: isize) -> bool {
        let h = self.halo as isize;
        let s = &self.subdomain;
        i >= s.xs as isize - h && i < s.xe() as isize + h && j >= s.ys as isize - h && j < s.ye() as isize + h
    }

    fn local_index(&self, i: isize, j: isize) -> (usize, usize) {
        assert!(
            self.contains(i, j),
            "index ({}, {}) is outside subdomain {:?} with halo {}",
            i,
            j,
            self.subdomain,
            self.halo
        );
        let h = self.halo as isize;
        (
            (i - self.subdomain.xs as isize + h) as usize,
            (j - self.subdomain.ys as isize + h) as usize,
        )
    }

    /// # Panics
    ///
    /// Panics if `(i, j)` lies outside the subdomain plus halo.
    pub fn at(&self, i: isize, j: isize) -> T {
        self.values[self.local_index(i, j)].clone()
    }

    /// # Panics
    ///
    /// Panics if `(i, j)` lies outside the subdomain plus halo.
    pub fn at_mut(&mut self, i: isize, j: isize) -> &mut T {
        let idx = self.local_index(i, j);
        &mut self.values[idx]
    }

    pub fn set(&mut self, i: isize, j: isize, value: T) {
        *self.at_mut(i, j) = value;
    }

    /// Writes the owned entries into their slots of a global vector. Halo entries are ignored.
    pub fn scatter_owned_into(&self, grid: &StructuredGrid, global: &mut DVector<T>) {
        assert_eq!(global.len(), grid.num_points(), "global vector does not match grid size");
        for (i, j) in self.subdomain.owned_indices() {
            global[grid.global_index(i, j)] = self.at(i as isize, j as isize);
        }
    }
}
