use crate::{Error, Result};

/// Tissue parameters of a single location.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TissueParams {
    /// Proton density, equilibrium magnetization of the location
    pub pd: f64,
    /// Unit: `s`
    pub t1: f64,
    /// Unit: `s`
    pub t2: f64,
}

impl TissueParams {
    pub fn new(pd: f64, t1: f64, t2: f64) -> Self {
        Self { pd, t1, t2 }
    }
}

/// A point of the phantom that is simulated by one isochromat.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub index: usize,
    /// Unit: `m`
    pub position: [f64; 3],
    pub params: TissueParams,
}

/// Source of the locations to simulate. Implementations are only read during
/// simulation and are shared between all workers.
pub trait Phantom: Sync {
    /// Indices of all locations, in the order their signals are summed.
    fn location_indices(&self) -> Vec<usize>;

    /// Returns `None` if there is no location with this index.
    fn location(&self, index: usize) -> Option<Location>;
}

/// Concentric sphere of constant tissue, used by `VoxelPhantom::spherical`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sphere {
    /// Unit: `m`
    pub radius: f64,
    pub params: TissueParams,
}

/// Phantom stored as a flat list of locations. Location `i` has index `i`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelPhantom {
    locations: Vec<Location>,
}

impl VoxelPhantom {
    pub fn new<I>(points: I) -> Self
    where
        I: IntoIterator<Item = ([f64; 3], TissueParams)>,
    {
        let locations = points
            .into_iter()
            .enumerate()
            .map(|(index, (position, params))| Location {
                index,
                position,
                params,
            })
            .collect();
        Self { locations }
    }

    /// Cubic grid of `n`³ voxels spanning `fov` (centered on the origin), filled
    /// with concentric spheres. A voxel gets the parameters of the smallest
    /// sphere containing its center; voxels outside of all spheres are left out.
    pub fn spherical(n: usize, fov: f64, spheres: &[Sphere]) -> Self {
        let mut spheres = spheres.to_vec();
        spheres.sort_by(|a, b| a.radius.total_cmp(&b.radius));

        let coord = |i: usize| -0.5 * fov + (i as f64 + 0.5) * fov / n as f64;
        let mut points = Vec::new();
        for ix in 0..n {
            for iy in 0..n {
                for iz in 0..n {
                    let position = [coord(ix), coord(iy), coord(iz)];
                    let r = position.iter().map(|x| x * x).sum::<f64>().sqrt();
                    if let Some(sphere) = spheres.iter().find(|s| r <= s.radius) {
                        points.push((position, sphere.params));
                    }
                }
            }
        }

        log::debug!(
            "spherical phantom: {} of {} voxels inside {} spheres",
            points.len(),
            n * n * n,
            spheres.len()
        );
        Self::new(points)
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Phantom for VoxelPhantom {
    fn location_indices(&self) -> Vec<usize> {
        (0..self.locations.len()).collect()
    }

    fn location(&self, index: usize) -> Option<Location> {
        self.locations.get(index).copied()
    }
}

impl Location {
    /// Rejects parameters the Bloch equations can't be integrated with.
    pub fn validate(&self) -> Result<()> {
        let TissueParams { pd, t1, t2 } = self.params;
        let reason = if !self.position.iter().all(|x| x.is_finite()) {
            Some(format!("position {:?} is not finite", self.position))
        } else if !pd.is_finite() {
            Some(format!("proton density {pd} is not finite"))
        } else if t1.is_nan() || t1 <= 0.0 {
            Some(format!("T1 must be positive, got {t1}"))
        } else if t2.is_nan() || t2 <= 0.0 {
            Some(format!("T2 must be positive, got {t2}"))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidTissue {
                index: self.index,
                reason,
            }),
            None => Ok(()),
        }
    }
}
