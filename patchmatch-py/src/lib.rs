//! Python bindings for the patchmatch nearest-neighbor field solver.
//!
//! This module exposes the solver to Python via PyO3; fields come back as
//! `(height, width, 5)` float32 arrays of `(x, y, score,
//! verification_score, verified)`.

use numpy::ndarray::Array3;
use numpy::{IntoPyArray, PyArray3, PyReadonlyArray2, PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use patchmatch::neighbors::{AllNeighbors, AllowedPropagationNeighbors};
use patchmatch::{
    BoundaryInitializer, CompositeTest, HistogramTest, Image, ImageView, Mask, MaskedSsd, NnField,
    PatchDistance, PatchMatch, PatchMatchConfig as RustConfig, PatchMatchError,
    RandomHistogramInitializer, RandomInitializer, RandomNeighborHistogramInitializer, Ssd,
    SsdTest,
};

/// Convert a PatchMatchError to a Python exception.
fn to_py_err(err: PatchMatchError) -> PyErr {
    if err.is_recoverable() {
        PyRuntimeError::new_err(err.to_string())
    } else {
        PyValueError::new_err(err.to_string())
    }
}

/// Solver parameters.
#[pyclass]
#[derive(Clone)]
pub struct PatchMatchConfig {
    inner: RustConfig,
}

#[pymethods]
impl PatchMatchConfig {
    /// Create a new PatchMatchConfig.
    ///
    /// Args:
    ///     patch_radius: Patch radius; patches are 2r+1 wide (default: 3)
    ///     iterations: Propagation + random-search rounds (default: 5)
    ///     random_search_attempts: Draws per search radius (default: 5)
    ///     initial_search_radius: First search radius (default: max(w, h))
    #[new]
    #[pyo3(signature = (patch_radius=3, iterations=5, random_search_attempts=5, initial_search_radius=None))]
    fn new(
        patch_radius: usize,
        iterations: usize,
        random_search_attempts: usize,
        initial_search_radius: Option<usize>,
    ) -> PyResult<Self> {
        let inner = RustConfig {
            patch_radius,
            iterations,
            random_search_attempts,
            initial_search_radius,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Validate the configuration.
    fn validate(&self) -> PyResult<()> {
        self.inner.validate().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "PatchMatchConfig(patch_radius={}, iterations={}, random_search_attempts={}, initial_search_radius={:?})",
            self.inner.patch_radius,
            self.inner.iterations,
            self.inner.random_search_attempts,
            self.inner.initial_search_radius
        )
    }
}

fn image_from_array(image: &PyReadonlyArrayDyn<'_, u8>) -> PyResult<Image<f32>> {
    let shape = image.shape();
    let (height, width, channels) = match *shape {
        [h, w] => (h, w, 1),
        [h, w, c] => (h, w, c),
        _ => {
            return Err(PyValueError::new_err(
                "image must be (height, width) or (height, width, channels)",
            ))
        }
    };
    let data = image.as_slice()?;
    let view = ImageView::from_interleaved(data, width, height, channels).map_err(to_py_err)?;
    Image::from_u8(view).map_err(to_py_err)
}

fn mask_from_array(mask: &PyReadonlyArray2<'_, bool>) -> PyResult<Mask> {
    let shape = mask.shape();
    let data: Vec<bool> = mask.as_slice()?.to_vec();
    Mask::from_vec(data, shape[1], shape[0]).map_err(to_py_err)
}

fn field_to_array(field: &NnField) -> PyResult<Array3<f32>> {
    let coords = field.to_coordinate_image().map_err(to_py_err)?;
    Array3::from_shape_vec(
        (coords.height(), coords.width(), coords.channels()),
        coords.data().to_vec(),
    )
    .map_err(|err| PyRuntimeError::new_err(err.to_string()))
}

#[allow(clippy::too_many_arguments)]
fn solve<D: PatchDistance>(
    distance: D,
    cfg: RustConfig,
    k: usize,
    seed: u64,
    initializer: &str,
    propagation: &str,
    histogram_threshold: Option<f32>,
    image: &Image<f32>,
    source: &Mask,
    target: &Mask,
) -> PyResult<NnField> {
    let solver = if k > 1 {
        PatchMatch::generalized(distance, cfg, k)
    } else {
        PatchMatch::new(distance, cfg)
    };
    let mut acceptance = CompositeTest::new().with(SsdTest);
    if let Some(threshold) = histogram_threshold {
        acceptance = acceptance.with(HistogramTest::new(threshold));
    }
    let mut solver = solver.with_acceptance(acceptance).with_seed(seed);
    solver = match initializer.to_lowercase().as_str() {
        "random" => solver.with_initializer(RandomInitializer),
        "random_histogram" => solver.with_initializer(RandomHistogramInitializer::default()),
        "random_neighbor_histogram" => {
            solver.with_initializer(RandomNeighborHistogramInitializer::default())
        }
        "boundary" => solver.with_initializer(BoundaryInitializer),
        _ => {
            return Err(PyValueError::new_err(
                "initializer must be 'random', 'random_histogram', 'random_neighbor_histogram' or 'boundary'",
            ))
        }
    };
    solver = match propagation.to_lowercase().as_str() {
        "directional" => solver,
        "all" => solver.with_neighbors(AllNeighbors),
        "allowed" => solver.with_neighbors(AllowedPropagationNeighbors::new(
            source.clone(),
            target.clone(),
        )),
        _ => {
            return Err(PyValueError::new_err(
                "propagation must be 'directional', 'all' or 'allowed'",
            ))
        }
    };

    solver
        .compute(image.view(), source, target)
        .map_err(to_py_err)?;
    solver
        .into_field()
        .ok_or_else(|| PyRuntimeError::new_err("solver finished without a field"))
}

/// Compute a nearest-neighbor field.
///
/// Args:
///     image: uint8 numpy array, (height, width) or (height, width, channels)
///     source_mask: 2D bool array; True where patches may be matched into
///     target_mask: 2D bool array of pixels needing a match
///         (default: inverse of source_mask)
///     config: PatchMatchConfig (default: PatchMatchConfig())
///     k: Matches kept per pixel; >1 runs generalized PatchMatch (default: 1)
///     seed: Random seed (default: 0)
///     initializer: "random", "random_histogram", "random_neighbor_histogram"
///         or "boundary" (default: "random")
///     propagation: "directional", "all" or "allowed" (default: "directional")
///     distance: "ssd" or "masked_ssd" (default: "ssd")
///     histogram_threshold: Also require histogram differences below this
///         value when set (default: None)
///
/// Returns:
///     float32 array of shape (height, width, 5) holding the best match per
///     pixel as (x, y, score, verification_score, verified); pixels without
///     a match hold (-1, -1, inf, 0, 0)
#[pyfunction]
#[pyo3(signature = (
    image,
    source_mask,
    target_mask = None,
    config = None,
    k = 1,
    seed = 0,
    initializer = "random",
    propagation = "directional",
    distance = "ssd",
    histogram_threshold = None
))]
#[allow(clippy::too_many_arguments)]
fn compute_nnf<'py>(
    py: Python<'py>,
    image: PyReadonlyArrayDyn<'py, u8>,
    source_mask: PyReadonlyArray2<'py, bool>,
    target_mask: Option<PyReadonlyArray2<'py, bool>>,
    config: Option<PatchMatchConfig>,
    k: usize,
    seed: u64,
    initializer: &str,
    propagation: &str,
    distance: &str,
    histogram_threshold: Option<f32>,
) -> PyResult<Bound<'py, PyArray3<f32>>> {
    if k == 0 {
        return Err(PyValueError::new_err("k must be at least 1"));
    }
    let cfg = config.map(|c| c.inner).unwrap_or_default();
    let image = image_from_array(&image)?;
    let source = mask_from_array(&source_mask)?;
    let target = match target_mask {
        Some(mask) => mask_from_array(&mask)?,
        None => source.inverted(),
    };

    let field = match distance.to_lowercase().as_str() {
        "ssd" => solve(
            Ssd,
            cfg,
            k,
            seed,
            initializer,
            propagation,
            histogram_threshold,
            &image,
            &source,
            &target,
        )?,
        "masked_ssd" => solve(
            MaskedSsd::new(source.clone()),
            cfg,
            k,
            seed,
            initializer,
            propagation,
            histogram_threshold,
            &image,
            &source,
            &target,
        )?,
        _ => {
            return Err(PyValueError::new_err(
                "distance must be 'ssd' or 'masked_ssd'",
            ))
        }
    };

    Ok(field_to_array(&field)?.into_pyarray(py))
}

/// Load an image and a source mask from disk and compute the field.
///
/// Args:
///     image_path: Path to an RGB or grayscale image
///     source_mask_path: Path to a mask image; non-zero pixels are source
///     config: PatchMatchConfig (default: PatchMatchConfig())
///     seed: Random seed (default: 0)
///
/// Returns:
///     float32 array of shape (height, width, 5), as `compute_nnf`
#[pyfunction]
#[pyo3(signature = (image_path, source_mask_path, config = None, seed = 0))]
fn compute_nnf_from_files<'py>(
    py: Python<'py>,
    image_path: &str,
    source_mask_path: &str,
    config: Option<PatchMatchConfig>,
    seed: u64,
) -> PyResult<Bound<'py, PyArray3<f32>>> {
    let cfg = config.map(|c| c.inner).unwrap_or_default();
    let image = patchmatch::io::load_rgb_image(image_path).map_err(to_py_err)?;
    let source = patchmatch::io::load_mask(source_mask_path).map_err(to_py_err)?;
    let target = source.inverted();
    let field = solve(
        Ssd,
        cfg,
        1,
        seed,
        "random",
        "directional",
        None,
        &image,
        &source,
        &target,
    )?;
    Ok(field_to_array(&field)?.into_pyarray(py))
}

/// Python module for the patchmatch solver.
#[pymodule]
fn _patchmatch(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PatchMatchConfig>()?;
    m.add_function(wrap_pyfunction!(compute_nnf, m)?)?;
    m.add_function(wrap_pyfunction!(compute_nnf_from_files, m)?)?;

    // Add version
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
