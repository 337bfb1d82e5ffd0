use crate::solver::core::traits::Settings;
use crate::{algebra::*, solver::core::SettingsError};
use derive_builder::Builder;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Solver variant.  Selects the regularization policy of the KKT
/// factorization and whether the iteration is restarted after it
/// first finishes.
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverMode {
    /// Static regularization, with restarts using progressively
    /// smaller regularization.
    Tuned,
    /// Static regularization and iterative refinement
    #[default]
    Fixed,
    /// Static plus dynamic pivot regularization
    Auto,
}

impl std::fmt::Display for SolverMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Standard-form solver type implementing the [`Settings`](crate::solver::core::traits::Settings) trait

#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DefaultSettings<T: FloatT> {
    ///maximum number of active set iterations
    #[builder(default = "1000")]
    pub max_iter: u32,

    ///absolute tolerance for the optimality checks
    #[builder(default = "(1e-6).as_T()")]
    pub eps_abs: T,

    ///violation above which an inequality counts as violated
    #[builder(default = "(1e-9).as_T()")]
    pub feasibility_tolerance: T,

    ///smallest denominator accepted by the ratio tests
    #[builder(default = "(1e-12).as_T()")]
    pub step_tolerance: T,

    ///data scaling: `> 0` is the number of equilibration passes,
    ///`< 0` selects diagonal scaling and `0` disables scaling
    #[builder(default = "0")]
    pub scaling: i32,

    ///solver variant
    #[builder(default = "SolverMode::Fixed")]
    pub mode: SolverMode,

    ///verbose printing
    #[builder(default = "false")]
    pub verbose: bool,

    ///KKT backend ("qdldl" or "dense")
    #[builder(default = r#""qdldl".to_string()"#)]
    pub kkt_backend: String,

    ///minimum equilibration scaling allowed
    #[builder(default = "(1e-4).as_T()")]
    pub equilibrate_min_scaling: T,

    ///maximum equilibration scaling allowed
    #[builder(default = "(1e+4).as_T()")]
    pub equilibrate_max_scaling: T,

    ///KKT static regularization parameter
    #[builder(default = "(1e-9).as_T()")]
    pub static_regularization_constant: T,

    ///KKT dynamic regularization threshold
    #[builder(default = "(1e-13).as_T()")]
    pub dynamic_regularization_eps: T,

    ///KKT dynamic regularization shift
    #[builder(default = "(2e-7).as_T()")]
    pub dynamic_regularization_delta: T,

    ///KKT direct solve with iterative refinement
    #[builder(default = "true")]
    pub iterative_refinement_enable: bool,

    ///iterative refinement relative tolerance
    #[builder(default = "(1e-13).as_T()")]
    pub iterative_refinement_reltol: T,

    ///iterative refinement absolute tolerance
    #[builder(default = "(1e-12).as_T()")]
    pub iterative_refinement_abstol: T,

    ///iterative refinement maximum iterations
    #[builder(default = "10")]
    pub iterative_refinement_max_iter: u32,

    ///iterative refinement stalling tolerance
    #[builder(default = "(5.0).as_T()")]
    pub iterative_refinement_stop_ratio: T,

    ///number of restarts made by the `Tuned` variant
    #[builder(default = "4")]
    pub tuned_rounds: u32,
}

impl<T> Default for DefaultSettings<T>
where
    T: FloatT,
{
    fn default() -> DefaultSettings<T> {
        DefaultSettingsBuilder::<T>::default().build().unwrap()
    }
}

impl<T> Settings<T> for DefaultSettings<T>
where
    T: FloatT,
{
    //NB: CoreSettings is typedef'd to DefaultSettings
    fn core(&self) -> &DefaultSettings<T> {
        self
    }
    fn core_mut(&mut self) -> &mut DefaultSettings<T> {
        self
    }

    fn validate(&self) -> Result<(), SettingsError> {
        validate_kkt_backend(&self.kkt_backend)?;
        validate_tolerances(
            Some(self.eps_abs),
            &[
                ("feasibility_tolerance", Some(self.feasibility_tolerance)),
                ("step_tolerance", Some(self.step_tolerance)),
                (
                    "static_regularization_constant",
                    Some(self.static_regularization_constant),
                ),
            ],
        )?;
        validate_scaling_bounds(
            Some(self.equilibrate_min_scaling),
            Some(self.equilibrate_max_scaling),
        )
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for DefaultSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        DefaultSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> DefaultSettingsBuilder<T>
where
    T: FloatT,
{
    /// check the fields that have been explicitly set
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(ref kkt_backend) = self.kkt_backend {
            validate_kkt_backend(kkt_backend)?;
        }
        validate_tolerances(
            self.eps_abs,
            &[
                ("feasibility_tolerance", self.feasibility_tolerance),
                ("step_tolerance", self.step_tolerance),
                (
                    "static_regularization_constant",
                    self.static_regularization_constant,
                ),
            ],
        )?;
        validate_scaling_bounds(self.equilibrate_min_scaling, self.equilibrate_max_scaling)
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

fn validate_kkt_backend(kkt_backend: &str) -> Result<(), SettingsError> {
    match kkt_backend {
        "qdldl" => Ok(()),
        "dense" => Ok(()),
        _ => Err(SettingsError::BadField("kkt_backend")),
    }
}

fn validate_tolerances<T: FloatT>(
    eps_abs: Option<T>,
    others: &[(&'static str, Option<T>)],
) -> Result<(), SettingsError> {
    if let Some(eps) = eps_abs {
        if !(eps > T::zero()) {
            return Err(SettingsError::BadField("eps_abs"));
        }
    }
    for &(name, tol) in others {
        if let Some(tol) = tol {
            if !(tol >= T::zero()) {
                return Err(SettingsError::BadField(name));
            }
        }
    }
    Ok(())
}

fn validate_scaling_bounds<T: FloatT>(min: Option<T>, max: Option<T>) -> Result<(), SettingsError> {
    let min = min.unwrap_or_else(|| (1e-4).as_T());
    let max = max.unwrap_or_else(|| (1e4).as_T());
    if !(min > T::zero() && min <= max) {
        return Err(SettingsError::BadField("equilibrate_min_scaling"));
    }
    Ok(())
}

#[test]
fn test_settings_validate() {
    // all standard settings
    let settings = DefaultSettingsBuilder::<f64>::default().build().unwrap();
    assert_eq!(settings.mode, SolverMode::Fixed);
    assert_eq!(settings.max_iter, 1000);
    assert!(settings.validate().is_ok());

    // fail on unknown backend
    assert!(DefaultSettingsBuilder::<f64>::default()
        .kkt_backend("foo".to_string())
        .build()
        .is_err());

    assert!(DefaultSettingsBuilder::<f64>::default()
        .eps_abs(0.0)
        .build()
        .is_err());

    assert!(DefaultSettingsBuilder::<f64>::default()
        .step_tolerance(-1.0)
        .build()
        .is_err());

    assert!(DefaultSettingsBuilder::<f64>::default()
        .equilibrate_min_scaling(10.)
        .equilibrate_max_scaling(1.)
        .build()
        .is_err());

    // directly construct a bad DefaultSettings and manually check
    let settings = DefaultSettings::<f64> {
        kkt_backend: "foo".to_string(),
        ..DefaultSettings::default()
    };
    assert_eq!(
        settings.validate(),
        Err(SettingsError::BadField("kkt_backend"))
    );
}
