//! Interface closure laws.
//!
//! All coefficients share the Arrhenius shape `P(T) = P_0 exp(-E / (k_B T))`
//! with activation energies in eV. Laws that feed a residual are generic over
//! [`DualNum`] so their derivatives with respect to the unknowns are exact.

use std::fmt;
use std::str::FromStr;

use num_dual::DualNum;

use crate::error::BoundaryError;

/// Boltzmann constant [eV/K].
pub const K_B: f64 = 8.617333262e-5;

/// Pre-exponential factor and activation energy of a thermally activated
/// coefficient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrhenius {
    pub pre_factor: f64,
    pub activation_energy: f64,
}

impl Arrhenius {
    pub fn new(pre_factor: f64, activation_energy: f64) -> Self {
        Self {
            pre_factor,
            activation_energy,
        }
    }

    #[inline]
    pub fn at(&self, temperature: f64) -> f64 {
        self.pre_factor * (-self.activation_energy / K_B / temperature).exp()
    }

    /// Same as [`Arrhenius::at`] for a temperature that may itself be an unknown.
    #[inline]
    pub fn at_dual<T: DualNum<f64>>(&self, temperature: &T) -> T {
        (T::from(-self.activation_energy / K_B) / temperature.clone()).exp() * self.pre_factor
    }
}

/// Sieverts' constant `S(T)` [m^-3 Pa^-0.5].
pub fn sieverts_constant(temperature: f64, s: Arrhenius) -> f64 {
    s.at(temperature)
}

/// Surface concentration in equilibrium with a gas: `c = S(T) sqrt(p)`.
pub fn solubility_concentration(s: Arrhenius, pressure: f64, temperature: f64) -> f64 {
    sieverts_constant(temperature, s) * pressure.sqrt()
}

/// Surface concentration below an implanted flux.
///
/// `c = phi R_p / D(T)`, plus `sqrt(phi / K(T))` when recombination is not
/// instantaneous (`recombination` is `Some`).
pub fn implantation_concentration(
    implanted_flux: f64,
    implantation_depth: f64,
    diffusivity: Arrhenius,
    recombination: Option<Arrhenius>,
    temperature: f64,
) -> f64 {
    let d = diffusivity.at(temperature);
    let mut c = implanted_flux * implantation_depth / d;
    if let Some(k) = recombination {
        c += (implanted_flux / k.at(temperature)).sqrt();
    }
    c
}

/// `c^order`, using integer powers when possible so the derivative is exact at `c = 0`.
#[inline]
pub fn power<T: DualNum<f64>>(c: &T, order: f64) -> T {
    if order == 1.0 {
        c.clone()
    } else if order.fract() == 0.0 && order.abs() < i32::MAX as f64 {
        c.powi(order as i32)
    } else {
        c.powf(order)
    }
}

/// Recombination flux entering the domain: `-K(T) c^order`.
pub fn recombination_flux<T: DualNum<f64>>(kr: &T, c: &T, order: f64) -> T {
    -(kr.clone() * power(c, order))
}

/// Closure relating the metal-side concentration to the liquid-side one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolubilityLaw {
    Sievert,
    Henry,
}

impl FromStr for SolubilityLaw {
    type Err = BoundaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sievert" => Ok(SolubilityLaw::Sievert),
            "henry" => Ok(SolubilityLaw::Henry),
            other => Err(BoundaryError::InvalidConfiguration(format!(
                "invalid solubility law `{other}`, choose between 'sievert' or 'henry'"
            ))),
        }
    }
}

impl fmt::Display for SolubilityLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolubilityLaw::Sievert => write!(f, "sievert"),
            SolubilityLaw::Henry => write!(f, "henry"),
        }
    }
}

impl SolubilityLaw {
    /// Liquid-side interface concentration for a bulk concentration `c`.
    ///
    /// `s_metal` is the metal Sieverts' constant, `s_liquid` the liquid
    /// constant of the chosen law, both already evaluated at the local temperature.
    pub fn interface_concentration<T: DualNum<f64>>(
        &self,
        c: &T,
        s_metal: &T,
        s_liquid: &T,
    ) -> T {
        let ratio = c.clone() / s_metal.clone();
        match self {
            SolubilityLaw::Sievert => ratio * s_liquid.clone(),
            SolubilityLaw::Henry => ratio.powi(2) * s_liquid.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_dual::Dual64;

    #[test]
    fn sieverts_boundary_value() {
        let s = Arrhenius::new(1e-2, 0.5);
        let c = solubility_concentration(s, 1e5, 500.0);
        let expected = 1e-2 * (-0.5f64 / K_B / 500.0).exp() * 1e5f64.sqrt();
        assert_relative_eq!(c, expected, max_relative = 1e-12);
    }

    #[test]
    fn instantaneous_recombination_has_no_extra_term() {
        let d = Arrhenius::new(1e-7, 0.2);
        let c = implantation_concentration(1e20, 1e-9, d, None, 600.0);
        assert_relative_eq!(c, 1e20 * 1e-9 / d.at(600.0), max_relative = 1e-12);
    }

    #[test]
    fn slower_recombination_raises_concentration() {
        let d = Arrhenius::new(1e-7, 0.2);
        let mut previous = implantation_concentration(1e20, 1e-9, d, None, 600.0);
        for k_0 in [1e-20, 1e-24, 1e-28, 1e-32] {
            let c = implantation_concentration(
                1e20,
                1e-9,
                d,
                Some(Arrhenius::new(k_0, 0.1)),
                600.0,
            );
            assert!(c > previous, "K_0 = {k_0:e} gave {c:e} <= {previous:e}");
            previous = c;
        }
    }

    #[test]
    fn henry_squares_the_ratio() {
        let c = 4.0;
        let s_metal = 2.0;
        let s_liquid = 3.0;
        let sievert = SolubilityLaw::Sievert.interface_concentration(&c, &s_metal, &s_liquid);
        let henry = SolubilityLaw::Henry.interface_concentration(&c, &s_metal, &s_liquid);
        assert_relative_eq!(sievert, 6.0);
        assert_relative_eq!(henry, 12.0);
    }

    #[test]
    fn unknown_law_is_rejected() {
        let err = "raoult".parse::<SolubilityLaw>().unwrap_err();
        match err {
            BoundaryError::InvalidConfiguration(msg) => assert!(msg.contains("raoult")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn dual_arrhenius_matches_plain() {
        let k = Arrhenius::new(3.0e-25, 1.1);
        let t = Dual64::from_re(700.0).derivative();
        let value = k.at_dual(&t);
        assert_relative_eq!(value.re, k.at(700.0), max_relative = 1e-12);
        // dK/dT = K E / (k_B T^2)
        let slope = k.at(700.0) * 1.1 / (K_B * 700.0 * 700.0);
        assert_relative_eq!(value.eps, slope, max_relative = 1e-10);
    }

    #[test]
    fn recombination_derivative() {
        let c = Dual64::from_re(2.0).derivative();
        let kr = Dual64::from_re(0.5);
        let g = recombination_flux(&kr, &c, 2.0);
        assert_relative_eq!(g.re, -2.0);
        assert_relative_eq!(g.eps, -2.0);
    }
}
