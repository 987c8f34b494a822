use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formula::generalize::GeneralizeFactors;
use crate::formula::Dialect;

/// Weight coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coefficients {
    /// applied per stored level when descending
    pub depth_decay: f32,
    /// identifier unification
    pub variable: f32,
    /// constant unification
    pub constant: f32,
    /// attribute preserving variant, may exceed 1
    pub attribute: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            depth_decay: 0.7,
            variable: 0.8,
            constant: 0.5,
            attribute: 1.2,
        }
    }
}

impl Coefficients {
    /// Every coefficient must be finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("depth_decay", self.depth_decay),
            ("variable", self.variable),
            ("constant", self.constant),
            ("attribute", self.attribute),
        ];
        for (name, value) in named {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::configuration(format!(
                    "coefficient `{name}` must be finite and positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Coefficients in effect; whole-expression indexing needs no relative weighting
    pub fn effective(&self, sub_expressions: bool) -> Self {
        if sub_expressions {
            *self
        } else {
            Self {
                depth_decay: 1.0,
                variable: 1.0,
                constant: 1.0,
                attribute: self.attribute,
            }
        }
    }

    pub(crate) fn generalize_factors(&self) -> GeneralizeFactors {
        GeneralizeFactors {
            variable: self.variable,
            constant: self.constant,
            attribute: self.attribute,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    pub dialect: Dialect,
    /// index every qualifying sub-expression, not only whole formulae
    pub sub_expressions: bool,
    pub coefficients: Coefficients,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Both,
            sub_expressions: true,
            coefficients: Coefficients::default(),
        }
    }
}

impl TokenizerOptions {
    /// Options for turning a user query into terms
    pub fn query() -> Self {
        Self {
            sub_expressions: false,
            ..Self::default()
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.coefficients.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TokenizerOptions::default().validate().is_ok());
        assert!(TokenizerOptions::query().validate().is_ok());
    }

    #[test]
    fn rejects_bad_coefficients() {
        for bad in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            let coefficients = Coefficients {
                constant: bad,
                ..Coefficients::default()
            };
            let err = coefficients.validate().unwrap_err();
            assert!(err.is_configuration());
            assert!(err.to_string().contains("constant"));
        }
    }

    #[test]
    fn whole_expression_mode_flattens_weights() {
        let effective = Coefficients::default().effective(false);
        assert_eq!(effective.depth_decay, 1.0);
        assert_eq!(effective.variable, 1.0);
        assert_eq!(effective.constant, 1.0);
        assert_eq!(effective.attribute, 1.2);
        assert_eq!(Coefficients::default().effective(true), Coefficients::default());
    }
}
