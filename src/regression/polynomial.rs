use serde::{Deserialize, Serialize};

/// Polynomial with coefficients ordered highest power first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        if coefficients.is_empty() {
            return Self {
                coefficients: vec![0.0],
            };
        }
        Self { coefficients }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn into_coefficients(self) -> Vec<f64> {
        self.coefficients
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, c| acc * x + c)
    }

    /// Power rule applied coefficient-wise.
    pub fn derivative(&self) -> Polynomial {
        let n = self.degree();
        Polynomial::new(
            self.coefficients[..n]
                .iter()
                .enumerate()
                .map(|(i, c)| c * (n - i) as f64)
                .collect(),
        )
    }

    /// `q(x) = p(scale * x + shift)`.
    pub fn compose_linear(&self, scale: f64, shift: f64) -> Polynomial {
        let mut out = vec![self.coefficients[0]];
        for &c in &self.coefficients[1..] {
            let mut next = vec![0.0; out.len() + 1];
            for (j, o) in out.iter().enumerate() {
                next[j] += scale * o;
                next[j + 1] += shift * o;
            }
            if let Some(last) = next.last_mut() {
                *last += c;
            }
            out = next;
        }
        Polynomial::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horner_evaluation() {
        let p = Polynomial::new(vec![2.0, -3.0, 0.0, 5.0]);
        assert_eq!(p.eval(0.0), 5.0);
        assert_eq!(p.eval(2.0), 9.0);
        assert_eq!(p.degree(), 3);
    }

    #[test]
    fn derivative_uses_power_rule() {
        let p = Polynomial::new(vec![2.0, -3.0, 0.0, 5.0]);
        assert_eq!(p.derivative().coefficients(), &[6.0, -6.0, 0.0]);
        assert_eq!(Polynomial::new(vec![7.0]).derivative().coefficients(), &[0.0]);
    }

    #[test]
    fn composition_with_linear_map() {
        let p = Polynomial::new(vec![1.0, -2.0, 3.0, 0.5]);
        let q = p.compose_linear(0.25, -1.5);
        assert_eq!(q.degree(), 3);
        for x in [-4.0, 0.0, 1.0, 6.5, 20.0] {
            assert!((q.eval(x) - p.eval(0.25 * x - 1.5)).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_coefficients_are_zero() {
        let p = Polynomial::new(vec![]);
        assert_eq!(p.degree(), 0);
        assert_eq!(p.eval(3.0), 0.0);
    }
}
