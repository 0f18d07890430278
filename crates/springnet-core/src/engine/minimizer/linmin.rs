use super::Objective;
use super::bracket::{LineFunction, bracket_minimum};
use super::dbrent::dbrent;
use crate::engine::error::ConvergenceError;

/// Restriction of an objective to the line `origin + t · direction`.
struct LineRestriction<'a, O: Objective + ?Sized> {
    objective: &'a O,
    origin: &'a [f64],
    direction: &'a [f64],
    trial: Vec<f64>,
    gradient: Vec<f64>,
}

impl<'a, O: Objective + ?Sized> LineRestriction<'a, O> {
    fn new(objective: &'a O, origin: &'a [f64], direction: &'a [f64]) -> Self {
        Self {
            objective,
            origin,
            direction,
            trial: vec![0.0; origin.len()],
            gradient: vec![0.0; origin.len()],
        }
    }

    fn move_to(&mut self, t: f64) {
        for ((trial, origin), direction) in self
            .trial
            .iter_mut()
            .zip(self.origin.iter())
            .zip(self.direction.iter())
        {
            *trial = origin + t * direction;
        }
    }
}

impl<O: Objective + ?Sized> LineFunction for LineRestriction<'_, O> {
    fn value(&mut self, t: f64) -> f64 {
        self.move_to(t);
        self.objective.value(&self.trial)
    }

    fn derivative(&mut self, t: f64) -> f64 {
        self.move_to(t);
        self.objective.gradient(&self.trial, &mut self.gradient);
        self.gradient
            .iter()
            .zip(self.direction.iter())
            .map(|(g, d)| g * d)
            .sum()
    }
}

/// Minimizes `objective` along `direction` starting from `point`.
///
/// On return `point` holds the line minimum, `direction` is rescaled to the step actually
/// taken, and the objective value at the new point is returned.
pub fn line_minimize<O: Objective + ?Sized>(
    objective: &O,
    point: &mut [f64],
    direction: &mut [f64],
    tolerance: f64,
) -> Result<f64, ConvergenceError> {
    let minimum = {
        let mut line = LineRestriction::new(objective, point, direction);
        let bracket = bracket_minimum(0.0, 1.0, &mut line)?;
        dbrent(&bracket, &mut line, tolerance)?
    };

    for (p, d) in point.iter_mut().zip(direction.iter_mut()) {
        *d *= minimum.x;
        *p += *d;
    }
    Ok(minimum.fx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::minimizer::dbrent::DEFAULT_TOLERANCE;

    struct Bowl;

    impl Objective for Bowl {
        fn dimension(&self) -> usize {
            2
        }

        fn value(&self, x: &[f64]) -> f64 {
            (x[0] - 1.0).powi(2) + 4.0 * (x[1] + 2.0).powi(2)
        }

        fn gradient(&self, x: &[f64], out: &mut [f64]) {
            out[0] = 2.0 * (x[0] - 1.0);
            out[1] = 8.0 * (x[1] + 2.0);
        }
    }

    #[test]
    fn moves_point_to_the_line_minimum_and_rescales_direction() {
        let mut point = [0.0, 0.0];
        let mut direction = [1.0, 0.0];
        let value = line_minimize(&Bowl, &mut point, &mut direction, DEFAULT_TOLERANCE).unwrap();
        assert!((point[0] - 1.0).abs() < 1e-6);
        assert_eq!(point[1], 0.0);
        assert!((direction[0] - 1.0).abs() < 1e-6);
        assert!((value - 16.0).abs() < 1e-10);
    }

    #[test]
    fn steepest_descent_step_lowers_the_objective() {
        let mut point = [3.0, 1.0];
        let start = Bowl.value(&point);
        let mut gradient = [0.0; 2];
        Bowl.gradient(&point, &mut gradient);
        let mut direction = [-gradient[0], -gradient[1]];
        let value = line_minimize(&Bowl, &mut point, &mut direction, DEFAULT_TOLERANCE).unwrap();
        assert!(value < start);
        assert!((Bowl.value(&point) - value).abs() < 1e-12);
    }
}
