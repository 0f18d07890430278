use crate::engine::error::ConvergenceError;

/// Default ratio by which successive bracketing intervals are magnified.
pub const GOLD: f64 = 1.618034;
/// Maximum magnification allowed for a parabolic-fit step.
pub const GLIMIT: f64 = 100.0;
const TINY: f64 = 1e-20;
/// Expansions after which the function is taken to be unbounded along the line.
pub const MAX_EXPANSIONS: usize = 500;

/// A scalar function of the step length along a search line.
pub trait LineFunction {
    fn value(&mut self, t: f64) -> f64;
    fn derivative(&mut self, t: f64) -> f64;
}

impl<F, D> LineFunction for (F, D)
where
    F: FnMut(f64) -> f64,
    D: FnMut(f64) -> f64,
{
    fn value(&mut self, t: f64) -> f64 {
        (self.0)(t)
    }

    fn derivative(&mut self, t: f64) -> f64 {
        (self.1)(t)
    }
}

/// Three abscissas with `b` between `a` and `c` and `f(b)` no greater than either end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub fa: f64,
    pub fb: f64,
    pub fc: f64,
}

#[inline]
fn sign(magnitude: f64, sign_of: f64) -> f64 {
    if sign_of >= 0.0 {
        magnitude.abs()
    } else {
        -magnitude.abs()
    }
}

/// Searches downhill from the initial points `a` and `b` for a bracketed minimum.
///
/// Steps grow by the golden ratio, with parabolic extrapolation whenever it is trustworthy
/// (and never beyond `GLIMIT` times the current step).
pub fn bracket_minimum(
    a: f64,
    b: f64,
    function: &mut impl LineFunction,
) -> Result<Bracket, ConvergenceError> {
    let (mut a, mut b) = (a, b);
    let mut fa = function.value(a);
    let mut fb = function.value(b);
    if fb > fa {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut c = b + GOLD * (b - a);
    let mut fc = function.value(c);

    let mut expansions = 0;
    while fb > fc {
        expansions += 1;
        if expansions > MAX_EXPANSIONS {
            return Err(ConvergenceError::Bracket { expansions: MAX_EXPANSIONS });
        }

        let r = (b - a) * (fb - fc);
        let q = (b - c) * (fb - fa);
        let denominator = 2.0 * sign((q - r).abs().max(TINY), q - r);
        let mut u = b - ((b - c) * q - (b - a) * r) / denominator;
        let ulim = b + GLIMIT * (c - b);
        let mut fu;

        if (b - u) * (u - c) > 0.0 {
            fu = function.value(u);
            if fu < fc {
                return Ok(Bracket {
                    a: b,
                    b: u,
                    c,
                    fa: fb,
                    fb: fu,
                    fc,
                });
            } else if fu > fb {
                return Ok(Bracket {
                    a,
                    b,
                    c: u,
                    fa,
                    fb,
                    fc: fu,
                });
            }
            u = c + GOLD * (c - b);
            fu = function.value(u);
        } else if (c - u) * (u - ulim) > 0.0 {
            fu = function.value(u);
            if fu < fc {
                let next = u + GOLD * (u - c);
                (b, c, u) = (c, u, next);
                (fb, fc) = (fc, fu);
                fu = function.value(u);
            }
        } else if (u - ulim) * (ulim - c) >= 0.0 {
            u = ulim;
            fu = function.value(u);
        } else {
            u = c + GOLD * (c - b);
            fu = function.value(u);
        }

        (a, b, c) = (b, c, u);
        (fa, fb, fc) = (fb, fc, fu);

        if !(c.is_finite() && fc.is_finite()) {
            return Err(ConvergenceError::Bracket { expansions });
        }
    }

    Ok(Bracket {
        a,
        b,
        c,
        fa,
        fb,
        fc,
    })
}
