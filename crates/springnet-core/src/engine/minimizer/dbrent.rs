use super::bracket::{Bracket, LineFunction};
use crate::engine::error::ConvergenceError;

/// Iteration cap of a single line minimization.
pub const MAX_ITERATIONS: usize = 1000;
/// Default fractional tolerance, about the square root of double precision.
pub const DEFAULT_TOLERANCE: f64 = 3.0e-8;
/// Absolute floor on the tolerance, for minima sitting at exactly zero.
const ZEPS: f64 = f64::EPSILON * 1.0e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMinimum {
    pub x: f64,
    pub fx: f64,
}

/// Abscissa, value and derivative of one evaluated point.
#[derive(Debug, Clone, Copy)]
struct Probe {
    x: f64,
    f: f64,
    df: f64,
}

#[inline]
fn sign(magnitude: f64, sign_of: f64) -> f64 {
    if sign_of >= 0.0 {
        magnitude.abs()
    } else {
        -magnitude.abs()
    }
}

/// Brent's method with derivatives: isolates the minimum inside `bracket` to a fractional
/// precision of about `tolerance`.
///
/// Secant steps on the derivative are taken when they fall inside the current interval and
/// head downhill; otherwise the interval is bisected on the side the derivative points to.
pub fn dbrent(
    bracket: &Bracket,
    function: &mut impl LineFunction,
    tolerance: f64,
) -> Result<LineMinimum, ConvergenceError> {
    let mut a = bracket.a.min(bracket.c);
    let mut b = bracket.a.max(bracket.c);

    let start = Probe {
        x: bracket.b,
        f: function.value(bracket.b),
        df: function.derivative(bracket.b),
    };
    // Best point so far, second best, and the previous value of `w`.
    let (mut x, mut w, mut v) = (start, start, start);
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for _ in 0..MAX_ITERATIONS {
        let xm = 0.5 * (a + b);
        let tol1 = tolerance * x.x.abs() + ZEPS;
        let tol2 = 2.0 * tol1;
        if (x.x - xm).abs() <= tol2 - 0.5 * (b - a) {
            return Ok(LineMinimum { x: x.x, fx: x.f });
        }

        let bisect = |x: &Probe| {
            let e = if x.df >= 0.0 { a - x.x } else { b - x.x };
            (e, 0.5 * e)
        };

        if e.abs() > tol1 {
            let mut d1 = 2.0 * (b - a);
            let mut d2 = d1;
            if w.df != x.df {
                d1 = (w.x - x.x) * x.df / (x.df - w.df);
            }
            if v.df != x.df {
                d2 = (v.x - x.x) * x.df / (x.df - v.df);
            }
            let u1 = x.x + d1;
            let u2 = x.x + d2;
            let ok1 = (a - u1) * (u1 - b) > 0.0 && x.df * d1 <= 0.0;
            let ok2 = (a - u2) * (u2 - b) > 0.0 && x.df * d2 <= 0.0;
            let olde = e;
            e = d;

            if ok1 || ok2 {
                d = match (ok1, ok2) {
                    (true, true) if d1.abs() < d2.abs() => d1,
                    (true, true) => d2,
                    (true, false) => d1,
                    _ => d2,
                };
                if d.abs() <= (0.5 * olde).abs() {
                    let u = x.x + d;
                    if u - a < tol2 || b - u < tol2 {
                        d = sign(tol1, xm - x.x);
                    }
                } else {
                    (e, d) = bisect(&x);
                }
            } else {
                (e, d) = bisect(&x);
            }
        } else {
            (e, d) = bisect(&x);
        }

        let u_x;
        let fu;
        if d.abs() >= tol1 {
            u_x = x.x + d;
            fu = function.value(u_x);
        } else {
            u_x = x.x + sign(tol1, d);
            fu = function.value(u_x);
            if fu > x.f {
                return Ok(LineMinimum { x: x.x, fx: x.f });
            }
        }
        let u = Probe {
            x: u_x,
            f: fu,
            df: function.derivative(u_x),
        };

        if u.f <= x.f {
            if u.x >= x.x {
                a = x.x;
            } else {
                b = x.x;
            }
            v = w;
            w = x;
            x = u;
        } else {
            if u.x < x.x {
                a = u.x;
            } else {
                b = u.x;
            }
            if u.f <= w.f || w.x == x.x {
                v = w;
                w = u;
            } else if u.f < v.f || v.x == x.x || v.x == w.x {
                v = u;
            }
        }
    }

    Err(ConvergenceError::LineSearch {
        iterations: MAX_ITERATIONS,
    })
}
