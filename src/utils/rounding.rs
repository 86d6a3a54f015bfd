/// Rounds `value` to `figures` significant figures.
///
/// Zero and non-finite values pass through untouched.
pub fn round_sig_figs(value: f64, figures: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || figures == 0 {
        return value;
    }

    let magnitude = value.abs().log10().floor() as i32;
    let exponent = figures as i32 - 1 - magnitude;
    let factor = 10f64.powi(exponent);
    let rounded = (value * factor).round() / factor;

    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}
