pub mod bandpass;

/// A whole-window filter stage: takes the raw window, returns a signal of
/// the same length.
pub trait FilterInstance: Send {
    fn id(&self) -> &str;
    fn apply(&self, signal: &[f64]) -> Vec<f64>;
}
