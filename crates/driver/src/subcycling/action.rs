/// Control actions supported by the sub-cycling driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop after the current iteration, finalizing as if the run had ended.
    StopEarly,
}
