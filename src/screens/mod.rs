pub mod gameplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    None,
    /// Gameplay reached the end of the chart.
    Finished,
    Exit,
}
