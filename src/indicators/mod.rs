// =============================================================================
// Indicator Engines
// =============================================================================
//
// Four independent engines over the shared candle slice.  Each engine computes
// its series once at construction (`compute`) and exposes a values accessor
// plus a pure `analyze` step producing (values, signals).  Engines never hold
// mutable state and never read each other's output; they compose only in the
// report.

pub mod fractals;
pub mod ichimoku;
pub mod ma_cross;
pub mod rsi;
