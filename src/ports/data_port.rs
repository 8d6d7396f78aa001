//! Market data access port trait.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::{Interval, Period};

pub trait DataPort {
    /// Bars for `symbol` at `interval` covering `period` back from the
    /// source's latest data.
    ///
    /// Symbols the source does not know yield `Ok(vec![])`; transport and
    /// availability problems are errors.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<OhlcvBar>, SignalError>;
}
