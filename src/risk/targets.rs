use crate::core::events::Bar;
use crate::core::CoreError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Average True Range over the last `period` bars
///
/// Needs `period + 1` bars so every true range has a previous close.
pub fn average_true_range(bars: &[Bar], period: usize) -> Result<Decimal, CoreError> {
    if period == 0 {
        return Err(CoreError::InvalidArgument(
            "ATR period must be at least 1".to_string(),
        ));
    }
    if bars.len() < period + 1 {
        return Err(CoreError::InvalidArgument(format!(
            "ATR needs {} bars, got {}",
            period + 1,
            bars.len()
        )));
    }

    let window = &bars[bars.len() - period - 1..];
    let mut sum = Decimal::ZERO;
    for pair in window.windows(2) {
        let prev_close = pair[0].close.value();
        let high = pair[1].high.value();
        let low = pair[1].low.value();

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        sum += tr;
    }

    Ok(sum / Decimal::from(period))
}

/// Convert a price range to a whole pip distance
///
/// Returns the rounded `range * multiplier / pip_size`; the caller applies the
/// floor-to-default rule when this rounds below 1.
pub fn range_to_pips(
    range: Decimal,
    multiplier: Decimal,
    pip_size: Decimal,
) -> Result<u32, CoreError> {
    if pip_size <= Decimal::ZERO {
        return Err(CoreError::Arithmetic(format!(
            "pip size must be positive, got {}",
            pip_size
        )));
    }
    let pips = (range * multiplier / pip_size).round();
    pips.to_u32().ok_or_else(|| {
        CoreError::Arithmetic(format!("pip distance {} not representable", pips))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockHost;

    #[test]
    fn test_atr_flat_series() {
        // Every bar has a 0.0010 range and identical closes
        let bars = MockHost::flat_bars(15, Decimal::new(11, 1), Decimal::new(1, 3));
        let atr = average_true_range(&bars, 14).unwrap();
        assert_eq!(atr, Decimal::new(1, 3));
    }

    #[test]
    fn test_atr_uses_previous_close_gap() {
        let mut bars = MockHost::flat_bars(3, Decimal::new(11, 1), Decimal::new(1, 3));
        // Gap the last bar far above the previous close
        let last = bars.last_mut().unwrap();
        last.open = crate::types::Price::new(Decimal::new(112, 2));
        last.high = crate::types::Price::new(Decimal::new(1121, 3));
        last.low = crate::types::Price::new(Decimal::new(112, 2));
        last.close = crate::types::Price::new(Decimal::new(112, 2));

        // True range of the gapped bar is high - prev_close = 1.121 - 1.1
        let atr = average_true_range(&bars, 1).unwrap();
        assert_eq!(atr, Decimal::new(21, 3));
    }

    #[test]
    fn test_atr_insufficient_bars() {
        let bars = MockHost::flat_bars(5, Decimal::new(11, 1), Decimal::new(1, 3));
        assert!(average_true_range(&bars, 14).is_err());
        assert!(average_true_range(&bars, 0).is_err());
    }

    #[test]
    fn test_range_to_pips() {
        // 0.0010 range, 1.5 multiplier, 0.0001 pip -> 15 pips
        let pips = range_to_pips(
            Decimal::new(1, 3),
            Decimal::new(15, 1),
            Decimal::new(1, 4),
        )
        .unwrap();
        assert_eq!(pips, 15);
    }

    #[test]
    fn test_range_to_pips_rounds_below_one() {
        // A tiny range rounds to zero pips; the caller falls back to defaults
        let pips = range_to_pips(
            Decimal::new(2, 5), // 0.00002
            Decimal::ONE,
            Decimal::new(1, 4),
        )
        .unwrap();
        assert_eq!(pips, 0);
    }

    #[test]
    fn test_range_to_pips_invalid_pip_size() {
        assert!(range_to_pips(Decimal::ONE, Decimal::ONE, Decimal::ZERO).is_err());
        assert!(range_to_pips(Decimal::ONE, Decimal::ONE, Decimal::new(-1, 4)).is_err());
    }
}
