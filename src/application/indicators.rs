//! Batch technical indicators over raw price slices
//!
//! Conventions shared by every function here:
//! - input is oldest-first, output is aligned to the *tail* of the input
//!   (warm-up bars are dropped from the head)
//! - insufficient data returns an empty Vec; callers treat "no data" as
//!   "skip this signal", never as a crash
//! - everything is deterministic and side-effect free

/// Exponential moving average, seeded with the first value.
///
/// The seed is emitted, so the output length equals the input length and a
/// constant input yields a constant output.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len());
    let mut current = data[0];
    out.push(current);
    for &value in &data[1..] {
        current = value * k + current * (1.0 - k);
        out.push(current);
    }
    out
}

/// Simple moving average. Output length is `len - period + 1`.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(data.len() - period + 1);
    let mut window_sum: f64 = data[..period].iter().sum();
    out.push(window_sum / period as f64);
    for i in period..data.len() {
        window_sum += data[i] - data[i - period];
        out.push(window_sum / period as f64);
    }
    out
}

/// Wilder RSI: seed averages are the simple mean of the first `period`
/// gains/losses, smoothed with `avg = (avg*(period-1) + new) / period` after.
///
/// Output length is `len - 1 - period`; empty when `len <= period + 1`.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if data.len() <= period {
        return Vec::new();
    }
    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut avg_gain: f64 = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::new();
    for i in period..gains.len() {
        avg_gain = (avg_gain * (period as f64 - 1.0) + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + losses[i]) / period as f64;
        let rs = if avg_loss == 0.0 {
            100.0
        } else {
            avg_gain / avg_loss
        };
        out.push(100.0 - 100.0 / (1.0 + rs));
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD line, signal line and histogram, all tail-aligned to equal length.
///
/// Because `ema` emits its seed, the fast and slow lines already share the
/// input's length; the general tail-alignment still guards the combination
/// so `histogram[i] == macd[i] - signal[i]` holds for every index.
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdSeries {
    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);
    if ema_fast.is_empty() || ema_slow.is_empty() {
        return MacdSeries::default();
    }

    let len = ema_fast.len().min(ema_slow.len());
    let fast_tail = &ema_fast[ema_fast.len() - len..];
    let slow_tail = &ema_slow[ema_slow.len() - len..];
    let macd_line: Vec<f64> = fast_tail
        .iter()
        .zip(slow_tail.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema(&macd_line, signal_period);
    let aligned = macd_line.len().min(signal_line.len());
    let macd_tail = macd_line[macd_line.len() - aligned..].to_vec();
    let signal_tail = signal_line[signal_line.len() - aligned..].to_vec();
    let histogram: Vec<f64> = macd_tail
        .iter()
        .zip(signal_tail.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd: macd_tail,
        signal: signal_tail,
        histogram,
    }
}

/// Average true range with the gap terms, Wilder-smoothed after a
/// simple-mean seed. Output length is `len - 1 - period`.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    if high.len() <= period || high.len() != low.len() || high.len() != close.len() {
        return Vec::new();
    }
    let mut true_ranges = Vec::with_capacity(high.len() - 1);
    for i in 1..high.len() {
        let tr = (high[i] - low[i])
            .max((high[i] - close[i - 1]).abs())
            .max((low[i] - close[i - 1]).abs());
        true_ranges.push(tr);
    }

    let mut current: f64 = true_ranges[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::new();
    for tr in &true_ranges[period..] {
        current = (current * (period as f64 - 1.0) + tr) / period as f64;
        out.push(current);
    }
    out
}

/// Annualised rolling volatility of log-returns, in percent.
///
/// Each value is the population standard deviation of the `period` returns
/// ending at the previous bar, scaled by sqrt(252) and 100.
pub fn volatility(data: &[f64], period: usize) -> Vec<f64> {
    if data.len() <= period {
        return Vec::new();
    }
    let returns = log_returns(data);
    let mut out = Vec::new();
    for i in period..returns.len() {
        let window = &returns[i - period..i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / period as f64;
        out.push(variance.sqrt() * 252.0_f64.sqrt() * 100.0);
    }
    out
}

/// Per-bar log returns; length is `len - 1`.
pub fn log_returns(data: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(data.len().saturating_sub(1));
    for i in 1..data.len() {
        if data[i - 1] > 0.0 && data[i] > 0.0 {
            out.push((data[i] / data[i - 1]).ln());
        } else {
            out.push(0.0);
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bollinger bands: SMA middle with +/- `k` population standard deviations.
pub fn bollinger(data: &[f64], period: usize, k: f64) -> BollingerSeries {
    if period == 0 || data.len() < period {
        return BollingerSeries::default();
    }
    let mut bands = BollingerSeries::default();
    for i in period..=data.len() {
        let window = &data[i - period..i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();
        bands.middle.push(mean);
        bands.upper.push(mean + k * std_dev);
        bands.lower.push(mean - k * std_dev);
    }
    bands
}

#[derive(Debug, Clone, Default)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Stochastic oscillator: %K over `period` bars, %D as its 3-bar SMA.
pub fn stochastic(high: &[f64], low: &[f64], close: &[f64], period: usize) -> StochasticSeries {
    if close.len() < period || high.len() != close.len() || low.len() != close.len() {
        return StochasticSeries::default();
    }
    let mut k_line = Vec::new();
    for i in period..=close.len() {
        let hh = max_of(&high[i - period..i]);
        let ll = min_of(&low[i - period..i]);
        let range = hh - ll;
        let k = if range > 0.0 {
            (close[i - 1] - ll) / range * 100.0
        } else {
            50.0
        };
        k_line.push(k);
    }
    let d_line = sma(&k_line, 3);
    StochasticSeries {
        k: k_line,
        d: d_line,
    }
}

/// Williams %R over `period` bars, in [-100, 0].
pub fn williams_r(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    if close.len() < period || high.len() != close.len() || low.len() != close.len() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for i in period..=close.len() {
        let hh = max_of(&high[i - period..i]);
        let ll = min_of(&low[i - period..i]);
        let range = hh - ll;
        let wr = if range > 0.0 {
            (hh - close[i - 1]) / range * -100.0
        } else {
            -50.0
        };
        out.push(wr);
    }
    out
}

/// Commodity channel index on the typical price, 0.015 scale constant.
pub fn cci(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    if close.len() < period || high.len() != close.len() || low.len() != close.len() {
        return Vec::new();
    }
    let typical: Vec<f64> = (0..close.len())
        .map(|i| (high[i] + low[i] + close[i]) / 3.0)
        .collect();
    let mut out = Vec::new();
    for i in period..=typical.len() {
        let window = &typical[i - period..i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let mean_dev = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;
        let value = if mean_dev > 0.0 {
            (typical[i - 1] - mean) / (0.015 * mean_dev)
        } else {
            0.0
        };
        out.push(value);
    }
    out
}

/// Money flow index from signed typical-price money flow, in [0, 100].
pub fn mfi(high: &[f64], low: &[f64], close: &[f64], volume: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    if n <= period || high.len() != n || low.len() != n || volume.len() != n {
        return Vec::new();
    }
    let typical: Vec<f64> = (0..n).map(|i| (high[i] + low[i] + close[i]) / 3.0).collect();
    // Signed raw money flow per bar transition
    let mut flows = Vec::with_capacity(n - 1);
    for i in 1..n {
        let raw = typical[i] * volume[i];
        flows.push(if typical[i] > typical[i - 1] {
            raw
        } else if typical[i] < typical[i - 1] {
            -raw
        } else {
            0.0
        });
    }
    let mut out = Vec::new();
    for i in period..=flows.len() {
        let window = &flows[i - period..i];
        let positive: f64 = window.iter().filter(|f| **f > 0.0).sum();
        let negative: f64 = -window.iter().filter(|f| **f < 0.0).sum::<f64>();
        let value = if negative == 0.0 {
            100.0
        } else {
            let ratio = positive / negative;
            100.0 - 100.0 / (1.0 + ratio)
        };
        out.push(value);
    }
    out
}

/// On-balance volume, cumulative from zero. Output length equals input length.
pub fn obv(close: &[f64], volume: &[f64]) -> Vec<f64> {
    if close.is_empty() || close.len() != volume.len() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(close.len());
    let mut running = 0.0;
    out.push(running);
    for i in 1..close.len() {
        if close[i] > close[i - 1] {
            running += volume[i];
        } else if close[i] < close[i - 1] {
            running -= volume[i];
        }
        out.push(running);
    }
    out
}

/// Streaming ADX with standard Wilder initialisation: the first `period`
/// values accumulate as sums, then Wilder smoothing takes over.
pub struct WilderAdx {
    period: usize,
    prev_high: Option<f64>,
    prev_low: Option<f64>,
    prev_close: Option<f64>,
    tr_sum: f64,
    plus_dm_sum: f64,
    minus_dm_sum: f64,
    tr_smooth: f64,
    plus_dm_smooth: f64,
    minus_dm_smooth: f64,
    adx_smooth: f64,
    count: usize,
}

impl WilderAdx {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_high: None,
            prev_low: None,
            prev_close: None,
            tr_sum: 0.0,
            plus_dm_sum: 0.0,
            minus_dm_sum: 0.0,
            tr_smooth: 0.0,
            plus_dm_smooth: 0.0,
            minus_dm_smooth: 0.0,
            adx_smooth: 0.0,
            count: 0,
        }
    }

    pub fn next(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let (Some(prev_high), Some(prev_low), Some(prev_close)) =
            (self.prev_high, self.prev_low, self.prev_close)
        else {
            self.prev_high = Some(high);
            self.prev_low = Some(low);
            self.prev_close = Some(close);
            return None;
        };

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        let up_move = high - prev_high;
        let down_move = prev_low - low;
        let plus_dm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus_dm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        self.count += 1;
        let n = self.period as f64;
        if self.count <= self.period {
            self.tr_sum += tr;
            self.plus_dm_sum += plus_dm;
            self.minus_dm_sum += minus_dm;
            if self.count == self.period {
                self.tr_smooth = self.tr_sum;
                self.plus_dm_smooth = self.plus_dm_sum;
                self.minus_dm_smooth = self.minus_dm_sum;
            }
        } else {
            self.tr_smooth = self.tr_smooth - (self.tr_smooth / n) + tr;
            self.plus_dm_smooth = self.plus_dm_smooth - (self.plus_dm_smooth / n) + plus_dm;
            self.minus_dm_smooth = self.minus_dm_smooth - (self.minus_dm_smooth / n) + minus_dm;
        }

        self.prev_high = Some(high);
        self.prev_low = Some(low);
        self.prev_close = Some(close);

        if self.count < self.period || self.tr_smooth <= 0.0 {
            return None;
        }

        let plus_di = 100.0 * self.plus_dm_smooth / self.tr_smooth;
        let minus_di = 100.0 * self.minus_dm_smooth / self.tr_smooth;
        let sum_di = plus_di + minus_di;
        let dx = if sum_di > 0.0 {
            100.0 * (plus_di - minus_di).abs() / sum_di
        } else {
            0.0
        };

        if self.count == self.period {
            self.adx_smooth = dx;
        } else {
            self.adx_smooth = (self.adx_smooth * (n - 1.0) + dx) / n;
        }
        Some(self.adx_smooth)
    }
}

/// Batch ADX over full bar slices.
pub fn adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    if close.len() <= period || high.len() != close.len() || low.len() != close.len() {
        return Vec::new();
    }
    let mut calc = WilderAdx::new(period);
    let mut out = Vec::new();
    for i in 0..close.len() {
        if let Some(value) = calc.next(high[i], low[i], close[i]) {
            out.push(value);
        }
    }
    out
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::INFINITY, f64::min)
}
