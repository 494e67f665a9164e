use std::collections::HashMap;
use chrono::NaiveDate;

// Thresholds between the 1, 2, 5 and 10 step multipliers
const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = 1.4142135623730951; // sqrt(2)

/// Maps each category to an equal-width band of the output range.
/// Categories keep the order they are given in.
#[derive(Debug, Clone)]
pub struct BandScale {
    categories: Vec<String>,
    index: HashMap<String, usize>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    step: f64,
    bandwidth: f64,
    start: f64,
}

impl BandScale {
    pub fn new(categories: Vec<String>, range: (f64, f64)) -> Self {
        let index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let mut scale = BandScale {
            categories,
            index,
            range,
            padding_inner: 0.0,
            padding_outer: 0.0,
            align: 0.5,
            step: 0.0,
            bandwidth: 0.0,
            start: 0.0,
        };
        scale.rescale();
        scale
    }

    /// Set inner and outer padding to the same fraction of a step
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding_inner = padding.clamp(0.0, 1.0);
        self.padding_outer = padding.max(0.0);
        self.rescale();
        self
    }

    fn rescale(&mut self) {
        let n = self.categories.len() as f64;
        let (r0, r1) = self.range;
        let (lo, hi) = if r1 < r0 { (r1, r0) } else { (r0, r1) };

        self.step = (hi - lo) / f64::max(1.0, n - self.padding_inner + self.padding_outer * 2.0);
        self.start = lo + (hi - lo - self.step * (n - self.padding_inner)) * self.align;
        self.bandwidth = self.step * (1.0 - self.padding_inner);
    }

    /// Left edge of the band for `category`
    pub fn position(&self, category: &str) -> Option<f64> {
        let i = *self.index.get(category)?;
        let (r0, r1) = self.range;
        let i = if r1 < r0 { self.categories.len() - 1 - i } else { i };
        Some(self.start + self.step * i as f64)
    }

    /// Center of the band for `category`
    pub fn center(&self, category: &str) -> Option<f64> {
        self.position(category).map(|x| x + self.bandwidth / 2.0)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }
}

/// Continuous linear map from a numeric domain to a pixel range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        LinearScale { domain, range }
    }

    /// Scale over the min/max of `values`; an empty input falls back to [0, 1]
    pub fn from_extent<I: IntoIterator<Item = f64>>(values: I, range: (f64, f64)) -> Self {
        let (min, max) = extent(values).unwrap_or((0.0, 1.0));
        LinearScale::new((min, max), range)
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Extend the domain outward to multiples of the tick step for `count` ticks
    pub fn nice(mut self, count: usize) -> Self {
        let (mut start, mut stop) = self.domain;
        let reversed = stop < start;
        if reversed {
            std::mem::swap(&mut start, &mut stop);
        }
        if !(stop > start) || !start.is_finite() || !stop.is_finite() || count == 0 {
            return self;
        }

        let mut prestep = None;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count as f64);
            if prestep == Some(step) {
                break;
            }
            if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = Some(step);
        }

        self.domain = if reversed { (stop, start) } else { (start, stop) };
        self
    }

    /// Roughly `count` round tick values inside the domain
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        ticks(d0.min(d1), d0.max(d1), count as f64)
    }

    /// Label for a tick value, with precision derived from the tick step
    pub fn tick_format(&self, count: usize, value: f64) -> String {
        let (d0, d1) = self.domain;
        let step = tick_step(d0.min(d1), d0.max(d1), count as f64);
        let decimals = if step > 0.0 && step.is_finite() {
            (-step.log10().floor()).max(0.0) as usize
        } else {
            0
        };
        format_grouped(value, decimals)
    }
}

/// Linear map from a date extent to a pixel range, in whole days
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pub domain: (NaiveDate, NaiveDate),
    pub range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (NaiveDate, NaiveDate), range: (f64, f64)) -> Self {
        TimeScale { domain, range }
    }

    /// Scale over the earliest and latest of `dates`
    pub fn from_extent<I: IntoIterator<Item = NaiveDate>>(dates: I, range: (f64, f64)) -> Option<Self> {
        let mut iter = dates.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(TimeScale::new((min, max), range))
    }

    pub fn map(&self, date: NaiveDate) -> f64 {
        let (d0, d1) = self.domain;
        let span = (d1 - d0).num_days() as f64;
        let offset = (date - d0).num_days() as f64;
        LinearScale::new((0.0, span), self.range).map(offset)
    }
}

/// Assigns palette colors to categories in domain order, cycling when the
/// palette is shorter than the domain
#[derive(Debug, Clone)]
pub struct OrdinalScale {
    index: HashMap<String, usize>,
    palette: Vec<String>,
}

impl OrdinalScale {
    pub fn new(domain: Vec<String>, palette: Vec<String>) -> Self {
        let index = domain
            .into_iter()
            .enumerate()
            .map(|(i, c)| (c, i))
            .collect();
        OrdinalScale { index, palette }
    }

    /// Color for `category`. Categories outside the domain take the next unused slot.
    pub fn color(&self, category: &str) -> Option<&str> {
        if self.palette.is_empty() {
            return None;
        }
        let i = self.index.get(category).copied().unwrap_or(self.index.len());
        Some(self.palette[i % self.palette.len()].as_str())
    }
}

/// Min and max of the finite values, if any
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

fn step_factor(error: f64) -> f64 {
    if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    }
}

/// Positive values are the step itself, negative values are the inverse of a fractional step
fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = step_factor(error);
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

fn tick_step(start: f64, stop: f64, count: f64) -> f64 {
    let step0 = (stop - start).abs() / count.max(0.0);
    let step1 = 10f64.powf(step0.log10().floor());
    let error = step0 / step1;
    step1 * step_factor(error)
}

fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if !(count > 0.0) || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let Some((i1, i2, inc)) = tick_spec(start, stop, count) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }
    (i1..=i2)
        .map(|i| if inc < 0.0 { i as f64 / -inc } else { i as f64 * inc })
        .collect()
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
    let step = (stop - start) / count.max(0.0);
    if !(step > 0.0) || !step.is_finite() {
        return None;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = step_factor(error);

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let inv = 10f64.powf(-power) / factor;
        i1 = (start * inv).round() as i64;
        i2 = (stop * inv).round() as i64;
        if (i1 as f64) / inv < start { i1 += 1; }
        if (i2 as f64) / inv > stop { i2 -= 1; }
        inc = -inv;
    } else {
        let step = 10f64.powf(power) * factor;
        i1 = (start / step).round() as i64;
        i2 = (stop / step).round() as i64;
        if (i1 as f64) * step < start { i1 += 1; }
        if (i2 as f64) * step > stop { i2 -= 1; }
        inc = step;
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    Some((i1, i2, inc))
}

/// Fixed-precision number with comma thousands separators, e.g. `12,500`
fn format_grouped(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let negative = value < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0');
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('−');
    }
    out.push_str(&grouped);
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(&f);
    }
    out
}
