//! 64-gate / 6-line partition of the tropical zodiac.
//!
//! Each sign carries an ordered list of gate segments (degrees within the
//! sign). Every sign seam is straddled by one gate that closes one sign and
//! opens the next, so line numbering has to be measured from where the gate
//! really starts rather than from the seam.

use crate::domain::model::{Sign, ALL_SIGNS};
use crate::utils::error::{GeneGraphError, Result};

pub const GATE_COUNT: usize = 64;
pub const LINES_PER_GATE: u8 = 6;
/// 360 / 64 degrees.
pub const GATE_SPAN: f64 = 360.0 / GATE_COUNT as f64;
/// GATE_SPAN / 6 degrees.
pub const LINE_SPAN: f64 = GATE_SPAN / LINES_PER_GATE as f64;

const SIGN_SPAN: f64 = 30.0;
/// 避免浮點誤差把值推到前一條線
const LINE_EPSILON: f64 = 1e-9;
const SEAM_TOLERANCE: f64 = 1e-6;
const VALIDATION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateSegment {
    pub gate: u8,
    /// Degrees within the sign, inclusive.
    pub start: f64,
    /// Degrees within the sign, exclusive.
    pub end: f64,
}

const fn seg(gate: u8, start: f64, end: f64) -> GateSegment {
    GateSegment { gate, start, end }
}

/// Result of classifying one ecliptic longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateActivation {
    /// Normalized longitude that was classified.
    pub longitude: f64,
    pub sign: Sign,
    pub degree_in_sign: f64,
    pub gate: u8,
    pub line: u8,
}

// 度分秒邊界: 3°52'30" = 3.875, 26°22'30" = 26.375, 0°7'30" = 0.125 ...
const ARIES: &[GateSegment] = &[
    seg(25, 0.0, 3.875),
    seg(17, 3.875, 9.5),
    seg(21, 9.5, 15.125),
    seg(51, 15.125, 20.75),
    seg(42, 20.75, 26.375),
    seg(3, 26.375, 30.0),
];

const TAURUS: &[GateSegment] = &[
    seg(3, 0.0, 2.0),
    seg(27, 2.0, 7.625),
    seg(24, 7.625, 13.25),
    seg(2, 13.25, 18.875),
    seg(23, 18.875, 24.5),
    seg(8, 24.5, 30.0),
];

const GEMINI: &[GateSegment] = &[
    seg(8, 0.0, 0.125),
    seg(20, 0.125, 5.75),
    seg(16, 5.75, 11.375),
    seg(35, 11.375, 17.0),
    seg(45, 17.0, 22.625),
    seg(12, 22.625, 28.25),
    seg(15, 28.25, 30.0),
];

const CANCER: &[GateSegment] = &[
    seg(15, 0.0, 3.875),
    seg(52, 3.875, 9.5),
    seg(39, 9.5, 15.125),
    seg(53, 15.125, 20.75),
    seg(62, 20.75, 26.375),
    seg(56, 26.375, 30.0),
];

const LEO: &[GateSegment] = &[
    seg(56, 0.0, 2.0),
    seg(31, 2.0, 7.625),
    seg(33, 7.625, 13.25),
    seg(7, 13.25, 18.875),
    seg(4, 18.875, 24.5),
    seg(29, 24.5, 30.0),
];

const VIRGO: &[GateSegment] = &[
    seg(29, 0.0, 0.125),
    seg(59, 0.125, 5.75),
    seg(40, 5.75, 11.375),
    seg(64, 11.375, 17.0),
    seg(47, 17.0, 22.625),
    seg(6, 22.625, 28.25),
    seg(46, 28.25, 30.0),
];

const LIBRA: &[GateSegment] = &[
    seg(46, 0.0, 3.875),
    seg(18, 3.875, 9.5),
    seg(48, 9.5, 15.125),
    seg(57, 15.125, 20.75),
    seg(32, 20.75, 26.375),
    seg(50, 26.375, 30.0),
];

const SCORPIO: &[GateSegment] = &[
    seg(50, 0.0, 2.0),
    seg(28, 2.0, 7.625),
    seg(44, 7.625, 13.25),
    seg(1, 13.25, 18.875),
    seg(43, 18.875, 24.5),
    seg(14, 24.5, 30.0),
];

const SAGITTARIUS: &[GateSegment] = &[
    seg(14, 0.0, 0.125),
    seg(34, 0.125, 5.75),
    seg(9, 5.75, 11.375),
    seg(5, 11.375, 17.0),
    seg(26, 17.0, 22.625),
    seg(11, 22.625, 28.25),
    seg(10, 28.25, 30.0),
];

const CAPRICORN: &[GateSegment] = &[
    seg(10, 0.0, 3.875),
    seg(58, 3.875, 9.5),
    seg(38, 9.5, 15.125),
    seg(54, 15.125, 20.75),
    seg(61, 20.75, 26.375),
    seg(60, 26.375, 30.0),
];

const AQUARIUS: &[GateSegment] = &[
    seg(60, 0.0, 2.0),
    seg(41, 2.0, 7.625),
    seg(19, 7.625, 13.25),
    seg(13, 13.25, 18.875),
    seg(49, 18.875, 24.5),
    seg(30, 24.5, 30.0),
];

const PISCES: &[GateSegment] = &[
    seg(30, 0.0, 0.125),
    seg(55, 0.125, 5.75),
    seg(37, 5.75, 11.375),
    seg(63, 11.375, 17.0),
    seg(22, 17.0, 22.625),
    seg(36, 22.625, 28.25),
    seg(25, 28.25, 30.0),
];

/// The standard wheel used for every profile.
pub const STANDARD_GATE_TABLE: GateTable<'static> = GateTable::new([
    ARIES,
    TAURUS,
    GEMINI,
    CANCER,
    LEO,
    VIRGO,
    LIBRA,
    SCORPIO,
    SAGITTARIUS,
    CAPRICORN,
    AQUARIUS,
    PISCES,
]);

/// Per-sign gate segments, indexed by [`Sign::index`].
#[derive(Debug, Clone, Copy)]
pub struct GateTable<'a> {
    signs: [&'a [GateSegment]; 12],
}

impl<'a> GateTable<'a> {
    pub const fn new(signs: [&'a [GateSegment]; 12]) -> Self {
        Self { signs }
    }

    pub fn segments(&self, sign: Sign) -> &'a [GateSegment] {
        self.signs[sign.index()]
    }

    /// Map an ecliptic longitude to sign, gate and line.
    ///
    /// The input is normalized to [0, 360). When no segment contains the
    /// degree-in-sign (only possible right at the 30° seam) the sign's last
    /// segment is used.
    pub fn classify(&self, longitude: f64) -> Result<GateActivation> {
        if !longitude.is_finite() {
            return Err(GeneGraphError::invalid_input(
                "longitude",
                format!("longitude must be finite, got {}", longitude),
            ));
        }

        // rem_euclid 可能對極小負值回傳 360.0，折回 0°
        let lon = match longitude.rem_euclid(360.0) {
            wrapped if wrapped >= 360.0 => 0.0,
            wrapped => wrapped,
        };
        let sign_index = ((lon / SIGN_SPAN).floor() as usize).min(11);
        let sign = Sign::from_index(sign_index);
        let degree_in_sign = lon - sign_index as f64 * SIGN_SPAN;

        let segments = self.signs[sign_index];
        let segment = segments
            .iter()
            .find(|s| s.start <= degree_in_sign && degree_in_sign < s.end)
            .or_else(|| segments.last())
            .ok_or_else(|| GeneGraphError::ClassificationInvariantViolation {
                message: format!("sign {} has no gate segments", sign),
            })?;

        let mut global_start = sign_index as f64 * SIGN_SPAN + segment.start;
        if let Some(prev_last) = self.signs[sign.previous().index()].last() {
            if prev_last.gate == segment.gate && (prev_last.end - SIGN_SPAN).abs() <= SEAM_TOLERANCE {
                global_start = (sign_index as f64 - 1.0) * SIGN_SPAN + prev_last.start;
            }
        }

        let offset = (lon - global_start).rem_euclid(360.0);
        let line = ((offset + LINE_EPSILON) / LINE_SPAN).floor() as i64 + 1;
        let line = line.clamp(1, LINES_PER_GATE as i64) as u8;

        Ok(GateActivation {
            longitude: lon,
            sign,
            degree_in_sign,
            gate: segment.gate,
            line,
        })
    }

    /// Check that the table tiles the circle into 64 gates of equal span.
    pub fn validate(&self) -> Result<()> {
        let mut span_per_gate = [0.0_f64; GATE_COUNT + 1];
        let mut runs = 0usize;

        for sign in ALL_SIGNS {
            let segments = self.segments(sign);
            let (first, last) = match (segments.first(), segments.last()) {
                (Some(first), Some(last)) => (first, last),
                _ => return Err(invariant(format!("sign {} has no gate segments", sign))),
            };

            if first.start.abs() > VALIDATION_TOLERANCE {
                return Err(invariant(format!("sign {} does not start at 0°", sign)));
            }
            if (last.end - SIGN_SPAN).abs() > VALIDATION_TOLERANCE {
                return Err(invariant(format!("sign {} does not end at 30°", sign)));
            }

            for (i, segment) in segments.iter().enumerate() {
                if segment.gate == 0 || segment.gate as usize > GATE_COUNT {
                    return Err(invariant(format!(
                        "sign {} references gate {} outside 1..=64",
                        sign, segment.gate
                    )));
                }
                if segment.start >= segment.end {
                    return Err(invariant(format!(
                        "sign {} gate {} has an empty or inverted segment",
                        sign, segment.gate
                    )));
                }
                if let Some(next) = segments.get(i + 1) {
                    if (segment.end - next.start).abs() > VALIDATION_TOLERANCE {
                        return Err(invariant(format!(
                            "sign {} has a gap or overlap between gates {} and {}",
                            sign, segment.gate, next.gate
                        )));
                    }
                }
                span_per_gate[segment.gate as usize] += segment.end - segment.start;
            }

            // 跨星座的閘門只算一次
            let continues_previous = self
                .segments(sign.previous())
                .last()
                .is_some_and(|prev| prev.gate == first.gate);
            runs += segments.len() - usize::from(continues_previous);
        }

        for (gate, span) in span_per_gate.iter().enumerate().skip(1) {
            if (span - GATE_SPAN).abs() > VALIDATION_TOLERANCE {
                return Err(invariant(format!(
                    "gate {} spans {:.6}° instead of {}°",
                    gate, span, GATE_SPAN
                )));
            }
        }
        if runs != GATE_COUNT {
            return Err(invariant(format!(
                "table has {} contiguous gate runs, expected {}",
                runs, GATE_COUNT
            )));
        }

        Ok(())
    }
}

fn invariant(message: String) -> GeneGraphError {
    GeneGraphError::ClassificationInvariantViolation { message }
}
