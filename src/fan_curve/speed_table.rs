use std::fmt;

use crate::fan_curve::{Curve, MAX_FAN_SPEED, MAX_TEMP, MIN_TEMP};

/// Fan speed for every temperature of the supported domain,
/// compiled once from a [`Curve`].
///
/// The table is either empty (no curve, every lookup misses) or holds one
/// entry for each temperature in `MIN_TEMP..=MAX_TEMP`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeedTable {
    // Indexed by temperature - MIN_TEMP
    speeds: Vec<u8>,
}

impl SpeedTable {
    pub fn compile(curve: &Curve) -> Self {
        let points = curve.points();

        if points.is_empty() {
            return Self::default();
        }

        let mut speeds = vec![0u8; usize::from(MAX_TEMP - MIN_TEMP) + 1];

        // Every temperature before the first point keeps the fan off,
        // the vector is already zeroed up to there.

        // The last point is paired with a synthetic endpoint one degree
        // past the domain, so every domain temperature gets a value
        let mut starts = points.iter().peekable();

        while let Some(start) = starts.next() {
            let (end_temp, end_speed) = match starts.peek() {
                Some(next) => (i32::from(next.temp), next.speed),
                None => (i32::from(MAX_TEMP) + 1, MAX_FAN_SPEED),
            };

            let m = slope(i32::from(start.temp), start.speed, end_temp, end_speed);

            for temp in i32::from(start.temp)..end_temp {
                let Some(slot) = usize::try_from(temp - i32::from(MIN_TEMP))
                    .ok()
                    .and_then(|i| speeds.get_mut(i))
                else {
                    continue;
                };

                // y = m(x - x0) + y0, truncated like an integer conversion
                let y = m * (temp - i32::from(start.temp)) as f32 + f32::from(start.speed);
                *slot = y as u8;
            }
        }

        Self { speeds }
    }

    /// Fan speed for the given temperature, `None` when the temperature
    /// is outside of the compiled domain or the table is empty.
    pub fn get(&self, temp: u32) -> Option<u8> {
        let index = temp.checked_sub(u32::from(MIN_TEMP))?;

        self.speeds.get(usize::try_from(index).ok()?).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    // Iterate over (temperature, speed) entries
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        (MIN_TEMP..=MAX_TEMP).zip(self.speeds.iter().copied())
    }
}

// m = (y2 - y1) / (x2 - x1), flat when both temperatures are equal
fn slope(start_temp: i32, start_speed: u8, end_temp: i32, end_speed: u8) -> f32 {
    if end_temp == start_temp {
        return 0.;
    }

    (f32::from(end_speed) - f32::from(start_speed)) / (end_temp - start_temp) as f32
}

// Print the table as runs of temperatures sharing the same speed,
// e.g. "0-34°C: 0%, 35°C: 40%, ..."
impl fmt::Display for SpeedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<empty>");
        }

        let mut entries = self.iter().peekable();
        let mut first = true;

        while let Some((from, speed)) = entries.next() {
            let mut to = from;
            while let Some(&(next, _)) = entries.peek().filter(|(_, s)| *s == speed) {
                to = next;
                entries.next();
            }

            if !first {
                write!(f, ", ")?;
            }
            first = false;

            if from == to {
                write!(f, "{from}°C: {speed}%")?;
            } else {
                write!(f, "{from}-{to}°C: {speed}%")?;
            }
        }

        Ok(())
    }
}
