//! Text oscilloscope for the output signal.

/// Index of the first rising zero crossing, so successive frames line up.
/// Falls back to 0 when the signal never crosses.
pub fn stable_start(samples: &[f32]) -> usize {
    (1..samples.len().saturating_sub(1))
        .find(|&i| samples[i] >= 0.0 && samples[i - 1] < 0.0)
        .unwrap_or(0)
}

/// Draw `samples` into `height` rows of `width` columns. Values are expected
/// in -1.0..=1.0; +1 maps to the top row.
pub fn trace(samples: &[f32], width: usize, height: usize) -> Vec<String> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let mut grid = vec![vec![' '; width]; height];
    let mid = (height - 1) / 2;

    let start = stable_start(samples);
    let visible = &samples[start.min(samples.len())..];
    if visible.is_empty() {
        grid[mid].fill('-');
    } else {
        for (x, column) in (0..width).map(|x| (x, x * visible.len() / width)) {
            let v = visible[column].clamp(-1.0, 1.0) as f64;
            let y = ((1.0 - v) * (height - 1) as f64 / 2.0).round() as usize;
            grid[y.min(height - 1)][x] = '*';
        }
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}
