//! Trailing window statistics over quantity sold. The window includes the current
//! observation and never looks ahead.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowStats {
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 with fewer than two observations
    pub std: f64,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    size: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            values: VecDeque::with_capacity(size),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.size {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.size
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stats(&self) -> WindowStats {
        let n = self.values.len();
        if n == 0 {
            return WindowStats::default();
        }
        let mean = self.values.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let ss: f64 = self.values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        WindowStats { mean, std, len: n }
    }
}
