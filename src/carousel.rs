//! Gallery rotation as plain state machines.
//!
//! The browser script on the public page animates exactly these transitions;
//! keeping them here lets the rotation order be checked without a DOM.

use std::{collections::VecDeque, time::Duration};

pub const WINDOW_SIZE: usize = 3;

/// How long a rotation step lasts and how long its fade takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselTiming {
    pub interval: Duration,
    pub fade: Duration,
}

impl CarouselTiming {
    /// A fade that outlasts the interval would start the next step while the
    /// previous one is still fading, so it is cut to half the interval.
    pub fn new(interval: Duration, fade: Duration) -> Self {
        let fade = if fade >= interval { interval / 2 } else { fade };
        Self { interval, fade }
    }
}

impl Default for CarouselTiming {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(4000),
            fade: Duration::from_millis(1000),
        }
    }
}

/// One step of the rotation: `outgoing` fades out, then `incoming` is
/// appended at the end of the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    pub outgoing: String,
    pub incoming: String,
}

#[derive(Debug, Clone)]
pub struct Carousel {
    images: Vec<String>,
    window: VecDeque<String>,
    window_size: usize,
    cursor: usize,
    pending: Option<Rotation>,
}

impl Carousel {
    /// `None` when there is nothing to show; the page renders a placeholder.
    pub fn new(images: Vec<String>, window_size: usize) -> Option<Self> {
        if images.is_empty() || window_size == 0 {
            return None;
        }
        let window = images.iter().take(window_size).cloned().collect();
        Some(Self {
            images,
            window,
            window_size,
            cursor: 0,
            pending: None,
        })
    }

    pub fn window(&self) -> Vec<&str> {
        self.window.iter().map(String::as_str).collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_fading(&self) -> bool {
        self.pending.is_some()
    }

    /// Picks the next image and marks the oldest displayed one for fade-out.
    ///
    /// Returns `None` while a previous step is still fading, and when the
    /// sequence is shorter than the window (there is nothing new to bring in).
    pub fn begin_rotation(&mut self) -> Option<Rotation> {
        if self.pending.is_some() || self.images.len() < self.window_size {
            return None;
        }
        let outgoing = self.window.front()?.clone();
        let incoming = self.images[(self.cursor + self.window_size) % self.images.len()].clone();
        let rotation = Rotation { outgoing, incoming };
        self.pending = Some(rotation.clone());
        Some(rotation)
    }

    /// Runs once the fade delay has elapsed: drops the faded image, appends
    /// the incoming one and advances the cursor.
    pub fn complete_rotation(&mut self) -> Option<Rotation> {
        let rotation = self.pending.take()?;
        self.window.pop_front();
        self.window.push_back(rotation.incoming.clone());
        self.cursor = (self.cursor + 1) % self.images.len();
        Some(rotation)
    }

    /// A full step with the fade collapsed. The page script runs the two
    /// halves on its own timers.
    pub fn tick(&mut self) -> Option<Rotation> {
        self.begin_rotation()?;
        self.complete_rotation()
    }
}

/// Single active slide with previous/next controls and auto-advance.
///
/// No page renders this variant; it models the manual-navigation carousel
/// so its timer reset can be checked alongside [`Carousel`].
#[derive(Debug, Clone)]
pub struct Slideshow {
    len: usize,
    active: usize,
    interval: Duration,
    since_advance: Duration,
}

impl Slideshow {
    pub fn new(len: usize, interval: Duration) -> Option<Self> {
        (len > 0).then_some(Self {
            len,
            active: 0,
            interval,
            since_advance: Duration::ZERO,
        })
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn next(&mut self) -> usize {
        self.active = (self.active + 1) % self.len;
        self.since_advance = Duration::ZERO;
        self.active
    }

    pub fn prev(&mut self) -> usize {
        self.active = (self.active + self.len - 1) % self.len;
        self.since_advance = Duration::ZERO;
        self.active
    }

    /// Feeds elapsed time to the auto-advance clock. Returns the new slide
    /// when the interval ran out.
    pub fn advance(&mut self, elapsed: Duration) -> Option<usize> {
        self.since_advance += elapsed;
        if self.since_advance < self.interval {
            return None;
        }
        Some(self.next())
    }
}
