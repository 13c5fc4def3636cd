use std::collections::VecDeque;

use crate::catalog::IconHandle;

/// A queued "medal unlocked" notification. Created when a medal flips to
/// unlocked, destroyed once its elapsed time reaches the display duration.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupEvent {
    /// Index of the unlocked medal in the catalog snapshot.
    pub medal_index: usize,
    /// Time this event has been at the head of the queue.
    pub elapsed: f32,
}

/// FIFO of unlock popups. Only the head event is displayed and only the
/// head accumulates time; the rest wait their turn in unlock order.
#[derive(Debug)]
pub struct PopupQueue {
    events: VecDeque<PopupEvent>,
    display_time: f32,
}

impl PopupQueue {
    /// Creates an empty queue whose events are displayed for
    /// `display_time` time units each.
    #[must_use]
    pub const fn new(display_time: f32) -> Self {
        Self {
            events: VecDeque::new(),
            display_time,
        }
    }

    /// Appends an unlock event for `medal_index`.
    pub fn enqueue(&mut self, medal_index: usize) {
        self.events.push_back(PopupEvent {
            medal_index,
            elapsed: 0.0,
        });
    }

    /// Advances the head event by `delta` and evicts it once its elapsed
    /// time reaches the display duration. The next event then starts from
    /// zero on the following call.
    pub fn advance(&mut self, delta: f32) {
        let Some(head) = self.events.front_mut() else {
            return;
        };
        head.elapsed += delta;
        if head.elapsed >= self.display_time {
            self.events.pop_front();
        }
    }

    /// The currently displayed event, if any.
    #[must_use]
    pub fn head(&self) -> Option<&PopupEvent> {
        self.events.front()
    }

    /// Number of queued events, the displayed one included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The configured display duration.
    #[must_use]
    pub const fn display_time(&self) -> f32 {
        self.display_time
    }
}

/// Slide-in fraction for a popup at `elapsed`: starts at 1 (fully
/// off-surface), reaches the resting position after one time unit.
#[must_use]
pub fn slide_fraction(elapsed: f32) -> f32 {
    (1.0 - elapsed).max(0.0)
}

/// Opacity for a popup at `elapsed`: fully opaque until one time unit
/// before `display_time`, then fades linearly to 0.
#[must_use]
pub fn alpha(elapsed: f32, display_time: f32) -> f32 {
    if elapsed > display_time - 1.0 {
        (display_time - elapsed).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Drawing surface supplied by the host. The popup renderer computes all
/// geometry; the host only has to blit an icon and a text label.
pub trait PopupSurface {
    /// Height of the surface; popups anchor to the bottom edge.
    fn height(&self) -> f32;

    /// Draws a medal icon as a `size` x `size` square at `(x, y)`.
    fn draw_icon(&mut self, icon: &IconHandle, x: f32, y: f32, size: f32, alpha: f32);

    /// Draws a text label at `(x, y)` with the given text height.
    fn draw_label(&mut self, text: &str, x: f32, y: f32, text_height: f32, alpha: f32);
}
