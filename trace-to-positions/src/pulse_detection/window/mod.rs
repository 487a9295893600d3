pub(crate) mod gaussian;

use super::{Temporal, TracePoint};
pub(crate) use gaussian::GaussianWindow;

/// A stateful filter which consumes trace values one at a time and, once it
/// has seen enough of them, produces one output per input.
pub(crate) trait Window: Clone {
    type TimeType: Temporal;
    type InputType: Copy;
    type OutputType;

    /// Feeds the next value, returning true if the window can now produce output.
    fn push(&mut self, value: Self::InputType) -> bool;
    fn output(&self) -> Option<Self::OutputType>;
    /// Maps the time of the most recently pushed value to the time the output refers to.
    fn apply_time_shift(&self, time: Self::TimeType) -> Self::TimeType;
}

#[derive(Clone)]
pub(crate) struct WindowIter<I, W>
where
    I: Iterator,
    I::Item: TracePoint,
    W: Window,
{
    window_function: W,
    source: I,
}

impl<I, W> Iterator for WindowIter<I, W>
where
    I: Iterator,
    I::Item: TracePoint,
    W: Window<
            TimeType = <I::Item as TracePoint>::Time,
            InputType = <I::Item as TracePoint>::Value,
        >,
{
    type Item = (W::TimeType, W::OutputType);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let point = self.source.next()?;
            if self.window_function.push(point.get_value()) {
                return Some((
                    self.window_function.apply_time_shift(point.get_time()),
                    self.window_function.output()?,
                ));
            }
        }
    }
}

pub(crate) trait WindowFilter<I, W>
where
    I: Iterator,
    I::Item: TracePoint,
    W: Window,
{
    fn window(self, window: W) -> WindowIter<I, W>;
}

impl<I, W> WindowFilter<I, W> for I
where
    I: Iterator,
    I::Item: TracePoint,
    W: Window,
{
    fn window(self, window_function: W) -> WindowIter<I, W> {
        WindowIter {
            source: self,
            window_function,
        }
    }
}
