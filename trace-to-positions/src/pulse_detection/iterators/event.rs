use super::{Detector, TracePoint};

#[derive(Clone)]
pub(crate) struct EventIter<I, D>
where
    I: Iterator<Item = D::TracePointType>,
    D: Detector,
{
    source: I,
    detector: D,
}

impl<I, D> Iterator for EventIter<I, D>
where
    I: Iterator<Item = D::TracePointType>,
    D: Detector,
{
    type Item = D::EventPointType;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let point = self.source.next()?;
            if let Some(event) = self.detector.signal(point.get_time(), point.get_value()) {
                return Some(event);
            }
        }
    }
}

pub(crate) trait EventFilter<I, D>
where
    I: Iterator<Item = D::TracePointType>,
    D: Detector,
{
    fn events(self, detector: D) -> EventIter<I, D>;
}

impl<I, D> EventFilter<I, D> for I
where
    I: Iterator<Item = D::TracePointType>,
    D: Detector,
{
    fn events(self, detector: D) -> EventIter<I, D> {
        EventIter {
            source: self,
            detector,
        }
    }
}
