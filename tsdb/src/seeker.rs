use std::marker::PhantomData;

use models::TimeRange;

use crate::series::{Item, SeriesSpan};

/// Builds at most one [`Seeker`] per call. The seek range defaults to the
/// whole span and may be narrowed; the effective range is the intersection.
pub struct SeekerBuilder<'a> {
    span: &'a SeriesSpan,
    time_range: Option<TimeRange>,
}

impl<'a> SeekerBuilder<'a> {
    pub(crate) fn new(span: &'a SeriesSpan) -> Self {
        Self {
            span,
            time_range: None,
        }
    }

    pub fn time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    pub fn build(self) -> Seeker<'a> {
        let range = match self.time_range {
            Some(narrow) => match self.span.time_range().intersect(&narrow) {
                Some(range) => range,
                None => return Seeker::empty(),
            },
            None => self.span.time_range(),
        };
        let series_id = self.span.series_id();
        let mut entries = Vec::new();
        for block in self.span.blocks() {
            let reader = block.data_reader();
            for entry in reader.entries(series_id, &range) {
                entries.push((entry, reader.clone()));
            }
        }
        // block windows may not be disjoint for every provider
        entries.sort_unstable_by_key(|(e, _)| (e.time, e.item_id));
        let items = entries
            .into_iter()
            .map(|(e, reader)| Item::new(series_id, e.item_id, reader))
            .collect::<Vec<_>>();
        Seeker {
            items: items.into_iter(),
            _span: PhantomData,
        }
    }
}

/// Iterator over the items of one span in ascending `(time, item id)`
/// order. Exhausting it is valid even when nothing matched.
pub struct Seeker<'a> {
    items: std::vec::IntoIter<Item>,
    _span: PhantomData<&'a SeriesSpan>,
}

impl Seeker<'_> {
    fn empty() -> Self {
        Seeker {
            items: Vec::new().into_iter(),
            _span: PhantomData,
        }
    }
}

impl Iterator for Seeker<'_> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}
