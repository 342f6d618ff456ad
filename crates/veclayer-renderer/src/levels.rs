use std::collections::{BTreeMap, HashMap};

use veclayer_core::feature::Feature;

use crate::symbol::Symbol;

/// Index of a symbol within a renderer's symbol list.
pub type SymbolId = usize;

/// One symbol layer scheduled at a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolLevelItem {
    pub symbol: SymbolId,
    pub layer: usize,
}

/// Symbol layers grouped by rendering pass, iterated in ascending level order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolLevelOrder {
    levels: BTreeMap<i32, Vec<SymbolLevelItem>>,
}

impl SymbolLevelOrder {
    pub fn from_symbols(symbols: &[&Symbol]) -> Self {
        let mut levels: BTreeMap<i32, Vec<SymbolLevelItem>> = BTreeMap::new();
        for (symbol, sym) in symbols.iter().enumerate() {
            for (layer, symbol_layer) in sym.layers.iter().enumerate() {
                levels
                    .entry(symbol_layer.rendering_pass)
                    .or_default()
                    .push(SymbolLevelItem { symbol, layer });
            }
        }
        Self { levels }
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &[SymbolLevelItem])> {
        self.levels.iter().map(|(level, items)| (*level, items.as_slice()))
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn last_level(&self) -> Option<i32> {
        self.levels.keys().next_back().copied()
    }

    /// Highest level holding a layer of `symbol`.
    pub fn last_level_of(&self, symbol: SymbolId) -> Option<i32> {
        self.levels
            .iter()
            .rev()
            .find(|(_, items)| items.iter().any(|item| item.symbol == symbol))
            .map(|(level, _)| *level)
    }
}

/// A feature held back for level-ordered drawing.
#[derive(Debug, Clone)]
pub(crate) struct BufferedFeature {
    pub feature: Feature,
    pub selected: bool,
}

/// Arena of classified features, indexed by symbol. Lives for one pass.
#[derive(Debug, Default)]
pub(crate) struct LevelBuffer {
    records: Vec<BufferedFeature>,
    by_symbol: HashMap<SymbolId, Vec<usize>>,
}

impl LevelBuffer {
    pub fn push(&mut self, symbol: SymbolId, feature: Feature, selected: bool) {
        let index = self.records.len();
        self.records.push(BufferedFeature { feature, selected });
        self.by_symbol.entry(symbol).or_default().push(index);
    }

    /// Buffered features of `symbol` with their arena index, in stream order.
    pub fn records_for(
        &self,
        symbol: SymbolId,
    ) -> impl Iterator<Item = (usize, &BufferedFeature)> {
        self.by_symbol
            .get(&symbol)
            .into_iter()
            .flatten()
            .map(move |&i| (i, &self.records[i]))
    }

    pub fn records(&self) -> impl Iterator<Item = &BufferedFeature> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolLayer;
    use veclayer_core::geometry::GeometryType;
    use veclayer_core::layer::{Color, FillPattern};

    #[test]
    fn test_levels_ascending_regardless_of_layer_order() {
        let a = Symbol::new(
            GeometryType::Polygon,
            vec![
                SymbolLayer::fill(Color::default(), FillPattern::Solid).with_pass(1),
                SymbolLayer::line(Color::default(), 1.0).with_pass(0),
            ],
        );
        let b = Symbol::new(
            GeometryType::Line,
            vec![SymbolLayer::line(Color::default(), 2.0).with_pass(-3)],
        );
        let order = SymbolLevelOrder::from_symbols(&[&a, &b]);
        let levels: Vec<_> = order.iter().map(|(l, items)| (l, items.to_vec())).collect();
        assert_eq!(
            levels,
            vec![
                (-3, vec![SymbolLevelItem { symbol: 1, layer: 0 }]),
                (0, vec![SymbolLevelItem { symbol: 0, layer: 1 }]),
                (1, vec![SymbolLevelItem { symbol: 0, layer: 0 }]),
            ]
        );
        assert_eq!(order.last_level(), Some(1));
        assert_eq!(order.last_level_of(0), Some(1));
        assert_eq!(order.last_level_of(1), Some(-3));
        assert_eq!(order.last_level_of(2), None);
    }

    #[test]
    fn test_buffer_groups_by_symbol_in_stream_order() {
        let mut buffer = LevelBuffer::default();
        for (id, symbol) in [(1, 0), (2, 1), (3, 0)] {
            buffer.push(symbol, Feature::new(id, None, Vec::new()), id == 2);
        }
        let ids: Vec<_> = buffer.records_for(0).map(|(_, r)| r.feature.id).collect();
        assert_eq!(ids, vec![1, 3]);
        let indices: Vec<_> = buffer.records_for(0).map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(buffer.records_for(7).count(), 0);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.records().filter(|r| r.selected).count(), 1);
    }

    #[test]
    fn test_empty_order() {
        let order = SymbolLevelOrder::from_symbols(&[]);
        assert!(order.is_empty());
        assert_eq!(order.last_level(), None);
    }
}
