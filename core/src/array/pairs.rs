use crate::prelude::{PipelineError, PipelineResult};

/// Canonical enumeration of the C(N,2) unordered microphone pairs.
///
/// Pairs are listed with the lower index outer-ascending and the higher
/// index inner-ascending, so pair 0 is (0,1), pair 1 is (0,2) and so on.
/// The mapping between pair index and (mic1, mic2) is exactly invertible;
/// an out-of-range lookup is a hard error.
#[derive(Debug, Clone)]
pub struct MicPairs {
    channels: usize,
    pairs: Vec<(usize, usize)>,
}

impl MicPairs {
    pub fn new(channels: usize) -> Self {
        let mut pairs = Vec::with_capacity(channels * channels.saturating_sub(1) / 2);
        for i in 0..channels {
            for j in (i + 1)..channels {
                pairs.push((i, j));
            }
        }
        Self { channels, pairs }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Microphone indices for a pair index.
    pub fn pair(&self, index: usize) -> PipelineResult<(usize, usize)> {
        self.pairs.get(index).copied().ok_or_else(|| {
            PipelineError::OutOfRange(format!(
                "pair index {} out of range for {} pairs",
                index,
                self.pairs.len()
            ))
        })
    }

    /// Pair index for a microphone pair; order of arguments is irrelevant.
    pub fn index_of(&self, mic1: usize, mic2: usize) -> PipelineResult<usize> {
        if mic1 == mic2 || mic1 >= self.channels || mic2 >= self.channels {
            return Err(PipelineError::OutOfRange(format!(
                "invalid pair ({}, {}) for {} channels",
                mic1, mic2, self.channels
            )));
        }
        let (i, j) = if mic1 < mic2 { (mic1, mic2) } else { (mic2, mic1) };
        // Pairs before row i: C(n,2) - C(n-i,2); offset j-i-1 within the row.
        let n = self.channels;
        let before = i * (2 * n - i - 1) / 2;
        Ok(before + (j - i - 1))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_channels_yield_66_pairs() {
        let pairs = MicPairs::new(12);
        assert_eq!(pairs.len(), 66);
        assert_eq!(pairs.pair(0).unwrap(), (0, 1));
        assert_eq!(pairs.pair(65).unwrap(), (10, 11));
    }

    #[test]
    fn enumeration_round_trips_for_all_sizes() {
        for channels in 2..=16 {
            let pairs = MicPairs::new(channels);
            for index in 0..pairs.len() {
                let (m1, m2) = pairs.pair(index).unwrap();
                assert!(m1 < m2);
                assert_eq!(pairs.index_of(m1, m2).unwrap(), index);
                assert_eq!(pairs.index_of(m2, m1).unwrap(), index);
            }
        }
    }

    #[test]
    fn out_of_range_lookup_is_an_error() {
        let pairs = MicPairs::new(4);
        assert!(matches!(
            pairs.pair(6),
            Err(PipelineError::OutOfRange(_))
        ));
        assert!(pairs.index_of(0, 0).is_err());
        assert!(pairs.index_of(0, 4).is_err());
    }
}
